//! Panaderia HTTP client
//!
//! [`FetchClient::fetch_json`] is the one request primitive. It resolves the
//! path against the configured base URL, fills in default headers, attaches
//! the bearer token on request, and maps the outcome onto [`ClientError`].
//! Typed endpoint wrappers live in [`auth`] and [`product_types`].

pub mod auth;
pub mod error;
pub mod field_errors;
pub mod product_types;
pub mod request;
pub mod response;

pub use error::{ApiError, ClientError};
pub use request::{FetchOptions, RequestBody};

use panaderia_core::{ApiConfig, TokenSource};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

const DEFAULT_USER_AGENT: &str = concat!("panaderia-client/", env!("CARGO_PKG_VERSION"));

/// Panaderia API client
#[derive(Clone)]
pub struct FetchClient {
    client: Client,
    config: ApiConfig,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchClient")
            .field("base_url", &self.config.base_url())
            .field("authenticated", &self.tokens.is_some())
            .finish_non_exhaustive()
    }
}

impl FetchClient {
    /// Create a client for `base_url` with no token source
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> FetchClientBuilder {
        FetchClientBuilder::default()
    }

    /// Base URL, ending in `/`
    pub fn base_url(&self) -> &str {
        self.config.base_url()
    }

    /// Absolute URL for a relative API path
    pub fn url_for(&self, path: &str) -> String {
        self.config.url_for(path)
    }

    /// Perform a request and decode the body as JSON
    ///
    /// 2xx responses resolve to the parsed body (`null` when empty).
    /// Any other status yields [`ClientError::Api`] carrying the parsed body,
    /// transport failures yield [`ClientError::Request`], and cancellation
    /// through `options.cancel` yields [`ClientError::Aborted`].
    pub async fn fetch_json(
        &self,
        path: &str,
        options: FetchOptions,
    ) -> Result<JsonValue, ClientError> {
        let url = self.url_for(path);
        let FetchOptions {
            method,
            headers,
            query,
            body,
            auth,
            cancel,
        } = options;

        let headers = self.prepare_headers(headers, body.as_ref(), auth)?;

        let mut request = self.client.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(&query);
        }
        // Caller headers are applied last so they override anything the
        // body encoder set.
        let request = attach_body(request, body)?.headers(headers);

        debug!(%method, %url, auth, "Sending request");

        let (status, text) = match cancel {
            Some(token) => exchange_cancellable(request, &token).await?,
            None => exchange(request).await?,
        };

        debug!(%method, %url, status, "Received response");
        trace!(body = %text, "Response body");

        let data = response::parse_body(&text);
        if (200..300).contains(&status) {
            Ok(data)
        } else {
            Err(ApiError::new(status, data).into())
        }
    }

    /// Perform a request and deserialize the body into `T`
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        options: FetchOptions,
    ) -> Result<T, ClientError> {
        let value = self.fetch_json(path, options).await?;
        Ok(serde_json::from_value(value)?)
    }

    fn prepare_headers(
        &self,
        mut headers: HeaderMap,
        body: Option<&RequestBody>,
        auth: bool,
    ) -> Result<HeaderMap, ClientError> {
        headers
            .entry(header::ACCEPT)
            .or_insert(HeaderValue::from_static("application/json"));

        if matches!(body, Some(RequestBody::Json(_))) {
            headers
                .entry(header::CONTENT_TYPE)
                .or_insert(HeaderValue::from_static("application/json"));
        }

        if auth && !headers.contains_key(header::AUTHORIZATION) {
            if let Some(token) = self.tokens.as_ref().and_then(|t| t.access_token()) {
                let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|e| ClientError::Configuration(format!("invalid access token: {e}")))?;
                value.set_sensitive(true);
                headers.insert(header::AUTHORIZATION, value);
            } else {
                debug!("No access token available, sending request anonymously");
            }
        }

        Ok(headers)
    }
}

fn attach_body(
    request: RequestBuilder,
    body: Option<RequestBody>,
) -> Result<RequestBuilder, ClientError> {
    Ok(match body {
        None => request,
        Some(RequestBody::Json(value)) => request.body(serde_json::to_vec(&value)?),
        Some(RequestBody::Text(text)) => request.body(text),
        Some(RequestBody::Bytes(bytes)) => request.body(bytes),
        Some(RequestBody::Form(fields)) => request.form(&fields),
    })
}

async fn exchange(request: RequestBuilder) -> Result<(u16, String), ClientError> {
    let response = request.send().await?;
    let status = response.status().as_u16();
    let text = if response::is_bodiless(status) {
        String::new()
    } else {
        response.text().await?
    };
    Ok((status, text))
}

async fn exchange_cancellable(
    request: RequestBuilder,
    token: &CancellationToken,
) -> Result<(u16, String), ClientError> {
    tokio::select! {
        biased;
        () = token.cancelled() => {
            debug!("Request aborted by caller");
            Err(ClientError::Aborted)
        }
        result = exchange(request) => result,
    }
}

/// Builder for [`FetchClient`]
#[derive(Default)]
pub struct FetchClientBuilder {
    base_url: Option<String>,
    config: Option<ApiConfig>,
    tokens: Option<Arc<dyn TokenSource>>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl FetchClientBuilder {
    /// Set the base URL; a trailing `/` is added when missing
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Use an already resolved configuration
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Where authenticated requests read their bearer token
    pub fn token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Set the request timeout (ignored in the browser)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<FetchClient, ClientError> {
        let config = match (self.config, self.base_url) {
            (_, Some(url)) => ApiConfig::new(url)?,
            (Some(config), None) => config,
            (None, None) => {
                return Err(ClientError::Configuration(
                    "base_url is required".into(),
                ));
            }
        };

        let mut client_builder = ClientBuilder::new();

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        client_builder = client_builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        );

        let client = client_builder.build()?;

        Ok(FetchClient {
            client,
            config,
            tokens: self.tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_base_url() {
        let err = FetchClient::builder().build().unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[test]
    fn test_builder_normalizes_base_url() {
        let client = FetchClient::new("http://localhost:8000/api").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api/");
        assert_eq!(
            client.url_for("/v1/tipo-producto/"),
            "http://localhost:8000/api/v1/tipo-producto/"
        );
    }

    #[test]
    fn test_builder_rejects_invalid_url() {
        let err = FetchClient::new("not a url").unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[test]
    fn test_builder_accepts_config() {
        let config = ApiConfig::new("http://example.com/api/").unwrap();
        let client = FetchClient::builder().config(config).build().unwrap();
        assert_eq!(client.base_url(), "http://example.com/api/");
    }
}
