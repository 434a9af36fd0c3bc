//! Per-request options

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio_util::sync::CancellationToken;

use super::error::ClientError;

/// Request payload
///
/// Only [`RequestBody::Json`] is serialized by the client and gets a default
/// `Content-Type`; every other kind is sent as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(JsonValue),
    Text(String),
    Bytes(Vec<u8>),
    /// URL-encoded form fields
    Form(Vec<(String, String)>),
}

impl RequestBody {
    /// Serialize any value into a JSON body
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ClientError> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }
}

/// Options for a single [`FetchClient::fetch_json`](super::FetchClient::fetch_json) call
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    /// Attach the bearer token when one is available
    pub auth: bool,
    pub cancel: Option<CancellationToken>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
            auth: false,
            cancel: None,
        }
    }
}

impl FetchOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: RequestBody) -> Self {
        Self::with_body(Method::POST, body)
    }

    pub fn put(body: RequestBody) -> Self {
        Self::with_body(Method::PUT, body)
    }

    pub fn patch(body: RequestBody) -> Self {
        Self::with_body(Method::PATCH, body)
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            ..Self::default()
        }
    }

    fn with_body(method: Method, body: RequestBody) -> Self {
        Self {
            method,
            body: Some(body),
            ..Self::default()
        }
    }

    /// Require the bearer token
    pub fn authenticated(mut self) -> Self {
        self.auth = true;
        self
    }

    /// Add a header, replacing any previous value for the same name
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Abort the request when `token` is cancelled
    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}
