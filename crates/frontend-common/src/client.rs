//! Client configuration and initialization

use crate::config::FrontendConfig;
use panaderia_core::SessionStore;
pub use panaderia_http::ClientError;
use panaderia_http::FetchClient;
use std::sync::Arc;

/// Client reading its bearer token from `store`
pub fn create_client(store: Arc<SessionStore>) -> Result<FetchClient, ClientError> {
    FetchClient::builder()
        .config(FrontendConfig::api_config())
        .token_source(store)
        .build()
}
