//! Browser side of the Panaderia console
//!
//! Provides the `localStorage`/`sessionStorage` tiers, the Yew session
//! context that wraps a [`SessionStore`](panaderia_core::SessionStore), and
//! the shared [`FetchClient`](panaderia_http::FetchClient) factory.

pub mod auth;
pub mod client;
pub mod config;
pub mod logging;
pub mod storage;

pub use auth::context::{
    SessionAction, SessionContext, SessionProvider, use_is_authenticated, use_session,
};
pub use client::create_client;
pub use config::FrontendConfig;
pub use storage::{BrowserStorage, browser_session_store};
