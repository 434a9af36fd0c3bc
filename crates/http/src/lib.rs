//! Panaderia HTTP module providing the REST client and its wire types
//!
//! Every outbound call goes through [`client::FetchClient`], which enforces a
//! single request/response/error contract so callers never deal with status
//! codes or headers directly.

pub mod types;

#[cfg(feature = "client")]
pub mod client;

#[cfg(all(feature = "client", not(target_arch = "wasm32")))]
pub mod search;

#[cfg(feature = "client")]
pub use client::{
    ApiError, ClientError, FetchClient, FetchClientBuilder, FetchOptions, RequestBody,
};
