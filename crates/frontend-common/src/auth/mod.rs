//! Session handling for the browser

pub mod actions;
pub mod context;
pub mod error_handler;

pub use actions::{refresh, sign_in, spawn_sign_in};
pub use context::{
    SessionAction, SessionContext, SessionContextData, SessionProvider, use_is_authenticated,
    use_session,
};
pub use error_handler::report_client_error;
