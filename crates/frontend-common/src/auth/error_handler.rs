//! Global auth error handler
//!
//! Lets any request site report a rejected token without holding the session
//! context; the [`SessionProvider`](super::context::SessionProvider)
//! registers the callback.

use panaderia_http::ClientError;
use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    static AUTH_ERROR_CALLBACK: RefCell<Option<Rc<dyn Fn()>>> = RefCell::new(None);
}

/// Set the global auth error callback
pub fn set_auth_error_callback(callback: Rc<dyn Fn()>) {
    AUTH_ERROR_CALLBACK.with(|cb| {
        *cb.borrow_mut() = Some(callback);
    });
}

/// Clear the auth error callback
pub fn clear_auth_error_callback() {
    AUTH_ERROR_CALLBACK.with(|cb| {
        *cb.borrow_mut() = None;
    });
}

/// Trigger the auth error callback
pub fn trigger_auth_error() {
    let callback = AUTH_ERROR_CALLBACK.with(|cb| cb.borrow().clone());
    if let Some(callback) = callback {
        callback();
    }
}

/// Inspect a failed request; a 401 ends the session
pub fn report_client_error(error: &ClientError) {
    if error.is_auth_expired() {
        tracing::info!("Access token rejected, ending session");
        trigger_auth_error();
    }
}
