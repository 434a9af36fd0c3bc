//! Async session operations for components

use super::context::{SessionAction, SessionContext};
use super::error_handler::report_client_error;
use panaderia_http::ClientError;
use panaderia_http::types::LoginRequest;

/// Log in through the context's client and publish the new session
pub async fn sign_in(
    context: &SessionContext,
    request: &LoginRequest,
    remember: bool,
) -> Result<(), ClientError> {
    let client = context
        .client
        .clone()
        .ok_or_else(|| ClientError::Configuration("API client unavailable".into()))?;

    client.sign_in(&context.store, request, remember).await?;
    context.dispatch(SessionAction::Sync);
    Ok(())
}

/// Trade the refresh token for a new access token
///
/// A rejected refresh token ends the session.
pub async fn refresh(context: &SessionContext) -> Result<(), ClientError> {
    let client = context
        .client
        .clone()
        .ok_or_else(|| ClientError::Configuration("API client unavailable".into()))?;

    match client.refresh_session(&context.store).await {
        Ok(_) => {
            context.dispatch(SessionAction::Sync);
            Ok(())
        }
        Err(e) => {
            report_client_error(&e);
            Err(e)
        }
    }
}

/// Spawn [`sign_in`] and hand the outcome to `on_done`
pub fn spawn_sign_in(
    context: SessionContext,
    request: LoginRequest,
    remember: bool,
    on_done: impl FnOnce(Result<(), ClientError>) + 'static,
) {
    wasm_bindgen_futures::spawn_local(async move {
        on_done(sign_in(&context, &request, remember).await);
    });
}
