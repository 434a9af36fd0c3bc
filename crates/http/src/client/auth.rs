//! Authentication endpoints

use super::{ClientError, FetchClient, FetchOptions, RequestBody};
use crate::types::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
    RegisterResponse, ResetPasswordRequest, ResetTokenRequest, SignInAttempt, TokenRefreshRequest,
    TokenRefreshResponse,
};
use panaderia_core::{Session, SessionOptions, SessionPayload, SessionStore};
use tracing::{debug, info};

pub const REGISTER_PATH: &str = "v1/auth/register/";
pub const LOGIN_PATH: &str = "v1/auth/login/";
pub const REFRESH_PATH: &str = "v1/auth/refresh/";
pub const LOGIN_LOGS_PATH: &str = "v1/auth/login/logs/";
pub const FORGOT_PASSWORD_PATH: &str = "v1/auth/password/forgot/";
pub const RESET_VALIDATE_PATH: &str = "v1/auth/password/reset/validate/";
pub const RESET_PASSWORD_PATH: &str = "v1/auth/password/reset/";

impl FetchClient {
    /// Create an account
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ClientError> {
        let response: RegisterResponse = self
            .fetch(REGISTER_PATH, FetchOptions::post(RequestBody::json(request)?))
            .await?;
        info!(email = %request.email, "Account registered");
        Ok(response)
    }

    /// Exchange credentials for a token pair
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        self.fetch(LOGIN_PATH, FetchOptions::post(RequestBody::json(request)?))
            .await
    }

    /// Log in and hand the result to the session store
    ///
    /// The attempt is also reported to the audit endpoint, whose failures
    /// never affect the outcome.
    pub async fn sign_in(
        &self,
        store: &SessionStore,
        request: &LoginRequest,
        remember: bool,
    ) -> Result<Session, ClientError> {
        let result = self.login(request).await;
        self.log_sign_in_attempt(&request.email, result.is_ok()).await;

        let payload = SessionPayload::from(result?);
        let session = store.set_session(payload, SessionOptions::remember(remember));
        info!(email = %request.email, remember, "Signed in");
        Ok(session)
    }

    /// Obtain a new access token from a refresh token
    pub async fn refresh_token(&self, refresh: &str) -> Result<TokenRefreshResponse, ClientError> {
        let body = RequestBody::json(&TokenRefreshRequest {
            refresh: refresh.to_string(),
        })?;
        self.fetch(REFRESH_PATH, FetchOptions::post(body)).await
    }

    /// Refresh the stored access token, keeping the current tier
    ///
    /// Returns `Ok(None)` when the session has no refresh token.
    pub async fn refresh_session(
        &self,
        store: &SessionStore,
    ) -> Result<Option<Session>, ClientError> {
        let current = store.session();
        let Some(refresh) = current.refresh_token.clone() else {
            debug!("No refresh token, skipping refresh");
            return Ok(None);
        };

        let tokens = self.refresh_token(&refresh).await?;
        let payload = SessionPayload {
            access_token: Some(tokens.access),
            refresh_token: tokens.refresh.or(Some(refresh)),
            user: current.user.clone(),
            remember: Some(current.remember),
        };
        Ok(Some(store.set_session(payload, SessionOptions::default())))
    }

    /// Report a sign-in attempt; failures are logged and dropped
    pub async fn log_sign_in_attempt(&self, email: &str, success: bool) {
        let attempt = SignInAttempt::now(email, success);
        let body = match RequestBody::json(&attempt) {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %e, "Could not encode sign-in attempt");
                return;
            }
        };
        if let Err(e) = self
            .fetch_json(LOGIN_LOGS_PATH, FetchOptions::post(body))
            .await
        {
            debug!(error = %e, "Sign-in attempt not recorded");
        }
    }

    /// Start password recovery; the server answers the same for unknown emails
    pub async fn request_password_reset(&self, email: &str) -> Result<MessageResponse, ClientError> {
        let body = RequestBody::json(&ForgotPasswordRequest {
            email: panaderia_core::validation::normalize_email(email),
        })?;
        self.fetch(FORGOT_PASSWORD_PATH, FetchOptions::post(body))
            .await
    }

    /// Check that a reset token is still valid
    pub async fn validate_reset_token(&self, token: &str) -> Result<MessageResponse, ClientError> {
        let body = RequestBody::json(&ResetTokenRequest {
            token: token.trim().to_string(),
        })?;
        self.fetch(RESET_VALIDATE_PATH, FetchOptions::post(body))
            .await
    }

    /// Set a new password using a reset token
    pub async fn confirm_password_reset(
        &self,
        request: &ResetPasswordRequest,
    ) -> Result<MessageResponse, ClientError> {
        self.fetch(
            RESET_PASSWORD_PATH,
            FetchOptions::post(RequestBody::json(request)?),
        )
        .await
    }
}
