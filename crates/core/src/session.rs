//! Authenticated session model and its persisted key layout

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Storage key holding the access token
pub const ACCESS_KEY: &str = "auth.access";
/// Storage key holding the refresh token
pub const REFRESH_KEY: &str = "auth.refresh";
/// Storage key holding the JSON-serialised user profile
pub const USER_KEY: &str = "auth.user";
/// Storage key holding `"true"` / `"false"` for the remember-me flag
pub const REMEMBER_KEY: &str = "auth.remember";

/// Every key owned by the session, identical in both tiers
pub const SESSION_KEYS: [&str; 4] = [ACCESS_KEY, REFRESH_KEY, USER_KEY, REMEMBER_KEY];

/// Whether a storage key belongs to the session
pub fn is_session_key(key: &str) -> bool {
    SESSION_KEYS.contains(&key)
}

/// The authenticated session as seen by one store
///
/// `is_authenticated` always mirrors `access_token.is_some()`; construct
/// through [`Session::from_parts`] or [`Session::default`] to keep that true.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub is_authenticated: bool,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Opaque user profile as returned by the backend
    pub user: Option<JsonValue>,
    pub remember: bool,
}

impl Session {
    /// Build a session, deriving `is_authenticated` from the access token
    pub fn from_parts(
        access_token: Option<String>,
        refresh_token: Option<String>,
        user: Option<JsonValue>,
        remember: bool,
    ) -> Self {
        let access_token = access_token.filter(|token| !token.is_empty());
        Self {
            is_authenticated: access_token.is_some(),
            access_token,
            refresh_token,
            user,
            remember,
        }
    }

    /// Access token, if authenticated
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }
}

/// Session data handed over after a successful login or registration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionPayload {
    #[serde(default, alias = "access")]
    pub access_token: Option<String>,
    #[serde(default, alias = "refresh")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<JsonValue>,
    #[serde(default)]
    pub remember: Option<bool>,
}

impl SessionPayload {
    /// Payload carrying only tokens
    pub fn tokens(access: impl Into<String>, refresh: Option<String>) -> Self {
        Self {
            access_token: Some(access.into()),
            refresh_token: refresh,
            ..Self::default()
        }
    }

    /// Attach a user profile
    pub fn with_user(mut self, user: JsonValue) -> Self {
        self.user = Some(user);
        self
    }
}

/// Options for [`crate::SessionStore::set_session`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Overrides `SessionPayload::remember` when set
    pub remember: Option<bool>,
}

impl SessionOptions {
    pub fn remember(remember: bool) -> Self {
        Self {
            remember: Some(remember),
        }
    }
}

/// Parse a persisted user blob, treating anything unparsable as absent
pub(crate) fn parse_user(raw: Option<String>) -> Option<JsonValue> {
    let raw = raw.filter(|value| !value.is_empty())?;
    serde_json::from_str(&raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_parts_derives_authentication() {
        let session = Session::from_parts(Some("tok".into()), None, None, false);
        assert!(session.is_authenticated);

        let session = Session::from_parts(Some(String::new()), None, None, true);
        assert!(!session.is_authenticated);
        assert_eq!(session.access_token, None);
    }

    #[test]
    fn test_payload_accepts_login_response_shape() {
        let payload: SessionPayload = serde_json::from_value(json!({
            "access": "a1",
            "refresh": "r1",
            "user": {"email": "ana@example.com"}
        }))
        .unwrap();

        assert_eq!(payload.access_token.as_deref(), Some("a1"));
        assert_eq!(payload.refresh_token.as_deref(), Some("r1"));
        assert_eq!(payload.user.unwrap()["email"], "ana@example.com");
        assert_eq!(payload.remember, None);
    }

    #[test]
    fn test_parse_user_is_lenient() {
        assert_eq!(parse_user(None), None);
        assert_eq!(parse_user(Some("{broken".into())), None);
        assert_eq!(parse_user(Some(r#"{"id":1}"#.into())), Some(json!({"id": 1})));
    }

    #[test]
    fn test_session_keys() {
        assert!(is_session_key("auth.user"));
        assert!(!is_session_key("theme"));
    }
}
