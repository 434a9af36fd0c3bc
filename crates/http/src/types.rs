//! Request and response bodies of the Panaderia REST API

use chrono::{SecondsFormat, Utc};
use panaderia_core::SessionPayload;
use panaderia_core::validation::normalize_email;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Account registration request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub nombre_completo: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

impl RegisterRequest {
    /// Build a request with the name trimmed and the email normalised
    pub fn new(
        full_name: &str,
        email: &str,
        password: impl Into<String>,
        confirmation: impl Into<String>,
    ) -> Self {
        Self {
            nombre_completo: full_name.trim().to_string(),
            email: normalize_email(email),
            password: password.into(),
            password2: confirmation.into(),
        }
    }
}

/// Registration response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: Option<String>,
    /// Where the console should go next
    #[serde(default)]
    pub next: Option<String>,
}

/// Login request
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: &str, password: impl Into<String>) -> Self {
        Self {
            email: normalize_email(email),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Login response
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub user: Option<JsonValue>,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl From<LoginResponse> for SessionPayload {
    fn from(response: LoginResponse) -> Self {
        let payload = Self::tokens(response.access, response.refresh);
        match response.user {
            Some(user) => payload.with_user(user),
            None => payload,
        }
    }
}

/// Token refresh request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRefreshRequest {
    pub refresh: String,
}

/// Token refresh response; `refresh` is present when rotation is enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Audit record of a sign-in attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInAttempt {
    pub email: String,
    pub success: bool,
    /// RFC 3339 timestamp with millisecond precision
    pub ts: String,
}

impl SignInAttempt {
    /// Record an attempt happening now
    pub fn now(email: &str, success: bool) -> Self {
        Self {
            email: normalize_email(email),
            success,
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Start of the password recovery flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Reset token check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetTokenRequest {
    pub token: String,
}

/// Password reset confirmation
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub token: String,
    pub password: String,
    pub password2: String,
}

impl ResetPasswordRequest {
    pub fn new(
        email: &str,
        token: impl Into<String>,
        password: impl Into<String>,
        confirmation: impl Into<String>,
    ) -> Self {
        Self {
            email: normalize_email(email),
            token: token.into(),
            password: password.into(),
            password2: confirmation.into(),
        }
    }
}

impl fmt::Debug for ResetPasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetPasswordRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Plain acknowledgement returned by most mutating endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl MessageResponse {
    /// Whichever of `message` or `detail` the server sent
    pub fn text(&self) -> Option<&str> {
        self.message.as_deref().or(self.detail.as_deref())
    }
}

/// Lifecycle state of a product type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductTypeStatus {
    Activo,
    Inactivo,
}

impl ProductTypeStatus {
    pub fn is_active(self) -> bool {
        self == Self::Activo
    }

    /// Value of the `estado` query filter
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Activo => "Activo",
            Self::Inactivo => "Inactivo",
        }
    }
}

impl fmt::Display for ProductTypeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Product type as listed by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductType {
    pub id: i64,
    pub nombre: String,
    #[serde(default)]
    pub descripcion: String,
    pub estado: ProductTypeStatus,
}

/// Create/update body for a product type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTypeInput {
    pub nombre: String,
    #[serde(default)]
    pub descripcion: String,
    pub activo: bool,
}

impl ProductTypeInput {
    pub fn new(nombre: &str, descripcion: &str, activo: bool) -> Self {
        Self {
            nombre: nombre.trim().to_string(),
            descripcion: descripcion.trim().to_string(),
            activo,
        }
    }
}

/// Status toggle body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTypeStatusUpdate {
    pub activo: bool,
}

/// Response to a create call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub id: i64,
}

/// Filters for the product type listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductTypeQuery {
    /// Case-insensitive substring of the name
    pub search: Option<String>,
    pub estado: Option<ProductTypeStatus>,
}

impl ProductTypeQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            estado: None,
        }
    }

    /// Non-blank query pairs
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            pairs.push(("search".to_string(), term.to_string()));
        }
        if let Some(estado) = self.estado {
            pairs.push(("estado".to_string(), estado.as_str().to_string()));
        }
        pairs
    }
}

/// One page of product types
///
/// The listing endpoint answers in three shapes: a bare array, a paginated
/// `{count, next, previous, results}` object, or `{"message": "Sin
/// resultados."}` when nothing matches. All three collapse into this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductTypePage {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<ProductType>,
    /// Server message sent instead of results
    pub message: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProductTypeList {
    Items(Vec<ProductType>),
    Page {
        #[serde(default)]
        count: Option<usize>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<ProductType>,
    },
    Empty {
        #[serde(default)]
        message: Option<String>,
    },
}

impl ProductTypePage {
    /// Collapse any of the listing shapes into a page
    pub fn from_value(value: JsonValue) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(match serde_json::from_value(value)? {
            RawProductTypeList::Items(results) => Self {
                count: results.len(),
                results,
                ..Self::default()
            },
            RawProductTypeList::Page {
                count,
                next,
                previous,
                results,
            } => Self {
                count: count.unwrap_or(results.len()),
                next,
                previous,
                results,
                message: None,
            },
            RawProductTypeList::Empty { message } => Self {
                message,
                ..Self::default()
            },
        })
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_request_normalizes() {
        let request = RegisterRequest::new("  Ana Paz ", " Ana@Example.com", "pw", "pw");
        assert_eq!(request.nombre_completo, "Ana Paz");
        assert_eq!(request.email, "ana@example.com");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "nombre_completo": "Ana Paz",
                "email": "ana@example.com",
                "password": "pw",
                "password2": "pw",
            })
        );
    }

    #[test]
    fn test_login_response_into_payload() {
        let response: LoginResponse = serde_json::from_value(json!({
            "access": "a1",
            "refresh": "r1",
            "user": {"email": "ana@example.com"},
        }))
        .unwrap();
        let payload = SessionPayload::from(response);
        assert_eq!(payload.access_token.as_deref(), Some("a1"));
        assert_eq!(payload.refresh_token.as_deref(), Some("r1"));
        assert_eq!(payload.user, Some(json!({"email": "ana@example.com"})));
        assert_eq!(payload.remember, None);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let request = LoginRequest::new("ana@example.com", "hunter2!");
        assert!(!format!("{request:?}").contains("hunter2"));
    }

    #[test]
    fn test_sign_in_attempt_timestamp() {
        let attempt = SignInAttempt::now("Ana@Example.com", false);
        assert_eq!(attempt.email, "ana@example.com");
        assert!(attempt.ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&attempt.ts).is_ok());
    }

    #[test]
    fn test_page_from_bare_array() {
        let page = ProductTypePage::from_value(json!([
            {"id": 1, "nombre": "Pan", "descripcion": "", "estado": "Activo"},
            {"id": 2, "nombre": "Tortas", "estado": "Inactivo"},
        ]))
        .unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(page.results[1].descripcion, "");
        assert_eq!(page.results[1].estado, ProductTypeStatus::Inactivo);
    }

    #[test]
    fn test_page_from_paginated_object() {
        let page = ProductTypePage::from_value(json!({
            "count": 12,
            "next": "http://localhost/api/v1/tipo-producto/?page=2",
            "previous": null,
            "results": [{"id": 1, "nombre": "Pan", "descripcion": "x", "estado": "Activo"}],
        }))
        .unwrap();
        assert_eq!(page.count, 12);
        assert_eq!(page.results.len(), 1);
        assert!(page.next.is_some());
    }

    #[test]
    fn test_page_from_empty_marker() {
        let page = ProductTypePage::from_value(json!({"message": "Sin resultados."})).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.message.as_deref(), Some("Sin resultados."));

        assert!(ProductTypePage::from_value(JsonValue::Null).unwrap().is_empty());
    }

    #[test]
    fn test_query_pairs_skip_blank_search() {
        let query = ProductTypeQuery {
            search: Some("   ".into()),
            estado: Some(ProductTypeStatus::Activo),
        };
        assert_eq!(
            query.pairs(),
            vec![("estado".to_string(), "Activo".to_string())]
        );
    }
}
