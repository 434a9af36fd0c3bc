//! Mapping of API error bodies onto form fields
//!
//! DRF validation errors arrive as `{"field": ["message", ...]}`, with
//! form-wide problems under `non_field_errors` or `detail`. The parser picks
//! one message per form field and at most one global message:
//!
//! 1. per-field arrays, first message wins;
//! 2. `non_field_errors` (joined with spaces);
//! 3. `detail`, then a plain `error` string;
//! 4. the generic fallback, only when nothing above matched.

use super::{ApiError, ClientError};
use panaderia_core::validation::is_duplicate_email_message;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

pub const GENERIC_ERROR_MESSAGE: &str = "Ocurrio un error. Intentalo nuevamente.";
pub const REGISTER_FAILED_MESSAGE: &str =
    "No se pudo completar el registro. Intentalo nuevamente.";
pub const DUPLICATE_EMAIL_MESSAGE: &str = "Ya existe una cuenta con ese email";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Credenciales invalidas";

/// Backend field name to form field name
pub type FieldMapping = [(&'static str, &'static str)];

pub const REGISTER_FIELDS: &FieldMapping = &[
    ("nombre_completo", "name"),
    ("name", "name"),
    ("email", "email"),
    ("password", "password"),
    ("password2", "confirmPassword"),
    ("confirm_password", "confirmPassword"),
];

pub const LOGIN_FIELDS: &FieldMapping = &[("email", "email"), ("password", "password")];

pub const PASSWORD_RESET_FIELDS: &FieldMapping = &[
    ("email", "email"),
    ("password", "password"),
    ("new_password", "password"),
    ("new_password1", "password"),
    ("password2", "confirmPassword"),
    ("new_password2", "confirmPassword"),
    ("confirm_password", "confirmPassword"),
    ("token", "token"),
];

pub const PRODUCT_TYPE_FIELDS: &FieldMapping = &[
    ("nombre", "nombre"),
    ("descripcion", "descripcion"),
    ("activo", "activo"),
];

/// Messages to show on a form after a failed submit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub fields: BTreeMap<&'static str, String>,
    pub global: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.global.is_none()
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    fn global(message: &str) -> Self {
        Self {
            fields: BTreeMap::new(),
            global: Some(message.to_string()),
        }
    }
}

/// Configurable translator from [`ApiError`] bodies to [`FieldErrors`]
#[derive(Debug, Clone, Copy)]
pub struct FieldErrorParser {
    mapping: &'static FieldMapping,
    fallback: &'static str,
    duplicate_email: bool,
}

impl FieldErrorParser {
    pub const fn new(mapping: &'static FieldMapping) -> Self {
        Self {
            mapping,
            fallback: GENERIC_ERROR_MESSAGE,
            duplicate_email: false,
        }
    }

    /// Parser for the registration form
    pub const fn register() -> Self {
        Self::new(REGISTER_FIELDS)
            .with_fallback(REGISTER_FAILED_MESSAGE)
            .with_duplicate_email()
    }

    pub const fn with_fallback(mut self, fallback: &'static str) -> Self {
        self.fallback = fallback;
        self
    }

    /// Route "email already registered" wording to the `email` field
    pub const fn with_duplicate_email(mut self) -> Self {
        self.duplicate_email = true;
        self
    }

    /// Translate any client error
    ///
    /// Aborted requests produce no messages; transport failures only the
    /// fallback.
    pub fn parse(&self, error: &ClientError) -> FieldErrors {
        match error {
            ClientError::Aborted => FieldErrors::default(),
            ClientError::Api(api) => self.parse_api(api),
            _ => FieldErrors::global(self.fallback),
        }
    }

    pub fn parse_api(&self, error: &ApiError) -> FieldErrors {
        let data = &error.data;
        if !data.is_object() {
            return FieldErrors::global(self.fallback);
        }

        let mut errors = FieldErrors::default();
        for &(source, target) in self.mapping {
            if errors.fields.contains_key(target) {
                continue;
            }
            if let Some(message) = first_message(data.get(source)) {
                let message = if target == "email" && self.duplicate_email_wording(&message) {
                    DUPLICATE_EMAIL_MESSAGE.to_string()
                } else {
                    message
                };
                errors.fields.insert(target, message);
            }
        }

        let candidates = [
            joined_messages(data.get("non_field_errors")),
            string_field(data, "detail"),
            string_field(data, "error"),
        ];
        for message in candidates.into_iter().flatten() {
            if self.claim_duplicate_email(&mut errors, &message) {
                continue;
            }
            if errors.global.is_none() {
                errors.global = Some(message);
            }
        }

        if matches!(error.status, 400 | 409) && !errors.fields.contains_key("email") {
            let hint = string_field(data, "message").unwrap_or_else(|| data.to_string());
            self.claim_duplicate_email(&mut errors, &hint);
        }

        if errors.is_empty() {
            errors.global = Some(self.fallback.to_string());
        }
        errors
    }

    fn duplicate_email_wording(&self, message: &str) -> bool {
        self.duplicate_email && is_duplicate_email_message(message)
    }

    /// Move a duplicate-email message onto the email field, once
    fn claim_duplicate_email(&self, errors: &mut FieldErrors, message: &str) -> bool {
        if !self.duplicate_email_wording(message) {
            return false;
        }
        errors
            .fields
            .entry("email")
            .or_insert_with(|| DUPLICATE_EMAIL_MESSAGE.to_string());
        true
    }
}

/// Translate a failed login
///
/// Wrong-credential wording becomes a password error; server field errors
/// override it. Any other form-wide message is replaced by the generic one.
pub fn login_errors(error: &ClientError) -> FieldErrors {
    let Some(api) = error.api() else {
        return FieldErrorParser::new(LOGIN_FIELDS).parse(error);
    };
    let data = &api.data;

    let combined = [
        string_field(data, "detail"),
        joined_messages(data.get("non_field_errors")),
    ]
    .into_iter()
    .flatten()
    .map(|m| m.trim().to_string())
    .filter(|m| !m.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase();

    let invalid_credentials = ["invalid", "credenciales", "incorrect"]
        .iter()
        .any(|word| combined.contains(word));

    let mut errors = FieldErrors::default();
    if invalid_credentials {
        errors
            .fields
            .insert("password", INVALID_CREDENTIALS_MESSAGE.to_string());
    }
    for &(source, target) in LOGIN_FIELDS {
        if let Some(message) = first_message(data.get(source)) {
            errors.fields.insert(target, message);
        }
    }

    if errors.fields.is_empty() {
        errors.global = Some(GENERIC_ERROR_MESSAGE.to_string());
    }
    errors
}

fn first_message(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::Array(items) => items.first().map(message_text),
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn joined_messages(value: Option<&JsonValue>) -> Option<String> {
    let joined = match value? {
        JsonValue::Array(items) => items.iter().map(message_text).collect::<Vec<_>>().join(" "),
        JsonValue::String(s) => s.clone(),
        _ => return None,
    };
    (!joined.is_empty()).then_some(joined)
}

fn string_field(data: &JsonValue, key: &str) -> Option<String> {
    data.get(key)
        .and_then(JsonValue::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn message_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
