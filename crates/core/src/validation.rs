//! Client-side form validation
//!
//! These checks run before any request is sent. Messages are the console's
//! user-facing copy; server-side errors are handled separately by the HTTP
//! crate's field-error parser.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static DUPLICATE_EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)unique|único|unico|existe|already|in use|registrad")
        .expect("valid duplicate-email regex")
});

/// Minimum password length accepted by the backend
pub const MIN_PASSWORD_LEN: usize = 8;

/// Field name to message, for every field that failed
pub type FormErrors = BTreeMap<&'static str, &'static str>;

/// Trim and lowercase an email the way the backend normalises it
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate a full name
pub fn validate_name(name: &str) -> Option<&'static str> {
    let name = name.trim();
    if name.is_empty() {
        return Some("El nombre es obligatorio");
    }
    if name.chars().count() < 2 {
        return Some("El nombre debe tener al menos 2 caracteres");
    }
    None
}

/// Validate an email address
pub fn validate_email(email: &str) -> Option<&'static str> {
    let email = email.trim();
    if email.is_empty() {
        return Some("El email es obligatorio");
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Some("Formato de email invalido");
    }
    None
}

/// Validate a new password against the backend policy
pub fn validate_password(password: &str) -> Option<&'static str> {
    if password.is_empty() {
        return Some("La contrasena es obligatoria");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Some("La contrasena debe tener al menos 8 caracteres");
    }
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_ascii_alphanumeric());
    if !(has_letter && has_digit && has_special) {
        return Some("Debe incluir letras, numeros y un caracter especial");
    }
    None
}

/// Validate the repeated password
pub fn validate_password_confirmation(password: &str, confirmation: &str) -> Option<&'static str> {
    if confirmation.is_empty() {
        return Some("Confirma tu contrasena");
    }
    if password != confirmation {
        return Some("Las contrasenas no coinciden");
    }
    None
}

/// Registration form values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Validate every registration field
pub fn validate_register(form: &RegisterForm) -> FormErrors {
    let mut errors = FormErrors::new();
    let checks = [
        ("name", validate_name(&form.name)),
        ("email", validate_email(&form.email)),
        ("password", validate_password(&form.password)),
        (
            "confirmPassword",
            validate_password_confirmation(&form.password, &form.confirm_password),
        ),
    ];
    for (field, error) in checks {
        if let Some(message) = error {
            errors.insert(field, message);
        }
    }
    errors
}

/// Validate the login form; the password only has to be present
pub fn validate_login(email: &str, password: &str) -> FormErrors {
    let mut errors = FormErrors::new();
    if let Some(message) = validate_email(email) {
        errors.insert("email", message);
    }
    if password.is_empty() {
        errors.insert("password", "La contrasena es obligatoria");
    }
    errors
}

/// Whether a backend message says the email is already registered
pub fn is_duplicate_email_message(message: &str) -> bool {
    DUPLICATE_EMAIL_PATTERN.is_match(message)
}

/// Coarse password strength shown while typing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PasswordStrength {
    Empty,
    Weak,
    Medium,
    Strong,
}

impl PasswordStrength {
    /// Score a password: length, letters with digits, special characters
    pub fn of(password: &str) -> Self {
        if password.is_empty() {
            return Self::Empty;
        }
        let mut score = 0;
        if password.chars().count() >= MIN_PASSWORD_LEN {
            score += 1;
        }
        if password.chars().any(|c| c.is_ascii_alphabetic())
            && password.chars().any(|c| c.is_ascii_digit())
        {
            score += 1;
        }
        if password.chars().any(|c| !c.is_ascii_alphanumeric()) {
            score += 1;
        }
        match score {
            0 | 1 => Self::Weak,
            2 => Self::Medium,
            _ => Self::Strong,
        }
    }

    /// Label shown next to the meter
    pub fn label(self) -> &'static str {
        match self {
            Self::Empty | Self::Weak => "Baja",
            Self::Medium => "Media",
            Self::Strong => "Alta",
        }
    }

    /// Fill of the meter, 0-100
    pub fn percent(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Weak => 33,
            Self::Medium => 67,
            Self::Strong => 100,
        }
    }
}
