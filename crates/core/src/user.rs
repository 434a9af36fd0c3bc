//! Helpers over the opaque user profile stored in the session

use serde_json::Value as JsonValue;
use unicode_normalization::UnicodeNormalization;

/// Initials shown when the profile has no usable name
pub const DEFAULT_INITIALS: &str = "US";

const NAME_FIELDS: [&str; 5] = [
    "nombre_completo",
    "full_name",
    "name",
    "display_name",
    "username",
];

fn field<'a>(user: &'a JsonValue, key: &str) -> Option<&'a str> {
    user.get(key)
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Best display name for a profile, or an empty string
pub fn user_display_name(user: Option<&JsonValue>) -> String {
    let Some(user) = user.filter(|u| u.is_object()) else {
        return String::new();
    };

    if let Some(name) = NAME_FIELDS.iter().find_map(|key| field(user, key)) {
        return name.to_string();
    }

    let first = field(user, "first_name").or_else(|| field(user, "nombre"));
    let last = field(user, "last_name").or_else(|| field(user, "apellido"));
    if first.is_some() || last.is_some() {
        return [first, last].into_iter().flatten().collect::<Vec<_>>().join(" ");
    }

    field(user, "email").unwrap_or_default().to_string()
}

/// Email of a profile, or an empty string
pub fn user_email(user: Option<&JsonValue>) -> String {
    user.and_then(|u| field(u, "email"))
        .unwrap_or_default()
        .to_string()
}

/// Strip diacritics so "Élida" contributes an `E`
fn fold_accents(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect()
}

fn alphanumeric(word: &str) -> String {
    word.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Up to two uppercase initials for the avatar badge
pub fn user_initials(user: Option<&JsonValue>, fallback: &str) -> String {
    let name = user_display_name(user);
    let base = if name.is_empty() { user_email(user) } else { name };
    let clean = fold_accents(&base);
    let parts: Vec<&str> = clean.split_whitespace().collect();

    let initials = match parts.as_slice() {
        [] => String::new(),
        [single] => alphanumeric(single).chars().take(2).collect(),
        [first, .., last] => alphanumeric(first)
            .chars()
            .take(1)
            .chain(alphanumeric(last).chars().take(1))
            .collect(),
    };

    if initials.is_empty() {
        fallback.to_string()
    } else {
        initials.to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_name_precedence() {
        let user = json!({"username": "apaz", "full_name": "Ana Paz"});
        assert_eq!(user_display_name(Some(&user)), "Ana Paz");

        let user = json!({"first_name": "Ana", "apellido": "Paz"});
        assert_eq!(user_display_name(Some(&user)), "Ana Paz");

        let user = json!({"email": " ana@example.com "});
        assert_eq!(user_display_name(Some(&user)), "ana@example.com");

        assert_eq!(user_display_name(Some(&json!("not an object"))), "");
        assert_eq!(user_display_name(None), "");
    }

    #[test]
    fn test_initials() {
        let user = json!({"nombre_completo": "Élida María Pérez"});
        assert_eq!(user_initials(Some(&user), DEFAULT_INITIALS), "EP");

        let user = json!({"email": "panadero@example.com"});
        assert_eq!(user_initials(Some(&user), DEFAULT_INITIALS), "PA");

        assert_eq!(user_initials(None, DEFAULT_INITIALS), "US");
        assert_eq!(
            user_initials(Some(&json!({"name": "!!"})), DEFAULT_INITIALS),
            "US"
        );
    }
}
