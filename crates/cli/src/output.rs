//! Terminal rendering of command results

use panaderia_core::user::{DEFAULT_INITIALS, user_display_name, user_email, user_initials};
use panaderia_core::{Session, Tier};
use panaderia_http::client::field_errors::FieldErrors;
use panaderia_http::search::SearchState;
use panaderia_http::types::ProductType;

/// One-line summary of a session
pub fn session_line(session: &Session) -> String {
    if !session.is_authenticated {
        return "Not signed in".to_string();
    }
    let user = session.user.as_ref();
    let name = user_display_name(user);
    let email = user_email(user);
    let who = match (name.is_empty(), email.is_empty() || name == email) {
        (true, true) => "unknown user".to_string(),
        (true, false) => email,
        (false, true) => name,
        (false, false) => format!("{name} <{email}>"),
    };
    format!(
        "[{}] Signed in as {who} ({} session)",
        user_initials(user, DEFAULT_INITIALS),
        Tier::for_remember(session.remember)
    )
}

pub fn print_session(session: &Session, persistent: bool) {
    println!("{}", session_line(session));
    if !persistent {
        println!("Warning: session storage is unavailable, this session will not be saved");
    }
}

/// Render product types as an aligned table
pub fn product_type_table(items: &[ProductType]) -> String {
    let name_width = items
        .iter()
        .map(|item| item.nombre.chars().count())
        .chain(std::iter::once("Nombre".len()))
        .max()
        .unwrap_or_default();

    let mut out = format!("{:>6}  {:<name_width$}  {:<8}  Descripcion\n", "ID", "Nombre", "Estado");
    for item in items {
        out.push_str(&format!(
            "{:>6}  {:<name_width$}  {:<8}  {}\n",
            item.id,
            item.nombre,
            item.estado.as_str(),
            item.descripcion
        ));
    }
    out
}

pub fn print_product_types(items: &[ProductType], message: Option<&str>) {
    if items.is_empty() {
        println!("{}", message.unwrap_or("Sin resultados."));
    } else {
        print!("{}", product_type_table(items));
    }
}

pub fn print_field_errors(errors: &FieldErrors) {
    if let Some(global) = &errors.global {
        eprintln!("{global}");
    }
    for (field, message) in &errors.fields {
        eprintln!("  {field}: {message}");
    }
}

/// Render one live search transition
pub fn search_line(state: &SearchState<ProductType>) -> Option<String> {
    if let Some(notice) = state.notice {
        return Some(notice.message().to_string());
    }
    if state.loading {
        return Some(format!("Buscando \"{}\"...", state.term));
    }
    if state.term.is_empty() && state.results.is_empty() {
        return None;
    }
    Some(if state.results.is_empty() {
        format!("Sin resultados para \"{}\".", state.term)
    } else {
        product_type_table(&state.results)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use panaderia_http::search::SearchNotice;
    use panaderia_http::types::ProductTypeStatus;
    use serde_json::json;

    fn pan() -> ProductType {
        ProductType {
            id: 1,
            nombre: "Pan".into(),
            descripcion: "De masa madre".into(),
            estado: ProductTypeStatus::Activo,
        }
    }

    #[test]
    fn test_session_line() {
        assert_eq!(session_line(&Session::default()), "Not signed in");

        let session = Session::from_parts(
            Some("a1".into()),
            None,
            Some(json!({"nombre_completo": "Ana Paz", "email": "ana@example.com"})),
            true,
        );
        assert_eq!(
            session_line(&session),
            "[AP] Signed in as Ana Paz <ana@example.com> (durable session)"
        );
    }

    #[test]
    fn test_table_alignment() {
        let table = product_type_table(&[pan()]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("Activo"));
        assert_eq!(lines[0].find("Estado"), lines[1].find("Activo"));
    }

    #[test]
    fn test_search_line() {
        let mut state = SearchState::default();
        assert_eq!(search_line(&state), None);

        state.term = "pan".into();
        state.loading = true;
        assert_eq!(search_line(&state).as_deref(), Some("Buscando \"pan\"..."));

        state.notice = Some(SearchNotice::RateLimited);
        assert_eq!(
            search_line(&state).as_deref(),
            Some(SearchNotice::RateLimited.message())
        );

        state.notice = None;
        state.loading = false;
        state.results = vec![pan()];
        assert!(search_line(&state).unwrap().contains("De masa madre"));
    }
}
