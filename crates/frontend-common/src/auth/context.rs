//! Global session context and provider

use crate::client::create_client;
use crate::storage::browser_session_store;
use gloo_events::EventListener;
use panaderia_core::{Session, SessionOptions, SessionPayload, SessionStore};
use panaderia_http::FetchClient;
use std::rc::Rc;
use std::sync::Arc;
use wasm_bindgen::JsCast;
use web_sys::StorageEvent;
use yew::prelude::*;

/// Session context data
///
/// `session` is a snapshot of the store taken after every action, so
/// components re-render whenever the store changes through this context.
#[derive(Clone, Debug)]
pub struct SessionContextData {
    pub session: Session,
    pub persistent: bool,
    pub store: Arc<SessionStore>,
    /// Client sending the store's access token
    pub client: Option<FetchClient>,
}

impl PartialEq for SessionContextData {
    fn eq(&self, other: &Self) -> bool {
        self.session == other.session
            && self.persistent == other.persistent
            && Arc::ptr_eq(&self.store, &other.store)
    }
}

impl SessionContextData {
    pub fn new(store: Arc<SessionStore>) -> Self {
        let client = match create_client(Arc::clone(&store)) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create API client");
                None
            }
        };
        Self {
            session: store.session(),
            persistent: store.is_persistent(),
            store,
            client,
        }
    }

    fn snapshot(&self, session: Session) -> Rc<Self> {
        Rc::new(Self {
            session,
            persistent: self.store.is_persistent(),
            store: Arc::clone(&self.store),
            client: self.client.clone(),
        })
    }
}

impl Default for SessionContextData {
    fn default() -> Self {
        Self::new(Arc::new(browser_session_store()))
    }
}

/// Session context actions
pub enum SessionAction {
    /// Store a freshly issued session
    SignedIn(SessionPayload, SessionOptions),
    Logout,
    /// The store was changed directly; re-read its in-memory state
    Sync,
    /// Reload from storage
    Reload,
    /// A `storage` event fired for `key` (`None` when storage was cleared)
    StorageChanged(Option<String>),
}

/// Session context
pub type SessionContext = UseReducerHandle<SessionContextData>;

impl Reducible for SessionContextData {
    type Action = SessionAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        match action {
            SessionAction::SignedIn(payload, options) => {
                let session = self.store.set_session(payload, options);
                self.snapshot(session)
            }
            SessionAction::Logout => {
                self.store.logout();
                self.snapshot(Session::default())
            }
            SessionAction::Sync => self.snapshot(self.store.session()),
            SessionAction::Reload => {
                let session = self.store.refresh_auth_state();
                self.snapshot(session)
            }
            SessionAction::StorageChanged(key) => {
                if self.store.handle_storage_event(key.as_deref()) {
                    self.snapshot(self.store.session())
                } else {
                    self
                }
            }
        }
    }
}

/// Session provider props
#[derive(Properties, PartialEq)]
pub struct SessionProviderProps {
    pub children: Children,
}

/// Session provider component
#[function_component(SessionProvider)]
pub fn session_provider(props: &SessionProviderProps) -> Html {
    let context = use_reducer(SessionContextData::default);

    // Log out when any request reports an expired session
    {
        let context = context.clone();
        use_effect_with((), move |_| {
            super::error_handler::set_auth_error_callback(Rc::new(move || {
                context.dispatch(SessionAction::Logout);
            }));

            move || {
                super::error_handler::clear_auth_error_callback();
            }
        });
    }

    // Follow logins and logouts made in other tabs
    {
        let context = context.clone();
        use_effect_with((), move |_| {
            let listener = web_sys::window().map(|window| {
                EventListener::new(&window, "storage", move |event| {
                    let key = event.dyn_ref::<StorageEvent>().and_then(StorageEvent::key);
                    context.dispatch(SessionAction::StorageChanged(key));
                })
            });

            move || drop(listener)
        });
    }

    html! {
        <ContextProvider<SessionContext> context={context}>
            {props.children.clone()}
        </ContextProvider<SessionContext>>
    }
}

/// Hook to use the session context
#[hook]
pub fn use_session() -> SessionContext {
    use_context::<SessionContext>()
        .expect("SessionContext not found. Make sure to wrap your component with SessionProvider")
}

/// Hook to check if authenticated
#[hook]
pub fn use_is_authenticated() -> bool {
    let context = use_session();
    context.session.is_authenticated
}
