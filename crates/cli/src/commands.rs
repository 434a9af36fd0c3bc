//! CLI commands

use anyhow::{Context as _, Result, anyhow, bail};
use clap::{Subcommand, ValueEnum};
use notify::{RecursiveMode, Watcher};
use panaderia_core::validation::{
    PasswordStrength, RegisterForm, validate_email, validate_login, validate_password,
    validate_password_confirmation, validate_register,
};
use panaderia_core::{FileStorage, SessionStore};
use panaderia_http::client::field_errors::{
    FieldErrorParser, FieldErrors, PASSWORD_RESET_FIELDS, PRODUCT_TYPE_FIELDS, login_errors,
};
use panaderia_http::search::LiveSearch;
use panaderia_http::types::{
    LoginRequest, ProductTypeInput, ProductTypeQuery, ProductTypeStatus, RegisterRequest,
    ResetPasswordRequest,
};
use panaderia_http::{ClientError, FetchClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::config::Settings;
use crate::output;
use crate::state_dir::StateDir;

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        email: String,

        /// Keep the session across restarts
        #[arg(long)]
        remember: bool,

        /// Password (prompted when omitted)
        #[arg(long, env = "PANADERIA_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account
    Register {
        /// Full name
        name: String,
        email: String,

        /// Password (prompted when omitted)
        #[arg(long, env = "PANADERIA_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the current session
    Status,

    /// Exchange the refresh token for a new access token
    Refresh,

    /// Password recovery
    Password {
        #[command(subcommand)]
        command: PasswordCommands,
    },

    /// Manage product types
    Tipos {
        #[command(subcommand)]
        command: TiposCommands,
    },

    /// Inspect the stored session
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Manage the settings file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum PasswordCommands {
    /// Email a reset link
    Forgot { email: String },

    /// Check a reset token
    Validate { token: String },

    /// Set a new password with a reset token
    Reset {
        email: String,
        token: String,

        /// New password (prompted when omitted)
        #[arg(long, env = "PANADERIA_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum EstadoArg {
    Activo,
    Inactivo,
}

impl From<EstadoArg> for ProductTypeStatus {
    fn from(estado: EstadoArg) -> Self {
        match estado {
            EstadoArg::Activo => Self::Activo,
            EstadoArg::Inactivo => Self::Inactivo,
        }
    }
}

#[derive(Subcommand)]
pub enum TiposCommands {
    /// List product types
    List {
        /// Filter by name
        #[arg(long)]
        search: Option<String>,

        /// Filter by state
        #[arg(long, value_enum)]
        estado: Option<EstadoArg>,
    },

    /// Show one product type
    Get { id: i64 },

    /// Create a product type
    Create {
        nombre: String,

        #[arg(long, default_value = "")]
        descripcion: String,

        /// Create it deactivated
        #[arg(long)]
        inactive: bool,
    },

    /// Replace a product type
    Update {
        id: i64,
        nombre: String,

        #[arg(long, default_value = "")]
        descripcion: String,

        #[arg(long)]
        inactive: bool,
    },

    /// Reactivate a product type and its products
    Activate { id: i64 },

    /// Deactivate a product type and its products
    Deactivate { id: i64 },

    /// Delete a product type
    Delete { id: i64 },

    /// Search interactively, one term per line on stdin
    Search,
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Print the stored session as JSON, tokens redacted
    Show,

    /// Follow changes made by other processes until interrupted
    Watch,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a settings file with the defaults
    Init {
        /// Output file path (defaults to <data dir>/config.toml)
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective settings
    Show,
}

/// Everything a command needs to run
pub struct Context {
    pub state_dir: StateDir,
    pub settings: Settings,
    timeout: Option<Duration>,
}

impl Context {
    pub fn new(
        state_dir: StateDir,
        api_base: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut settings = Settings::load(&state_dir.settings_file())?;
        if let Some(api_base) = api_base {
            settings.api_base = api_base;
        }
        Ok(Self {
            state_dir,
            settings,
            timeout,
        })
    }

    /// Session store over the durable and ephemeral session files
    pub fn store(&self) -> Arc<SessionStore> {
        Arc::new(SessionStore::new(
            FileStorage::new(self.state_dir.durable_session_file()),
            FileStorage::new(self.state_dir.ephemeral_session_file()),
        ))
    }

    /// Client authenticating with `store`'s token
    pub fn client(&self, store: Arc<SessionStore>) -> Result<FetchClient> {
        let mut builder = FetchClient::builder()
            .config(self.settings.api_config()?)
            .token_source(store);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}

impl Commands {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        match self {
            Commands::Login {
                email,
                remember,
                password,
            } => login(ctx, &email, remember || ctx.settings.remember, password).await,
            Commands::Register {
                name,
                email,
                password,
            } => register(ctx, &name, &email, password).await,
            Commands::Logout => {
                let store = ctx.store();
                store.logout();
                println!("Signed out");
                Ok(())
            }
            Commands::Status => {
                let store = ctx.store();
                output::print_session(&store.session(), store.is_persistent());
                Ok(())
            }
            Commands::Refresh => refresh(ctx).await,
            Commands::Password { command } => command.execute(ctx).await,
            Commands::Tipos { command } => command.execute(ctx).await,
            Commands::Session { command } => command.execute(ctx).await,
            Commands::Config { command } => command.execute(ctx),
        }
    }
}

/// Read a value from the flag/env, or prompt for it on stdin
async fn secret_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }
    eprint!("{label}: ");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Print server-side field errors and turn them into a command failure
fn reject(errors: &FieldErrors, error: ClientError) -> anyhow::Error {
    if errors.is_empty() {
        return anyhow!(error);
    }
    output::print_field_errors(errors);
    anyhow!(error).context("The server rejected the request")
}

fn reject_form(errors: &panaderia_core::validation::FormErrors) -> anyhow::Error {
    for (field, message) in errors {
        eprintln!("  {field}: {message}");
    }
    anyhow!("Please fix the highlighted fields")
}

async fn login(ctx: &Context, email: &str, remember: bool, password: Option<String>) -> Result<()> {
    let password = secret_or_prompt(password, "Password").await?;
    let errors = validate_login(email, &password);
    if !errors.is_empty() {
        return Err(reject_form(&errors));
    }

    let store = ctx.store();
    let client = ctx.client(store.clone())?;
    let request = LoginRequest::new(email, password);

    match client.sign_in(&store, &request, remember).await {
        Ok(session) => {
            println!("Sesion iniciada.");
            output::print_session(&session, store.is_persistent());
            Ok(())
        }
        Err(e) => Err(reject(&login_errors(&e), e)),
    }
}

async fn register(ctx: &Context, name: &str, email: &str, password: Option<String>) -> Result<()> {
    let prompted = password.is_none();
    let password = secret_or_prompt(password, "Password").await?;
    let confirmation = if prompted {
        secret_or_prompt(None, "Confirm password").await?
    } else {
        password.clone()
    };

    let form = RegisterForm {
        name: name.to_string(),
        email: email.to_string(),
        password: password.clone(),
        confirm_password: confirmation.clone(),
    };
    let errors = validate_register(&form);
    if !errors.is_empty() {
        return Err(reject_form(&errors));
    }
    info!(strength = PasswordStrength::of(&password).label(), "Registering account");

    let client = ctx.client(ctx.store())?;
    let request = RegisterRequest::new(name, email, password, confirmation);
    match client.register(&request).await {
        Ok(response) => {
            println!(
                "{}",
                response.message.as_deref().unwrap_or("Registro exitoso.")
            );
            println!("Sign in with: panaderia login {}", request.email);
            Ok(())
        }
        Err(e) => Err(reject(&FieldErrorParser::register().parse(&e), e)),
    }
}

async fn refresh(ctx: &Context) -> Result<()> {
    let store = ctx.store();
    let client = ctx.client(store.clone())?;
    match client.refresh_session(&store).await {
        Ok(Some(session)) => {
            output::print_session(&session, store.is_persistent());
            Ok(())
        }
        Ok(None) => bail!("No refresh token stored; sign in again"),
        Err(e) if e.is_auth_expired() => {
            store.logout();
            bail!("Session expired; sign in again")
        }
        Err(e) => Err(e.into()),
    }
}

impl PasswordCommands {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let client = ctx.client(ctx.store())?;
        let parser = FieldErrorParser::new(PASSWORD_RESET_FIELDS);

        let response = match self {
            PasswordCommands::Forgot { email } => {
                if let Some(message) = validate_email(&email) {
                    bail!(message);
                }
                client.request_password_reset(&email).await
            }
            PasswordCommands::Validate { token } => client.validate_reset_token(&token).await,
            PasswordCommands::Reset {
                email,
                token,
                password,
            } => {
                let prompted = password.is_none();
                let password = secret_or_prompt(password, "New password").await?;
                let confirmation = if prompted {
                    secret_or_prompt(None, "Confirm password").await?
                } else {
                    password.clone()
                };
                if let Some(message) = validate_password(&password)
                    .or_else(|| validate_password_confirmation(&password, &confirmation))
                {
                    bail!(message);
                }
                let request = ResetPasswordRequest::new(&email, token, password, confirmation);
                client.confirm_password_reset(&request).await
            }
        };

        match response {
            Ok(response) => {
                println!("{}", response.text().unwrap_or("OK"));
                Ok(())
            }
            Err(e) => Err(reject(&parser.parse(&e), e)),
        }
    }
}

impl TiposCommands {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let store = ctx.store();
        if !store.is_authenticated() {
            bail!("Not signed in; run `panaderia login` first");
        }
        let client = ctx.client(store)?;
        let parser = FieldErrorParser::new(PRODUCT_TYPE_FIELDS);

        let result = match self {
            TiposCommands::List { search, estado } => {
                let query = ProductTypeQuery {
                    search,
                    estado: estado.map(Into::into),
                };
                client.list_product_types(&query, None).await.map(|page| {
                    output::print_product_types(&page.results, page.message.as_deref());
                    if page.count > page.results.len() {
                        println!("({} of {})", page.results.len(), page.count);
                    }
                })
            }
            TiposCommands::Get { id } => client.get_product_type(id).await.map(|item| {
                output::print_product_types(std::slice::from_ref(&item), None);
            }),
            TiposCommands::Create {
                nombre,
                descripcion,
                inactive,
            } => {
                let input = ProductTypeInput::new(&nombre, &descripcion, !inactive);
                client.create_product_type(&input).await.map(|created| {
                    println!(
                        "{} (id {})",
                        created.message.as_deref().unwrap_or("Creado"),
                        created.id
                    );
                })
            }
            TiposCommands::Update {
                id,
                nombre,
                descripcion,
                inactive,
            } => {
                let input = ProductTypeInput::new(&nombre, &descripcion, !inactive);
                client
                    .update_product_type(id, &input)
                    .await
                    .map(|response| println!("{}", response.text().unwrap_or("OK")))
            }
            TiposCommands::Activate { id } => client
                .set_product_type_active(id, true)
                .await
                .map(|response| println!("{}", response.text().unwrap_or("OK"))),
            TiposCommands::Deactivate { id } => client
                .set_product_type_active(id, false)
                .await
                .map(|response| println!("{}", response.text().unwrap_or("OK"))),
            TiposCommands::Delete { id } => client
                .delete_product_type(id)
                .await
                .map(|()| println!("Tipo de producto {id} eliminado.")),
            TiposCommands::Search => return live_search(client, ctx).await,
        };

        result.map_err(|e| reject(&parser.parse(&e), e))
    }
}

/// Feed stdin lines into a live search and print every transition
async fn live_search(client: FetchClient, ctx: &Context) -> Result<()> {
    let search = LiveSearch::product_types(client, ctx.settings.search_policy());
    let mut states = search.subscribe();

    let printer = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            if let Some(line) = output::search_line(&state) {
                println!("{line}");
            }
        }
    });

    eprintln!("Type a search term and press Enter (Ctrl-D to quit)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last = None;
    while let Some(line) = lines.next_line().await? {
        let term = line.trim().to_string();
        debug!(%term, "Search input");
        search.update(term.clone());
        last = Some(term);
    }

    if let Some(term) = last {
        let mut states = search.subscribe();
        let policy = search.policy();
        let settle = policy.debounce + policy.retry_delay + Duration::from_secs(30);
        let done = states.wait_for(|s| s.term == term && !s.loading);
        if tokio::time::timeout(settle, done).await.is_err() {
            debug!("Gave up waiting for the last search");
        }
    }

    drop(search);
    printer.abort();
    Ok(())
}

impl SessionCommands {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let store = ctx.store();
        match self {
            SessionCommands::Show => {
                let session = store.session();
                let redacted = serde_json::json!({
                    "is_authenticated": session.is_authenticated,
                    "remember": session.remember,
                    "has_refresh_token": session.refresh_token.is_some(),
                    "user": session.user,
                });
                println!("{}", serde_json::to_string_pretty(&redacted)?);
                Ok(())
            }
            SessionCommands::Watch => watch_session(ctx, &store).await,
        }
    }
}

/// Re-read the session whenever either session file changes
async fn watch_session(ctx: &Context, store: &SessionStore) -> Result<()> {
    let durable = ctx.state_dir.durable_session_file();
    let ephemeral = ctx.state_dir.ephemeral_session_file();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
        // Receiver gone means the command is shutting down
        let _ = tx.send(event);
    })?;

    for file in [&durable, &ephemeral] {
        let dir = file
            .parent()
            .ok_or_else(|| anyhow!("{} has no parent directory", file.display()))?;
        std::fs::create_dir_all(dir)?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
    }

    output::print_session(&store.session(), store.is_persistent());
    eprintln!("Watching for session changes (Ctrl-C to stop)");

    let mut changes = store.subscribe();
    changes.mark_unchanged();

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                let event = event?;
                let relevant = event
                    .paths
                    .iter()
                    .any(|path| path == &durable || path == &ephemeral);
                if relevant {
                    debug!(kind = ?event.kind, "Session file changed");
                    store.handle_storage_event(None);
                }
            }
            Ok(()) = changes.changed() => {
                let session = changes.borrow_and_update().clone();
                output::print_session(&session, store.is_persistent());
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

impl ConfigCommands {
    pub fn execute(self, ctx: &Context) -> Result<()> {
        match self {
            ConfigCommands::Init { output, force } => {
                let path = output.unwrap_or_else(|| ctx.state_dir.settings_file());
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                Settings::default().save(&path)?;
                println!("Generated settings at: {}", path.display());
                Ok(())
            }
            ConfigCommands::Show => {
                print!("{}", toml::to_string_pretty(&ctx.settings)?);
                Ok(())
            }
        }
    }
}
