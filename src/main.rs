//! HP Grievance Portal Backend
//!
//! REST backend for the citizen grievance portal: grievance lifecycle,
//! per-citizen record store over SQLite, navigation guard and the HP Assist
//! chat assistant.

mod api;
mod assistant;
mod auth;
mod config;
mod db;
mod errors;
mod lifecycle;
mod models;
mod navigation;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use assistant::AssistantHub;
use auth::{Authenticator, DemoOtpAuthenticator};
use config::Config;
use db::{IdentityStore, KvStore, RecordStore, SqliteKv};
use models::Identity;
use navigation::NavigationGuard;

/// The single active identity and what the host is showing.
#[derive(Debug, Default)]
pub struct Host {
    pub identity: Option<Identity>,
    pub navigation: NavigationGuard,
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub records: RecordStore,
    pub identities: IdentityStore,
    pub authenticator: Arc<dyn Authenticator>,
    pub assistant: AssistantHub,
    pub host: Arc<Mutex<Host>>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the stores over `kv` and restore the identity saved by a
    /// previous run.
    pub async fn restore(kv: Arc<dyn KvStore>, config: Config) -> Result<Self, errors::AppError> {
        let identities = IdentityStore::new(kv.clone());
        let identity = identities.restore().await?;
        if let Some(identity) = &identity {
            tracing::info!("Restored session for {}", identity.id);
        }

        Ok(Self {
            records: RecordStore::new(kv),
            identities,
            authenticator: Arc::new(DemoOtpAuthenticator::default()),
            assistant: AssistantHub::new(config.assistant_delay),
            host: Arc::new(Mutex::new(Host {
                identity,
                navigation: NavigationGuard::new(),
            })),
            config: Arc::new(config),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting HP Grievance Portal Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Assistant reply delay: {:?}", config.assistant_delay);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (HP_API_PSK). Authentication is disabled!");
    }

    let pool = db::init_database(&config.db_path).await?;
    let kv: Arc<dyn KvStore> = Arc::new(SqliteKv::new(pool));

    let bind_addr = config.bind_addr;
    let state = AppState::restore(kv, config).await?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        .route("/reference", get(api::get_reference))
        // Session and sign-in
        .route("/session", get(api::get_session))
        .route("/auth/otp", post(api::request_otp))
        .route("/auth/verify", post(api::verify_otp))
        .route("/auth/officer", post(api::officer_login))
        .route("/auth/cancel", post(api::cancel_authentication))
        .route("/auth/logout", post(api::logout))
        .route("/navigation", post(api::navigate))
        // Grievances
        .route(
            "/grievances",
            get(api::list_grievances).post(api::create_grievance),
        )
        .route("/grievances/stats", get(api::grievance_stats))
        .route("/grievances/{id}", get(api::get_grievance))
        .route("/grievances/{id}/replies", post(api::add_reply))
        .route("/grievances/{id}/transitions", post(api::transition_grievance))
        // HP Assist
        .route("/assistant/sessions", post(api::open_assistant))
        .route(
            "/assistant/sessions/{id}",
            get(api::get_assistant).delete(api::close_assistant),
        )
        .route("/assistant/sessions/{id}/select", post(api::select_option))
        .route("/assistant/sessions/{id}/input", post(api::submit_input))
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
