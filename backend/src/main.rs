use std::net::SocketAddr;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use toolhub_backend::db::DbConnection;
use toolhub_backend::domain::CreditService;
use toolhub_backend::registry::AppRegistry;
use toolhub_backend::rest::{self, AppState};

// Default location of the app registry file
const REGISTRY_PATH: &str = "apps.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let registry_path =
        std::env::var("TOOLHUB_REGISTRY").unwrap_or_else(|_| REGISTRY_PATH.to_string());
    info!("Loading app registry from {}", registry_path);
    let registry = AppRegistry::load(&registry_path)?;

    info!("Setting up database");
    let db = DbConnection::init().await?;

    let state = AppState::new(CreditService::new(db, registry));

    // CORS setup to allow the dashboard frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:8080".parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = rest::router(state).layer(cors);

    // Start the server
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
