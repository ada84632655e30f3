use axum::http::{HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use supportdesk_server::notify::Dispatcher;
use supportdesk_server::services::staff;
use supportdesk_server::tracker::{IssueTracker, JiraClient};
use supportdesk_server::{open_database, routes, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "supportdesk_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Supportdesk Server...");

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Environment: {}, Server: {}",
        config.environment,
        config.server_address()
    );

    let db = open_database(&config.database_path)?;

    if let Some(admin) = &config.bootstrap_admin {
        let created = staff::ensure_admin(
            &db,
            admin,
            &config.password_pepper,
            chrono::Utc::now().timestamp(),
        )?;
        if created {
            tracing::info!("Bootstrap admin {} created", admin.email);
        }
    }

    let notifier = Dispatcher::from_config(&config.mail)?;

    let tracker: Option<Arc<dyn IssueTracker>> = match config.jira.clone() {
        Some(jira) => {
            tracing::info!("Mirroring issues to Jira project {}", jira.project_key);
            Some(Arc::new(JiraClient::new(jira)?))
        }
        None => {
            tracing::warn!("Jira not configured, issues will only be stored locally");
            None
        }
    };

    // Configure CORS
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let addr: SocketAddr = config.server_address().parse()?;
    let state = AppState::new(db, config, notifier, tracker);

    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
