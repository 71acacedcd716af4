use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_admin::api::router;
use campus_admin::clock::SystemClock;
use campus_admin::config::{AppConfig, StoreBackend};
use campus_admin::firestore::{FirestoreClient, FirestoreConfig};
use campus_admin::services::FixedCredentialAuthenticator;
use campus_admin::state::AppState;
use campus_admin::store::{DocumentStore, MemoryDocumentStore, SqliteDocumentStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "campus_admin=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Sqlite => Arc::new(SqliteDocumentStore::connect(&config.database_url).await?),
        StoreBackend::Firestore => Arc::new(FirestoreClient::new(FirestoreConfig::new_from_env()?)?),
        StoreBackend::Memory => Arc::new(MemoryDocumentStore::new()),
    };
    info!("using {:?} document store", config.store_backend);

    let clock = Arc::new(SystemClock);
    let state = AppState {
        store,
        clock: clock.clone(),
        authenticator: Arc::new(FixedCredentialAuthenticator::with_defaults(clock)),
        login_delay: config.login_delay,
    };

    let app = router(state);

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
