//! Pharmacy storefront API server

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pharma_storefront::api::{self, AppState};
use pharma_storefront::config::AppConfig;
use pharma_storefront::store::{MemoryStore, OrderStore, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    if config.uses_memory_store() {
        tracing::warn!("DATABASE_URL=memory, data will not survive a restart");
        return serve(MemoryStore::new(), &config).await;
    }

    let db = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    serve(PgStore::new(db), &config).await
}

async fn serve<S: OrderStore + 'static>(store: S, config: &AppConfig) -> Result<()> {
    let state = AppState::new(store, &config.public_base_url);
    let app = api::router(state).layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive());

    let address = config.bind_address();
    tracing::info!("pharma-storefront listening on {}", address);
    axum::serve(tokio::net::TcpListener::bind(&address).await?, app).await?;
    Ok(())
}
