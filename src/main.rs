use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nexsys_api::{
    config::Config,
    db::{self, PoolRegistry},
    services::{encryption::master_key_from_env_value, tenancy::TenantRouter},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let registry = Arc::new(PoolRegistry::new(config.database.clone()));
    db::bootstrap(&registry).await?;
    info!("Control database connected");

    let state = AppState::new(
        TenantRouter::new(registry),
        master_key_from_env_value(&config.encryption_key),
    );
    let app = nexsys_api::app(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("nexsys API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
