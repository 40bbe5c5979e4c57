use std::sync::Arc;

use petstore_server::{mount, router, serve, InMemoryPetstore, ServerConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "petstore_server=info,petstore_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let listener = TcpListener::bind(config.addr()).await?;
    info!(addr = %listener.local_addr()?, base_path = %config.base_path, "listening");

    let app = mount(router(Arc::new(InMemoryPetstore::new())), &config.base_path);
    serve(listener, app).await?;
    Ok(())
}
