use std::sync::Arc;

use falcon::config::Config;
use falcon::server::{self, ServiceContext, Shutdown};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(cfg.logging.max_level()?)
        .init();

    let shutdown = Shutdown::new();
    let ctx = Arc::new(ServiceContext::from_config(&cfg, shutdown.clone()));

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            shutdown.trigger();
        }
    });

    server::listener::run(&cfg, ctx).await
}
