use anyhow::Context;
use eutils_proxy::config::AppConfig;
use eutils_proxy::server::build_router;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    let addr = config.effective_bind_addr().to_string();
    let router = build_router(&config);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, upstream = config.effective_base_url(), "eutils-proxy listening");

    axum::serve(listener, router)
        .await
        .context("server error")?;
    Ok(())
}
