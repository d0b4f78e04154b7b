use gosearch_proxy::config::Config;
use gosearch_proxy::dispatch::install::Installer;
use gosearch_proxy::server::{AppState, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    dotenvy::dotenv().ok();

    tracing::info!("gosearch-proxy starting");

    let config = Config::from_env();

    // Install failure is not fatal: requests fail individually until the
    // binary shows up.
    if config.install.enabled {
        let installer = Installer::from(&config.install);
        if let Err(e) = installer.install_with_retry(config.install.retry_delay).await {
            tracing::error!("retry install failed: {e}; continuing, searches may fail until gosearch is available");
        }
    } else {
        tracing::info!("GOSEARCH_INSTALL disabled — skipping install");
    }

    let addr = config.listen_addr();
    let app = router(AppState::from_config(&config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("gosearch proxy listening on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("gosearch-proxy shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
