use catalog_graph::{router, AppState, CatalogDb, Config};
use clap::Parser;
use dotenvy::dotenv;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();

    // Metrics get their own listener so the API keeps a single route.
    if let Some(addr) = config.metrics_addr()? {
        PrometheusBuilder::new().with_http_listener(addr).install()?;
        info!("metrics on {}", addr);
    }

    let db = CatalogDb::new(config.database_url(), config.table.clone());
    info!(table = db.table(), "catalog configured");
    let app = router(AppState { db });

    let addr = config.listen_addr()?;
    info!("listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
