use std::process::ExitCode;
use std::sync::Arc;

use mebel_config::AppConfig;
use mebel_server::{router, AppState, CatalogStore};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::discover() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("mebel-server: {err}");
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let prices = config.pricing.table();
    let catalog = match &config.server.catalog_path {
        Some(path) => CatalogStore::load(path, prices),
        None => CatalogStore::bundled(prices),
    };
    let catalog = match catalog {
        Ok(catalog) => catalog,
        Err(err) => {
            error!(error = %err, "cannot load catalog");
            return ExitCode::FAILURE;
        }
    };
    info!(items = catalog.items().len(), "catalog loaded");

    let state = AppState::spawn(Arc::new(catalog), config.server.save_queue);
    let app = router(state);

    let addr = config.server.addr;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(%addr, error = %err, "cannot bind");
            return ExitCode::FAILURE;
        }
    };
    info!("listening on http://{addr}");
    if let Err(err) = axum::serve(listener, app).await {
        error!(error = %err, "server stopped");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
