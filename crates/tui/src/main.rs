mod app;

use std::{
    fs::{self, OpenOptions},
    sync::Arc,
};

use anyhow::{Context, Result};
use armory_core::{
    config::{self, AppConfig},
    AdminServer, AdminService, CatalogDocument, CatalogStore, FileUpdateSource,
};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let document = CatalogDocument::load(&config.catalog_path).with_context(|| {
        format!(
            "cannot open the store without a catalog at {}",
            config.catalog_path.display()
        )
    })?;
    let store = CatalogStore::from_document(document);
    info!(items = store.len(), "Catalog ready");

    let (admin_tx, admin_rx) = mpsc::channel(8);
    let source = Arc::new(FileUpdateSource::new(&config.update_path));
    let service = AdminService::new(store.clone(), source).with_events(admin_tx);
    let server = AdminServer::bind(config.admin.socket_addr()?, service)
        .await?
        .with_read_timeout(config.admin.read_timeout());
    let admin = server.handle();
    let admin_task = tokio::spawn(async move {
        if let Err(err) = server.run().await {
            error!("Admin service error: {err:#}");
        }
    });

    let mut app = app::StoreApp::new(store);
    app.attach_admin(admin_rx);
    let result = app.run().await;

    admin.shutdown();
    if let Err(err) = admin_task.await {
        error!(?err, "Admin service task failed");
    }
    result
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("armory.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout belongs to the terminal UI.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
