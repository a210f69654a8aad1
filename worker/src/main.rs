use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use worker::{run_worker, Application, HttpCoordinatorClient, LocalStorage, WorkerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("worker=debug,reqwest=info")),
        )
        .init();

    let config = WorkerConfig::from_env();

    // Nombre de host + pid (sólo para logs del master)
    let hostname = hostname::get()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let worker_id = format!("{}-{}", hostname, std::process::id());

    let app = Application::by_name(&config.app)
        .with_context(|| format!("aplicación desconocida: {}", config.app))?;
    let storage = LocalStorage::new(&config.work_dir).with_context(|| {
        format!(
            "no se pudo preparar el directorio de trabajo {}",
            config.work_dir.display()
        )
    })?;

    info!(
        "worker {} ({}) contra {}, publicando en {}",
        worker_id,
        app.name,
        config.master_url,
        config.work_dir.display()
    );

    let rpc = HttpCoordinatorClient::new(&config.master_url, worker_id, config.retry);
    match run_worker(&rpc, Arc::new(storage), app, config.wait_interval).await {
        Ok(summary) => {
            info!("worker terminado: {:?}", summary);
            Ok(())
        }
        Err(e) => {
            error!("worker abortado: {:#}", e);
            Err(e)
        }
    }
}
