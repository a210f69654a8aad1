use anyhow::{Context, Result};
use master::{build_router, collect_inputs, run_timeout_monitor, Coordinator, MasterConfig};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("master=debug,tower_http=info")),
        )
        .init();

    let config = MasterConfig::from_env()?;
    let inputs = collect_inputs(&config.input_glob)?;
    info!(
        "{} archivos de entrada para {} ({} reducers)",
        inputs.len(),
        config.input_glob,
        config.n_reduce
    );

    let coordinator = Coordinator::new(inputs, config.n_reduce);

    // monitor de timeouts en segundo plano
    tokio::spawn(run_timeout_monitor(coordinator.clone(), config.monitor));

    let app = build_router(coordinator.clone());
    let listener = TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("no se pudo escuchar en {}", config.addr))?;
    info!("master escuchando en {}", listener.local_addr()?);

    let grace = config.shutdown_grace;
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_until_done(coordinator, grace))
        .await
        .context("error sirviendo HTTP")?;

    info!("master terminado");
    Ok(())
}

/// Se resuelve cuando el job terminó (más el período de gracia) o con Ctrl-C.
async fn wait_until_done(coordinator: Coordinator, grace: Duration) {
    let done = async {
        while !coordinator.is_done() {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        info!("job terminado, cerrando en {:?}", grace);
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        _ = done => {}
        _ = tokio::signal::ctrl_c() => info!("Ctrl-C recibido, cerrando"),
    }
}
