use anyhow::{Context, Result};
use common::TaskPhase;
use std::{sync::Arc, time::Duration};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::client::CoordinatorRpc;
use crate::executor::{execute_task, Application};
use crate::storage::LocalStorage;

/// Qué hizo el worker antes de recibir Exit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSummary {
    pub maps: u32,
    pub reduces: u32,
    /// Reportes que el master descartó (tarea ya completada por otro)
    pub discarded: u32,
    pub waits: u32,
}

/// Loop principal del worker:
/// - pide tarea al master
/// - Map/Reduce: la ejecuta en un hilo de bloqueo y reporta
/// - Wait: duerme `wait_interval` y vuelve a pedir
/// - Exit: termina
///
/// Cualquier error (RPC agotado, I/O local) corta el loop sin reportar nada:
/// el monitor del master va a reasignar la tarea.
pub async fn run_worker<C>(
    rpc: &C,
    storage: Arc<LocalStorage>,
    app: Application,
    wait_interval: Duration,
) -> Result<WorkerSummary>
where
    C: CoordinatorRpc + ?Sized,
{
    let mut summary = WorkerSummary::default();

    loop {
        let task = rpc.assign_task().await?;

        match task.phase {
            TaskPhase::Map | TaskPhase::Reduce => {
                info!(
                    "tengo tarea {:?} {} (input={:?}, {} intermedios)",
                    task.phase,
                    task.task_number,
                    task.input,
                    task.intermediates.len()
                );

                let phase = task.phase;
                let number = task.task_number;
                let storage = storage.clone();
                let done = tokio::task::spawn_blocking(move || execute_task(&storage, &app, &task))
                    .await
                    .context("panic o join error ejecutando la tarea")?
                    .with_context(|| format!("falló la tarea {:?} {}", phase, number))?;

                let accepted = rpc.report_completion(&done).await?;
                if accepted {
                    info!("terminé tarea {:?} {}", phase, number);
                } else {
                    info!(
                        "el master descartó el reporte de {:?} {} (ya estaba completada)",
                        phase, number
                    );
                    summary.discarded += 1;
                }

                match phase {
                    TaskPhase::Map => summary.maps += 1,
                    _ => summary.reduces += 1,
                }
            }
            TaskPhase::Wait => {
                debug!("no hay tareas, esperando {:?}...", wait_interval);
                summary.waits += 1;
                sleep(wait_interval).await;
            }
            TaskPhase::Exit => {
                info!(
                    "job terminado: {} maps, {} reduces ejecutados",
                    summary.maps, summary.reduces
                );
                return Ok(summary);
            }
        }
    }
}
