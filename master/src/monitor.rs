use crate::state::Coordinator;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    /// Cada cuánto se revisa el ledger
    pub interval: Duration,
    /// Edad máxima de una tarea en vuelo antes de reencolarla
    pub task_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            task_timeout: Duration::from_secs(30),
        }
    }
}

/// Loop de tolerancia a fallos:
/// - cada `interval` revisa las tareas en vuelo
/// - reencola las que llevan más de `task_timeout` sin completarse
/// - termina cuando el job llega a Exit
pub async fn run_timeout_monitor(coordinator: Coordinator, config: MonitorConfig) {
    loop {
        sleep(config.interval).await;

        if coordinator.is_done() {
            info!("job terminado, monitor de timeouts detenido");
            return;
        }

        let requeued = coordinator.scan_timeouts(config.task_timeout);
        if requeued > 0 {
            info!("monitor: {} tareas reencoladas por timeout", requeued);
        } else {
            debug!("monitor: sin tareas vencidas");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{intermediate_name, TaskPhase};

    fn config() -> MonitorConfig {
        MonitorConfig::default()
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_task_is_requeued_between_30_and_35_seconds() {
        let coordinator = Coordinator::new(vec!["pg-0.txt".into()], 1);
        let task = coordinator.assign_task("colgado");
        assert_eq!(task.phase, TaskPhase::Map);

        let monitor = tokio::spawn(run_timeout_monitor(coordinator.clone(), config()));

        // los scans de t=5..30 no deben tocarla
        sleep(Duration::from_secs(31)).await;
        let status = coordinator.status();
        assert_eq!(status.in_progress_tasks, 1);
        assert_eq!(status.queued_tasks, 0);

        // el scan de t=35 la reencola
        sleep(Duration::from_secs(5)).await;
        let status = coordinator.status();
        assert_eq!(status.in_progress_tasks, 0);
        assert_eq!(status.idle_tasks, 1);
        assert_eq!(status.queued_tasks, 1);
        assert_eq!(status.requeued_tasks, 1);

        monitor.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn requeued_task_is_completed_by_another_worker() {
        let coordinator = Coordinator::new(vec!["pg-0.txt".into()], 1);
        let _lost = coordinator.assign_task("caido");
        let monitor = tokio::spawn(run_timeout_monitor(coordinator.clone(), config()));

        sleep(Duration::from_secs(36)).await;

        let mut retry = coordinator.assign_task("sano");
        assert_eq!(retry.phase, TaskPhase::Map);
        assert_eq!(retry.task_number, 0);
        retry.intermediates = vec![intermediate_name(0, 0)];
        assert!(coordinator.report_completion(&retry));

        let reduce = coordinator.assign_task("sano");
        assert!(coordinator.report_completion(&reduce));
        assert!(coordinator.is_done());

        // con el job terminado el monitor sale solo
        sleep(Duration::from_secs(6)).await;
        assert!(monitor.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn monitor_stops_once_job_is_done() {
        let coordinator = Coordinator::new(Vec::new(), 1);
        let reduce = coordinator.assign_task("w");
        assert!(coordinator.report_completion(&reduce));

        let monitor = tokio::spawn(run_timeout_monitor(coordinator, config()));
        sleep(Duration::from_secs(6)).await;

        assert!(monitor.is_finished());
    }
}
