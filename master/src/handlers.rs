use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use common::{
    CoordinatorStatus, TaskAssignmentRequest, TaskAssignmentResponse, TaskCompleteRequest,
    TaskCompleteResponse,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::state::Coordinator;

pub fn build_router(coordinator: Coordinator) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/status", get(status))
        .route("/api/v1/tasks/next", post(assign_task))
        .route("/api/v1/tasks/complete", post(complete_task))
        .layer(TraceLayer::new_for_http())
        .with_state(coordinator)
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

// Estado del job; `done` es lo que consulta el driver
async fn status(State(coordinator): State<Coordinator>) -> Json<CoordinatorStatus> {
    Json(coordinator.status())
}

// Asigna la siguiente tarea en cola, o Wait / Exit
async fn assign_task(
    State(coordinator): State<Coordinator>,
    Json(req): Json<TaskAssignmentRequest>,
) -> Json<TaskAssignmentResponse> {
    let task = coordinator.assign_task(&req.worker_id);
    Json(TaskAssignmentResponse { task })
}

// Worker reporta que terminó una tarea
async fn complete_task(
    State(coordinator): State<Coordinator>,
    Json(req): Json<TaskCompleteRequest>,
) -> Json<TaskCompleteResponse> {
    let accepted = coordinator.report_completion(&req.task);
    if !accepted {
        info!(
            "reporte del worker {} para tarea {:?} {} descartado",
            req.worker_id, req.task.phase, req.task.task_number
        );
    }
    Json(TaskCompleteResponse { accepted })
}
