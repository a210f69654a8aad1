use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::Task;

pub type WorkerId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAssignmentRequest {
    pub worker_id: WorkerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAssignmentResponse {
    /// Siempre hay respuesta: una tarea real o una señal Wait/Exit.
    pub task: Task,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCompleteRequest {
    pub worker_id: WorkerId,
    pub task: Task,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCompleteResponse {
    /// false si el reporte se descartó (duplicado, fase vieja, etc.)
    pub accepted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoordinatorPhase {
    Map,
    Reduce,
    Exit,
}

/// Foto del estado del master, para el driver del job y para debug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorStatus {
    pub phase: CoordinatorPhase,
    pub done: bool,
    pub n_reduce: u32,

    /// -------- Conteos de la fase actual --------
    pub total_tasks: u32,
    pub idle_tasks: u32,
    pub in_progress_tasks: u32,
    pub completed_tasks: u32,
    pub queued_tasks: u32,

    /// Veces que el monitor reencoló una tarea (todo el job)
    pub requeued_tasks: u64,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}
