use serde::{Deserialize, Serialize};

pub type TaskNumber = u32;

/// Qué debe hacer el worker con la tarea recibida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPhase {
    Map,
    Reduce,
    /// No hay tareas listas todavía: volver a preguntar más tarde.
    Wait,
    /// El job terminó: el worker debe salir.
    Exit,
}

/// Descripción de una unidad de trabajo.
///
/// El master entrega siempre una copia; el worker la devuelve completada
/// (por ejemplo con `intermediates`) al reportar que terminó.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub phase: TaskPhase,

    /// Archivo de entrada (sólo tareas Map)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    pub task_number: TaskNumber,

    /// Cantidad total de particiones de reduce
    pub n_reduce: u32,

    /// Reduce: archivos intermedios a consumir.
    /// Map completado: un archivo por partición, en orden (posición r = partición r).
    #[serde(default)]
    pub intermediates: Vec<String>,
}

impl Task {
    pub fn map(task_number: TaskNumber, input: impl Into<String>, n_reduce: u32) -> Self {
        Self {
            phase: TaskPhase::Map,
            input: Some(input.into()),
            task_number,
            n_reduce,
            intermediates: Vec::new(),
        }
    }

    pub fn reduce(task_number: TaskNumber, intermediates: Vec<String>, n_reduce: u32) -> Self {
        Self {
            phase: TaskPhase::Reduce,
            input: None,
            task_number,
            n_reduce,
            intermediates,
        }
    }

    pub fn wait() -> Self {
        Self::signal(TaskPhase::Wait)
    }

    pub fn exit() -> Self {
        Self::signal(TaskPhase::Exit)
    }

    fn signal(phase: TaskPhase) -> Self {
        Self {
            phase,
            input: None,
            task_number: 0,
            n_reduce: 0,
            intermediates: Vec::new(),
        }
    }

    /// true para Map/Reduce, false para las señales Wait/Exit.
    pub fn is_work(&self) -> bool {
        matches!(self.phase, TaskPhase::Map | TaskPhase::Reduce)
    }
}

/// Par clave/valor emitido por la función map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
