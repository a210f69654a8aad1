// master/src/state.rs

use chrono::{DateTime, Utc};
use common::{CoordinatorPhase, CoordinatorStatus, Task, TaskNumber, TaskPhase, WorkerId};
use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Idle,
    InProgress,
    Completed,
}

/// Registro de scheduling de una tarea de la fase actual.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub status: TaskStatus,
    pub assigned_at: Option<Instant>,
    // sólo para logs
    pub assigned_to: Option<WorkerId>,
    pub task: Task,
}

impl LedgerEntry {
    fn idle(task: Task) -> Self {
        Self {
            status: TaskStatus::Idle,
            assigned_at: None,
            assigned_to: None,
            task,
        }
    }
}

/// Todo el estado mutable del master. Sólo se toca con el lock de `Coordinator`.
#[derive(Debug)]
struct Scheduler {
    phase: CoordinatorPhase,
    n_reduce: u32,
    // tareas listas para asignar (por número, dentro de la fase actual)
    queue: VecDeque<TaskNumber>,
    ledger: BTreeMap<TaskNumber, LedgerEntry>,
    // un slot por partición de reduce
    intermediates: Vec<Vec<String>>,
    requeued: u64,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl Scheduler {
    fn new(inputs: Vec<String>, n_reduce: u32) -> Self {
        let n_reduce = n_reduce.max(1);
        let mut queue = VecDeque::with_capacity(inputs.len().max(n_reduce as usize));
        let mut ledger = BTreeMap::new();

        for (idx, input) in inputs.into_iter().enumerate() {
            let number = idx as TaskNumber;
            ledger.insert(number, LedgerEntry::idle(Task::map(number, input, n_reduce)));
            queue.push_back(number);
        }

        let mut scheduler = Self {
            phase: CoordinatorPhase::Map,
            n_reduce,
            queue,
            ledger,
            intermediates: vec![Vec::new(); n_reduce as usize],
            requeued: 0,
            started_at: Utc::now(),
            finished_at: None,
        };
        info!(
            "job creado: {} tareas map, {} particiones de reduce",
            scheduler.ledger.len(),
            n_reduce
        );

        // sin entradas la fase Map ya está completa
        scheduler.advance_if_complete();
        scheduler
    }

    fn assign(&mut self, worker_id: &str, now: Instant) -> Task {
        while let Some(number) = self.queue.pop_front() {
            let Some(entry) = self.ledger.get_mut(&number) else {
                continue;
            };

            // Un rezagado pudo completarla mientras esperaba reasignación.
            if entry.status != TaskStatus::Idle {
                debug!(
                    "tarea {:?} {} ya no está idle ({:?}), se saltea",
                    self.phase, number, entry.status
                );
                continue;
            }

            entry.status = TaskStatus::InProgress;
            entry.assigned_at = Some(now);
            entry.assigned_to = Some(worker_id.to_string());

            info!(
                "asignando tarea {:?} {} al worker {} ({} en cola)",
                entry.task.phase,
                number,
                worker_id,
                self.queue.len()
            );
            return entry.task.clone();
        }

        if self.phase == CoordinatorPhase::Exit {
            Task::exit()
        } else {
            debug!("worker {} pidió tarea pero no hay tareas en cola", worker_id);
            Task::wait()
        }
    }

    fn complete(&mut self, task: &Task) -> bool {
        let matches_phase = matches!(
            (self.phase, task.phase),
            (CoordinatorPhase::Map, TaskPhase::Map) | (CoordinatorPhase::Reduce, TaskPhase::Reduce)
        );
        if !matches_phase {
            info!(
                "descartando reporte de tarea {:?} {}: la fase actual es {:?}",
                task.phase, task.task_number, self.phase
            );
            return false;
        }

        let n_reduce = self.n_reduce as usize;
        let Some(entry) = self.ledger.get_mut(&task.task_number) else {
            warn!(
                "descartando reporte de tarea {:?} {} desconocida",
                task.phase, task.task_number
            );
            return false;
        };

        if entry.status == TaskStatus::Completed {
            info!(
                "descartando reporte duplicado de tarea {:?} {}",
                task.phase, task.task_number
            );
            return false;
        }

        if task.phase == TaskPhase::Map && task.intermediates.len() != n_reduce {
            warn!(
                "descartando tarea map {}: trae {} intermedios, se esperaban {}",
                task.task_number,
                task.intermediates.len(),
                n_reduce
            );
            return false;
        }

        entry.status = TaskStatus::Completed;
        entry.assigned_at = None;

        if task.phase == TaskPhase::Map {
            for (slot, location) in self.intermediates.iter_mut().zip(&task.intermediates) {
                slot.push(location.clone());
            }
        }

        info!("tarea {:?} {} completada", task.phase, task.task_number);
        self.advance_if_complete();
        true
    }

    fn all_completed(&self) -> bool {
        self.ledger
            .values()
            .all(|entry| entry.status == TaskStatus::Completed)
    }

    fn advance_if_complete(&mut self) {
        if !self.all_completed() {
            return;
        }

        match self.phase {
            CoordinatorPhase::Map => self.start_reduce_phase(),
            CoordinatorPhase::Reduce => {
                self.phase = CoordinatorPhase::Exit;
                self.finished_at = Some(Utc::now());
                info!("todas las tareas reduce completadas, job terminado");
            }
            CoordinatorPhase::Exit => {}
        }
    }

    fn start_reduce_phase(&mut self) {
        let slots = std::mem::take(&mut self.intermediates);
        let n_reduce = self.n_reduce;

        // lo que quede en la cola es de la fase Map
        self.queue.clear();
        self.ledger = slots
            .into_iter()
            .enumerate()
            .map(|(r, files)| {
                let number = r as TaskNumber;
                (number, LedgerEntry::idle(Task::reduce(number, files, n_reduce)))
            })
            .collect();
        self.queue.extend(self.ledger.keys().copied());
        self.phase = CoordinatorPhase::Reduce;

        info!(
            "fase map terminada, {} tareas reduce en cola",
            self.queue.len()
        );
    }

    fn scan_timeouts(&mut self, now: Instant, timeout: Duration) -> usize {
        if self.phase == CoordinatorPhase::Exit {
            return 0;
        }

        let mut requeued = 0;
        for (number, entry) in self.ledger.iter_mut() {
            if entry.status != TaskStatus::InProgress {
                continue;
            }
            let Some(assigned_at) = entry.assigned_at else {
                continue;
            };

            let age = now.saturating_duration_since(assigned_at);
            if age > timeout {
                let worker = entry.assigned_to.take().unwrap_or_default();
                warn!(
                    "reencolando tarea {:?} {} del worker {} (sin completar hace {:?})",
                    entry.task.phase, number, worker, age
                );
                entry.status = TaskStatus::Idle;
                entry.assigned_at = None;
                self.queue.push_back(*number);
                requeued += 1;
            }
        }

        self.requeued += requeued as u64;
        requeued
    }

    fn status(&self) -> CoordinatorStatus {
        let count = |status: TaskStatus| {
            self.ledger
                .values()
                .filter(|entry| entry.status == status)
                .count() as u32
        };

        CoordinatorStatus {
            phase: self.phase,
            done: self.phase == CoordinatorPhase::Exit,
            n_reduce: self.n_reduce,
            total_tasks: self.ledger.len() as u32,
            idle_tasks: count(TaskStatus::Idle),
            in_progress_tasks: count(TaskStatus::InProgress),
            completed_tasks: count(TaskStatus::Completed),
            queued_tasks: self.queue.len() as u32,
            requeued_tasks: self.requeued,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// Handle compartido del master: un único lock protege cola, ledger, fase e
/// índice de intermedios. Ninguna operación hace I/O con el lock tomado.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Mutex<Scheduler>>,
}

impl Coordinator {
    /// Crea una tarea Map por archivo de entrada y las deja en cola.
    pub fn new(inputs: Vec<String>, n_reduce: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Scheduler::new(inputs, n_reduce))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Scheduler> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Saca la siguiente tarea de la cola, o devuelve Wait / Exit.
    pub fn assign_task(&self, worker_id: &str) -> Task {
        self.lock().assign(worker_id, Instant::now())
    }

    /// Registra una tarea terminada. Devuelve false si el reporte se descartó.
    pub fn report_completion(&self, task: &Task) -> bool {
        self.lock().complete(task)
    }

    pub fn is_done(&self) -> bool {
        self.lock().phase == CoordinatorPhase::Exit
    }

    /// Reencola las tareas en vuelo hace más de `timeout`.
    pub fn scan_timeouts(&self, timeout: Duration) -> usize {
        self.lock().scan_timeouts(Instant::now(), timeout)
    }

    pub fn status(&self) -> CoordinatorStatus {
        self.lock().status()
    }
}
