pub mod client;
pub mod config;
pub mod executor;
pub mod storage;
pub mod worker;

pub use client::{CoordinatorRpc, HttpCoordinatorClient};
pub use config::{RetryPolicy, WorkerConfig};
pub use executor::{execute_map, execute_reduce, execute_task, Application};
pub use storage::{LocalStorage, Scratch};
pub use worker::{run_worker, WorkerSummary};
