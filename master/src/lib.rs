pub mod config;
pub mod handlers;
pub mod monitor;
pub mod state;

pub use config::{collect_inputs, MasterConfig};
pub use handlers::build_router;
pub use monitor::{run_timeout_monitor, MonitorConfig};
pub use state::{Coordinator, TaskStatus};
