pub mod naming;
pub mod partition;
pub mod rpc;
pub mod task;
pub mod wordcount;

pub use naming::{intermediate_name, output_line, output_name};
pub use partition::{ihash, partition};
pub use rpc::{
    CoordinatorPhase, CoordinatorStatus, TaskAssignmentRequest, TaskAssignmentResponse,
    TaskCompleteRequest, TaskCompleteResponse, WorkerId,
};
pub use task::{KeyValue, Task, TaskNumber, TaskPhase};
