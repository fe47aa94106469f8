pub mod execution;
pub mod orchestrator;
pub mod planning;
pub mod report;
pub mod types;
pub mod verification;

pub use execution::Executor;
pub use orchestrator::Orchestrator;
pub use planning::{Plan, Planner, Step};
pub use report::TaskReport;
pub use verification::Verifier;
