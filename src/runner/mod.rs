//! Plan assembly, pre-flight, retry and step orchestration.

pub mod orchestrator;
pub mod plan;
pub mod preflight;
pub mod report;
pub mod retry;
pub mod sink;

pub use orchestrator::{Orchestrator, RunOutcome, RunState, EXCLUDED_REASON};
pub use plan::{Plan, PlanBuilder, PlanEntry};
pub use preflight::{FsProbe, PathProbe, PreflightResult};
pub use report::{ReportRow, RunReport, RunVerdict};
pub use retry::{Backoff, Retried, RetryPolicy, Sleeper, ThreadSleeper};
pub use sink::{LogSink, ReportSink};
