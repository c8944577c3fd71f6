//! Query-time orchestration over a prebuilt, read-only corpus index.
//!
//! [`PipelineContext`] is built once at startup and shared by handle; every
//! request goes retrieve -> notes -> flow -> diagram. Backend calls run on
//! the blocking pool under a timeout, bounded retry and cancellation
//! ([`ModelGuard`]). [`RequestQueue`] keeps at most one request in flight.

pub mod context;
pub mod guard;
pub mod queue;

pub use context::{Answer, BuildReport, Diagram, PipelineContext};
pub use guard::{CallPolicy, ModelGuard};
pub use queue::{RequestQueue, Ticket};
pub use tokio_util::sync::CancellationToken;
