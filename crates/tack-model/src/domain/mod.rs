mod exit_status;
pub use exit_status::{ExitStatus, UnknownStatus, worst_level};

mod task_id;
pub use task_id::TaskId;

mod credentials;
pub use credentials::Credentials;

mod claim;
pub use claim::{ClaimedTask, Lease, WorkClaim};

mod resolution;
pub use resolution::Resolution;

/// Run number of a task inside the queue.
///
/// A task may be retried by the queue; every retry is a new run with its own lease.
pub type RunId = u32;
