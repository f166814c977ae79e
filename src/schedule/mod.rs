//! Checkout scheduling core.
//!
//! Converts a user's "HH:MM" target into a pair of one-shot jobs (credential
//! refresh one minute ahead, checkout race at the target) and owns the
//! per-user schedule state the two jobs communicate through.

pub mod coordinator;
pub mod cron;
pub mod registry;
pub mod resolver;

pub use coordinator::{CheckoutCoordinator, MAX_CHECKOUT_ATTEMPTS};
pub use cron::CronScheduler;
pub use registry::{Schedule, ScheduleRegistry};

use tokio_cron_scheduler::JobSchedulerError;

/// Errors surfaced synchronously when registering a schedule.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// Input did not parse as a 24-hour `HH:MM` wall-clock time.
    #[error("invalid time format: {0:?}")]
    InvalidTimeFormat(String),

    #[error("job registration failed: {0}")]
    Scheduler(#[from] JobSchedulerError),
}
