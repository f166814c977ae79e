//! One-shot job adapter over the cron scheduler.
//!
//! The underlying facility is calendar-based, so a one-shot job is expressed
//! as the cron expression for its exact date. Left alone, that expression
//! would fire again on the same date next year; every handle therefore must
//! be cancelled once its job has fired or been superseded. The registry's
//! cleanup paths carry that responsibility.

use std::future::Future;
use std::pin::Pin;

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::debug;
use uuid::Uuid;

/// Hands out one-shot jobs backed by a started [`JobScheduler`].
pub struct CronScheduler {
    inner: JobScheduler,
}

impl CronScheduler {
    /// Create and start the underlying scheduler.
    pub async fn start() -> Result<Self, JobSchedulerError> {
        let mut inner = JobScheduler::new().await?;
        inner.start().await?;
        Ok(Self { inner })
    }

    /// Register `run` to fire once at `at`, interpreted as local wall-clock
    /// time. Returns the handle needed to cancel the job.
    pub async fn schedule_once<F, Fut>(
        &self,
        at: NaiveDateTime,
        run: F,
    ) -> Result<Uuid, JobSchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let expr = one_shot_expr(&at);
        debug!(%at, %expr, "registering one-shot job");
        let job = Job::new_async_tz(expr.as_str(), Local, move |_id, _sched| {
            let fut: Pin<Box<dyn Future<Output = ()> + Send>> = Box::pin(run());
            fut
        })?;
        // the scheduler handle is Arc-backed; a clone addresses the same state
        let mut sched = self.inner.clone();
        sched.add(job).await
    }

    /// Cancel a previously registered job.
    ///
    /// Fire-and-forget so it is safe to call while holding the registry lock.
    /// Cancelling a handle that already fired or was never registered is a
    /// no-op.
    pub fn cancel(&self, id: Uuid) {
        let mut sched = self.inner.clone();
        tokio::spawn(async move {
            if let Err(e) = sched.remove(&id).await {
                debug!(job = %id, error = %e, "cancel of stale job handle ignored");
            }
        });
    }
}

/// Cron expression firing at the exact date and minute of `at`.
fn one_shot_expr(at: &NaiveDateTime) -> String {
    format!(
        "0 {} {} {} {} *",
        at.minute(),
        at.hour(),
        at.day(),
        at.month()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn expr_pins_minute_hour_day_and_month() {
        let at = NaiveDate::from_ymd_opt(2025, 8, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(one_shot_expr(&at), "0 30 9 15 8 *");
    }

    #[tokio::test]
    async fn schedule_and_cancel_round_trip() {
        let sched = CronScheduler::start().await.unwrap();
        let at = Local::now().naive_local() + Duration::hours(1);
        let id = sched.schedule_once(at, || async {}).await.unwrap();
        sched.cancel(id);
        // cancelling twice must stay a no-op
        sched.cancel(id);
    }
}
