//! Per-user scheduling and execution coordinator.
//!
//! `schedule_checkout` turns an "HH:MM" wall-clock string into two one-shot
//! jobs: a credential refresh one minute ahead of the target, and the
//! checkout race at the target itself. The jobs never talk to each other
//! directly; credentials flow through the registry, and the one-minute lead
//! is the only ordering between them.

use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use tracing::{debug, info, warn};

use crate::api::StoreApi;
use crate::notify::Notifier;

use super::{resolver, CronScheduler, Schedule, ScheduleError, ScheduleRegistry};

/// Maximum number of back-to-back checkout submissions per race.
pub const MAX_CHECKOUT_ATTEMPTS: u32 = 10;

#[derive(Clone)]
pub struct CheckoutCoordinator {
    api: Arc<dyn StoreApi>,
    registry: Arc<ScheduleRegistry>,
    scheduler: Arc<CronScheduler>,
    notifier: Notifier,
}

impl CheckoutCoordinator {
    pub fn new(
        api: Arc<dyn StoreApi>,
        registry: Arc<ScheduleRegistry>,
        scheduler: Arc<CronScheduler>,
        notifier: Notifier,
    ) -> Self {
        Self {
            api,
            registry,
            scheduler,
            notifier,
        }
    }

    /// Register the job pair for `user_id`, replacing any previous schedule.
    ///
    /// Returns once the jobs are registered; the jobs themselves fire
    /// asynchronously on the scheduler's workers.
    pub async fn schedule_checkout(
        &self,
        user_id: i64,
        email: &str,
        time_str: &str,
    ) -> Result<(), ScheduleError> {
        let (checkout_at, login_at) =
            resolver::resolve_fire_times(Local::now().naive_local(), time_str)?;
        info!(user_id, email, %checkout_at, "scheduling checkout");

        let login_job = {
            let this = self.clone();
            let email = email.to_string();
            self.scheduler
                .schedule_once(login_at, move || {
                    let this = this.clone();
                    let email = email.clone();
                    async move { this.run_auth_refresh(user_id, &email).await }
                })
                .await?
        };

        let checkout_job = {
            let this = self.clone();
            let email = email.to_string();
            let registered = self
                .scheduler
                .schedule_once(checkout_at, move || {
                    let this = this.clone();
                    let email = email.clone();
                    async move { this.run_checkout_race(user_id, &email).await }
                })
                .await;
            match registered {
                Ok(id) => id,
                Err(e) => {
                    // never leave a half-registered pair behind
                    self.scheduler.cancel(login_job);
                    return Err(e.into());
                }
            }
        };

        self.registry
            .upsert(user_id, Schedule::new(email, time_str, login_job, checkout_job));
        Ok(())
    }

    /// Auth refresh job body, fired at the lead instant.
    ///
    /// Single shot: any failure notifies the user and terminates without
    /// committing anything. The paired race job tolerates the missing
    /// credentials.
    async fn run_auth_refresh(&self, user_id: i64, email: &str) {
        info!(user_id, email, "auth refresh job fired");

        let token = match self.api.login(email).await {
            Ok(token) => token,
            Err(e) => {
                warn!(user_id, email, error = %e, "login failed");
                self.notifier
                    .notify(user_id, format!("❌ [{email}] Login failed: {e}"));
                return;
            }
        };

        let address_id = match self.api.address_id(&token).await {
            Ok(id) => id,
            Err(e) => {
                warn!(user_id, email, error = %e, "address lookup failed");
                self.notifier.notify(
                    user_id,
                    format!("❌ [{email}] Could not resolve a delivery address: {e}"),
                );
                return;
            }
        };

        self.registry.update_credentials(user_id, token, address_id);
        self.notifier
            .notify(user_id, format!("✅ [{email}] Logged in, checkout armed."));
    }

    /// Checkout race job body, fired at the target instant.
    async fn run_checkout_race(&self, user_id: i64, email: &str) {
        info!(user_id, email, "checkout race job fired");

        let credentials = self.registry.get(user_id).and_then(|s| s.credentials());
        let Some((token, address_id)) = credentials else {
            // schedule intentionally left in place; the next /co replaces it
            warn!(user_id, email, "no credentials at fire time, skipping checkout");
            self.notifier.notify(
                user_id,
                format!("⚠️ [{email}] No credentials on file, checkout skipped."),
            );
            return;
        };

        let start = Instant::now();
        let mut won = false;
        for attempt in 1..=MAX_CHECKOUT_ATTEMPTS {
            // a transport error counts the same as a rejected attempt
            match self.api.checkout(address_id, &token).await {
                Ok(true) => {
                    let elapsed_ms = start.elapsed().as_millis() as u64;
                    info!(user_id, attempt, elapsed_ms, "checkout succeeded");
                    self.notifier.notify(
                        user_id,
                        format!("✅ [{email}] Checkout succeeded in {elapsed_ms}ms"),
                    );
                    won = true;
                    break;
                }
                Ok(false) => debug!(user_id, attempt, "checkout attempt rejected"),
                Err(e) => debug!(user_id, attempt, error = %e, "checkout attempt errored"),
            }
        }

        if !won {
            warn!(user_id, email, "all checkout attempts exhausted");
            self.notifier.notify(
                user_id,
                format!("❌ [{email}] Checkout did not go through after {MAX_CHECKOUT_ATTEMPTS} attempts."),
            );
        }

        self.registry.remove(user_id);
    }
}
