//! In-memory schedule registry.
//!
//! Single source of truth for active schedules. Invariants:
//! - at most one schedule per user; upserting cancels the previous job pair
//! - `token` and `address_id` are only ever written together
//! - every read and write runs under the same lock

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use super::cron::CronScheduler;

/// Per-user schedule pairing a target checkout time with the credentials
/// obtained shortly before it fires.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub email: String,
    /// Original "HH:MM" input, kept for display.
    pub checkout_time: String,
    pub token: Option<String>,
    pub address_id: Option<i64>,
    pub login_job: Uuid,
    pub checkout_job: Uuid,
}

impl Schedule {
    pub fn new(email: &str, checkout_time: &str, login_job: Uuid, checkout_job: Uuid) -> Self {
        Self {
            email: email.to_string(),
            checkout_time: checkout_time.to_string(),
            token: None,
            address_id: None,
            login_job,
            checkout_job,
        }
    }

    /// Both credential fields, if the auth refresh has committed them.
    pub fn credentials(&self) -> Option<(String, i64)> {
        self.token.clone().zip(self.address_id)
    }
}

/// Mapping from Telegram user id to their single active schedule.
pub struct ScheduleRegistry {
    scheduler: Arc<CronScheduler>,
    entries: Mutex<HashMap<i64, Schedule>>,
}

impl ScheduleRegistry {
    pub fn new(scheduler: Arc<CronScheduler>) -> Self {
        Self {
            scheduler,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Insert `schedule` for `user_id`, cancelling and discarding any
    /// previous entry and its job pair.
    pub fn upsert(&self, user_id: i64, schedule: Schedule) {
        let mut entries = self.entries.lock();
        if let Some(old) = entries.insert(user_id, schedule) {
            self.scheduler.cancel(old.login_job);
            self.scheduler.cancel(old.checkout_job);
        }
    }

    /// Snapshot of the user's schedule.
    pub fn get(&self, user_id: i64) -> Option<Schedule> {
        self.entries.lock().get(&user_id).cloned()
    }

    /// Commit both credential fields in one critical section. No-op when the
    /// entry was removed or replaced in the meantime.
    pub fn update_credentials(&self, user_id: i64, token: String, address_id: i64) {
        if let Some(entry) = self.entries.lock().get_mut(&user_id) {
            entry.token = Some(token);
            entry.address_id = Some(address_id);
        }
    }

    /// Remove the user's schedule and cancel both of its jobs.
    pub fn remove(&self, user_id: i64) {
        let mut entries = self.entries.lock();
        if let Some(old) = entries.remove(&user_id) {
            self.scheduler.cancel(old.login_job);
            self.scheduler.cancel(old.checkout_job);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
