//! Alarm registration and delivery.
//!
//! [`AlarmScheduler`] is the port the rescheduler registers reminders with.
//! [`TokioAlarmScheduler`] implements it in-process with one sleeping task
//! per reminder.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::domain::RouteId;
use crate::preferences::EligibilityCache;

/// A reminder ready to be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderAlarm {
    pub favorite_id: i64,
    pub route_id: RouteId,
    pub title: String,
    pub body: String,
    pub trigger_at: DateTime<FixedOffset>,
}

#[derive(Debug, thiserror::Error)]
pub enum AlarmError {
    /// No runtime or platform service to register with
    #[error("alarm service unavailable: {0}")]
    Unavailable(String),

    #[error("alarm rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait AlarmScheduler: Send + Sync {
    /// Register `alarm`, replacing any earlier registration for the same
    /// favorite.
    async fn schedule(&self, alarm: ReminderAlarm) -> Result<(), AlarmError>;

    /// Drop the registration for `favorite_id`, if any.
    async fn cancel(&self, favorite_id: i64);
}

/// A notification that passed the eligibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub favorite_id: i64,
    pub route_id: RouteId,
    pub title: String,
    pub body: String,
    pub vibrate: bool,
}

/// Shows notifications to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, n: &Notification) {
        info!(
            favorite_id = n.favorite_id,
            route_id = %n.route_id,
            vibrate = n.vibrate,
            "{}: {}",
            n.title,
            n.body
        );
    }
}

/// Alarm scheduler backed by tokio tasks.
///
/// Each alarm sleeps until its trigger time, asks the eligibility cache
/// whether to notify, and then re-arms itself one week later.
pub struct TokioAlarmScheduler {
    clock: Arc<dyn Clock>,
    eligibility: Arc<EligibilityCache>,
    notifier: Arc<dyn Notifier>,
    pending: Mutex<HashMap<i64, JoinHandle<()>>>,
}

impl TokioAlarmScheduler {
    pub fn new(
        clock: Arc<dyn Clock>,
        eligibility: Arc<EligibilityCache>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            clock,
            eligibility,
            notifier,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Number of registered alarms.
    pub fn pending_count(&self) -> usize {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.retain(|_, task| !task.is_finished());
        pending.len()
    }

    pub fn is_scheduled(&self, favorite_id: i64) -> bool {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.get(&favorite_id).is_some_and(|task| !task.is_finished())
    }

    /// Abort every registered alarm.
    pub fn cancel_all(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        for (_, task) in pending.drain() {
            task.abort();
        }
    }
}

impl Drop for TokioAlarmScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[async_trait]
impl AlarmScheduler for TokioAlarmScheduler {
    async fn schedule(&self, alarm: ReminderAlarm) -> Result<(), AlarmError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| AlarmError::Unavailable(e.to_string()))?;

        let favorite_id = alarm.favorite_id;
        debug!(favorite_id, trigger_at = %alarm.trigger_at, "Scheduling reminder");
        let task = handle.spawn(run_alarm(
            alarm,
            self.clock.clone(),
            self.eligibility.clone(),
            self.notifier.clone(),
        ));

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.insert(favorite_id, task) {
            previous.abort();
        }
        Ok(())
    }

    async fn cancel(&self, favorite_id: i64) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(task) = pending.remove(&favorite_id) {
            task.abort();
            debug!(favorite_id, "Reminder cancelled");
        }
    }
}

async fn run_alarm(
    alarm: ReminderAlarm,
    clock: Arc<dyn Clock>,
    eligibility: Arc<EligibilityCache>,
    notifier: Arc<dyn Notifier>,
) {
    let mut trigger_at = alarm.trigger_at;
    loop {
        let wait = (trigger_at - clock.now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        deliver(&alarm, &eligibility, notifier.as_ref());
        trigger_at += Duration::weeks(1);
    }
}

fn deliver(alarm: &ReminderAlarm, eligibility: &EligibilityCache, notifier: &dyn Notifier) {
    if !eligibility.should_notify(Some(alarm.route_id.as_str())) {
        debug!(favorite_id = alarm.favorite_id, "Reminder suppressed by notification settings");
        return;
    }

    notifier.notify(&Notification {
        favorite_id: alarm.favorite_id,
        route_id: alarm.route_id.clone(),
        title: alarm.title.clone(),
        body: alarm.body.clone(),
        vibrate: eligibility.vibration_enabled(),
    });
}
