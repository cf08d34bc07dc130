//! Synchronous notification eligibility.
//!
//! [`EligibilityCache`] holds the last-read [`NotificationPolicy`] as an
//! immutable snapshot. `refresh` reads the settings store and swaps the
//! snapshot in whole; `should_notify` only reads it, so alarm callbacks can
//! decide without touching storage.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::clock::Clock;

use super::policy::NotificationPolicy;
use super::store::SettingsStore;

/// What `should_notify` answers when the policy cannot be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Deliver the notification
    #[default]
    FailOpen,
    /// Suppress the notification
    FailClosed,
}

pub struct EligibilityCache {
    store: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
    snapshot: watch::Sender<Arc<NotificationPolicy>>,
    on_error: FailurePolicy,
}

impl EligibilityCache {
    /// A cache holding the default policy until the first refresh.
    pub fn new(store: Arc<dyn SettingsStore>, clock: Arc<dyn Clock>) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(NotificationPolicy::default()));
        Self {
            store,
            clock,
            snapshot,
            on_error: FailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_error = policy;
        self
    }

    /// Re-read settings and replace the snapshot.
    ///
    /// If the store cannot be read the previous snapshot stays in place.
    /// Returns whether a new snapshot was published.
    pub async fn refresh(&self) -> bool {
        let settings = match self.store.load_all().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Failed to read notification settings, keeping previous policy");
                return false;
            }
        };

        let policy = NotificationPolicy::from_settings(&settings);
        debug!(
            quiet = ?policy.quiet,
            mode = ?policy.mode,
            overrides = policy.overrides.len(),
            "Notification policy refreshed"
        );
        self.snapshot.send_replace(Arc::new(policy));
        true
    }

    /// Whether a notification for `route_id` may be shown now.
    ///
    /// Never blocks and never fails; evaluation errors resolve according to
    /// the configured [`FailurePolicy`].
    pub fn should_notify(&self, route_id: Option<&str>) -> bool {
        let policy = self.snapshot();
        match policy.evaluate(route_id, self.clock.now()) {
            Ok(allowed) => allowed,
            Err(e) => {
                let allowed = self.on_error == FailurePolicy::FailOpen;
                error!(error = %e, route_id = ?route_id, allowed, "Eligibility check failed");
                allowed
            }
        }
    }

    pub fn vibration_enabled(&self) -> bool {
        self.snapshot.borrow().vibration
    }

    /// The current policy snapshot.
    pub fn snapshot(&self) -> Arc<NotificationPolicy> {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified each time a refresh publishes a new snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<NotificationPolicy>> {
        self.snapshot.subscribe()
    }
}
