//! Re-registers reminders for active favorites at startup.

use std::sync::Arc;

use chrono::Duration;
use futures::future::join_all;
use tracing::{info, warn};

use crate::clock::{Clock, next_trigger};
use crate::domain::FavoriteReminder;
use crate::error::ValidationError;
use crate::favorites::{FavoriteRecord, FavoritesStore};
use crate::repository::RouteRepository;

use super::alarm::{AlarmError, AlarmScheduler, ReminderAlarm};

/// Default minutes between a reminder and the departure it is for.
pub const DEFAULT_REMINDER_LEAD_MINUTES: i64 = 10;

/// Title used when neither the catalog nor the favorite names the route.
pub const UNKNOWN_ROUTE_TITLE: &str = "Route unavailable";

/// Why a single favorite could not be rescheduled.
#[derive(Debug, thiserror::Error)]
pub enum RescheduleError {
    #[error("invalid favorite: {0}")]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Alarm(#[from] AlarmError),
}

#[derive(Debug)]
pub struct RescheduleFailure {
    pub favorite_id: i64,
    pub error: RescheduleError,
}

/// Outcome of a startup reschedule pass.
#[derive(Debug, Default)]
pub struct RescheduleReport {
    /// Active favorites considered
    pub total: usize,
    pub successes: usize,
    pub failures: Vec<RescheduleFailure>,
}

pub struct ReminderRescheduler {
    favorites: Arc<dyn FavoritesStore>,
    repository: Arc<RouteRepository>,
    scheduler: Arc<dyn AlarmScheduler>,
    clock: Arc<dyn Clock>,
    lead: Duration,
}

impl ReminderRescheduler {
    pub fn new(
        favorites: Arc<dyn FavoritesStore>,
        repository: Arc<RouteRepository>,
        scheduler: Arc<dyn AlarmScheduler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            favorites,
            repository,
            scheduler,
            clock,
            lead: Duration::minutes(DEFAULT_REMINDER_LEAD_MINUTES),
        }
    }

    pub fn with_lead(mut self, lead: Duration) -> Self {
        self.lead = lead;
        self
    }

    /// Register an alarm for every active favorite.
    ///
    /// Each favorite is handled on its own: an invalid record or a refused
    /// registration is logged and counted without affecting the rest. If the
    /// favorites cannot be read at all, nothing is scheduled.
    pub async fn reschedule_all_on_startup(&self) -> RescheduleReport {
        self.repository.init().await;

        let records = match self.favorites.active().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Failed to load favorites, no reminders rescheduled");
                return RescheduleReport::default();
            }
        };

        let total = records.len();
        let results = join_all(records.iter().map(|record| async move {
            (record.id, self.reschedule_one(record).await)
        }))
        .await;

        let mut report = RescheduleReport {
            total,
            ..Default::default()
        };
        for (favorite_id, result) in results {
            match result {
                Ok(()) => report.successes += 1,
                Err(error) => {
                    warn!(favorite_id, error = %error, "Failed to reschedule reminder");
                    report.failures.push(RescheduleFailure { favorite_id, error });
                }
            }
        }

        info!(
            successes = report.successes,
            total = report.total,
            "Rescheduled reminders"
        );
        report
    }

    async fn reschedule_one(&self, record: &FavoriteRecord) -> Result<(), RescheduleError> {
        let favorite = FavoriteReminder::try_from(record)?;
        let alarm = self.build_alarm(&favorite);
        self.scheduler.schedule(alarm).await?;
        Ok(())
    }

    fn build_alarm(&self, favorite: &FavoriteReminder) -> ReminderAlarm {
        let title = match self.repository.route_by_id(favorite.route_id.as_str()) {
            Some(route) => route.label(),
            None => {
                warn!(
                    favorite_id = favorite.id,
                    route_id = %favorite.route_id,
                    "Route missing from catalog, using saved label"
                );
                favorite
                    .saved_route_label()
                    .unwrap_or_else(|| UNKNOWN_ROUTE_TITLE.to_string())
            }
        };

        let mut body = format!("{} at {}", favorite.stop_name, favorite.departure_time);
        if !favorite.departure_point.trim().is_empty() {
            body.push_str(&format!(" from {}", favorite.departure_point.trim()));
        }

        ReminderAlarm {
            favorite_id: favorite.id,
            route_id: favorite.route_id.clone(),
            title,
            body,
            trigger_at: next_trigger(
                self.clock.now(),
                favorite.day,
                favorite.departure_time.time(),
                self.lead,
            ),
        }
    }
}
