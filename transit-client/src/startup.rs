//! Application wiring and background tasks.
//!
//! [`App`] builds every component from an [`AppConfig`] and owns the
//! background work: the startup sequence (settings refresh and catalog load
//! in parallel, then reminder rescheduling) and the periodic update check.
//! Dropping the app or calling [`App::shutdown`] stops all of it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::error::NetworkError;
use crate::favorites::{FavoritesStore, JsonFavoritesStore};
use crate::preferences::{EligibilityCache, JsonSettingsStore, PreferenceSettings, SettingsStore};
use crate::reminders::{
    LogNotifier, Notifier, RescheduleReport, ReminderRescheduler, TokioAlarmScheduler,
};
use crate::repository::RouteRepository;
use crate::source::{HttpRemoteSource, PayloadCache, RemoteSource, SourceResolver};

/// The pluggable edges of the application.
pub struct AppParts {
    pub remote: Arc<dyn RemoteSource>,
    pub settings: Arc<dyn SettingsStore>,
    pub favorites: Arc<dyn FavoritesStore>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

impl AppParts {
    /// Production parts: HTTP remote, JSON stores in the data directory,
    /// log notifications and the system clock.
    pub fn from_config(config: &AppConfig) -> Result<Self, NetworkError> {
        Ok(Self {
            remote: Arc::new(HttpRemoteSource::new(config.remote.clone())?),
            settings: Arc::new(JsonSettingsStore::in_dir(&config.data_dir)),
            favorites: Arc::new(JsonFavoritesStore::in_dir(&config.data_dir)),
            notifier: Arc::new(LogNotifier),
            clock: Arc::new(SystemClock),
        })
    }
}

/// A running client.
pub struct App {
    repository: Arc<RouteRepository>,
    eligibility: Arc<EligibilityCache>,
    settings: Arc<PreferenceSettings>,
    favorites: Arc<dyn FavoritesStore>,
    alarms: Arc<TokioAlarmScheduler>,
    rescheduler: Arc<ReminderRescheduler>,
    startup_report: Option<oneshot::Receiver<RescheduleReport>>,
    tasks: JoinSet<()>,
}

impl App {
    /// Build the production components and start background work.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: AppConfig) -> Result<Self, NetworkError> {
        let parts = AppParts::from_config(&config)?;
        Ok(Self::launch(&config, parts))
    }

    /// Start with caller-supplied parts.
    ///
    /// Must be called from within a tokio runtime.
    pub fn launch(config: &AppConfig, parts: AppParts) -> Self {
        let resolver = Arc::new(SourceResolver::new(
            parts.remote,
            PayloadCache::in_dir(&config.data_dir),
            config.bundled.clone(),
            &config.cache,
        ));
        let repository = Arc::new(RouteRepository::new(resolver));
        let eligibility = Arc::new(
            EligibilityCache::new(parts.settings.clone(), parts.clock.clone())
                .with_failure_policy(config.failure_policy),
        );
        let settings = Arc::new(PreferenceSettings::new(parts.settings, eligibility.clone()));
        let alarms = Arc::new(TokioAlarmScheduler::new(
            parts.clock.clone(),
            eligibility.clone(),
            parts.notifier,
        ));
        let rescheduler = Arc::new(
            ReminderRescheduler::new(
                parts.favorites.clone(),
                repository.clone(),
                alarms.clone(),
                parts.clock,
            )
            .with_lead(config.reminder_lead),
        );

        let mut tasks = JoinSet::new();
        let (report_tx, report_rx) = oneshot::channel();
        tasks.spawn(run_startup(
            repository.clone(),
            eligibility.clone(),
            rescheduler.clone(),
            report_tx,
        ));
        if let Some(interval) = config.update_check_interval {
            tasks.spawn(run_update_checks(
                repository.clone(),
                rescheduler.clone(),
                interval,
            ));
        }

        Self {
            repository,
            eligibility,
            settings,
            favorites: parts.favorites,
            alarms,
            rescheduler,
            startup_report: Some(report_rx),
            tasks,
        }
    }

    pub fn repository(&self) -> &Arc<RouteRepository> {
        &self.repository
    }

    pub fn eligibility(&self) -> &Arc<EligibilityCache> {
        &self.eligibility
    }

    pub fn settings(&self) -> &Arc<PreferenceSettings> {
        &self.settings
    }

    pub fn favorites(&self) -> &Arc<dyn FavoritesStore> {
        &self.favorites
    }

    pub fn alarms(&self) -> &Arc<TokioAlarmScheduler> {
        &self.alarms
    }

    /// Register reminders for every active favorite again, e.g. after the
    /// user changes their favorites.
    pub async fn reschedule_reminders(&self) -> RescheduleReport {
        self.rescheduler.reschedule_all_on_startup().await
    }

    /// Wait for the startup sequence and take its report.
    ///
    /// Returns `None` if the report was already taken or startup was
    /// cancelled.
    pub async fn startup_report(&mut self) -> Option<RescheduleReport> {
        self.startup_report.take()?.await.ok()
    }

    /// Stop background tasks and pending reminders.
    pub async fn shutdown(mut self) {
        self.tasks.shutdown().await;
        self.alarms.cancel_all();
        info!("Transit client stopped");
    }
}

async fn run_startup(
    repository: Arc<RouteRepository>,
    eligibility: Arc<EligibilityCache>,
    rescheduler: Arc<ReminderRescheduler>,
    report_tx: oneshot::Sender<RescheduleReport>,
) {
    tokio::join!(eligibility.refresh(), repository.init());

    let report = rescheduler.reschedule_all_on_startup().await;
    let _ = report_tx.send(report);
}

async fn run_update_checks(
    repository: Arc<RouteRepository>,
    rescheduler: Arc<ReminderRescheduler>,
    period: Duration,
) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // First tick is immediate, skip it
    loop {
        interval.tick().await;
        if !repository.check_for_data_updates().await {
            continue;
        }

        info!("Newer route data available, refreshing");
        if repository.refresh_from_remote().await {
            let report = rescheduler.reschedule_all_on_startup().await;
            info!(
                successes = report.successes,
                total = report.total,
                "Reminders updated for new route data"
            );
        } else {
            warn!("Route data refresh failed, keeping current catalog");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::clock::FixedClock;
    use crate::favorites::{FavoriteRecord, MemoryFavoritesStore};
    use crate::preferences::{MemorySettingsStore, QuietMode};
    use crate::reminders::testing::RecordingNotifier;
    use crate::source::testing::FakeRemote;
    use crate::source::{BundledSource, Tier};

    const ROUTES_V1: &str = r#"{"version":"v1","routes":[
        {"id":"r1","routeNumber":"12","name":"Harbour Loop","description":"Via Market Street"}
    ]}"#;

    const ROUTES_V2: &str = r#"{"version":"v2","routes":[
        {"id":"r1","routeNumber":"12","name":"Harbour Express","description":"Via Market Street"},
        {"id":"r2","routeNumber":"N4","name":"Night Owl","description":"Airport overnight"}
    ]}"#;

    fn favorite(id: i64) -> FavoriteRecord {
        FavoriteRecord {
            id,
            route_id: "r1".into(),
            route_number: "12".into(),
            route_name: "Harbour Loop".into(),
            stop_name: "Pier".into(),
            departure_time: "07:30".into(),
            day_of_week: 2,
            departure_point: String::new(),
            added_at: 0,
            active: true,
        }
    }

    fn parts(remote: FakeRemote, favorites: Vec<FavoriteRecord>) -> AppParts {
        AppParts {
            remote: Arc::new(remote),
            settings: Arc::new(MemorySettingsStore::new()),
            favorites: Arc::new(MemoryFavoritesStore::with_records(favorites)),
            notifier: Arc::new(RecordingNotifier::default()),
            clock: Arc::new(FixedClock::at("2024-03-18T06:00:00+00:00").unwrap()),
        }
    }

    #[tokio::test]
    async fn startup_loads_catalog_and_schedules_reminders() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::new(dir.path())
            .with_bundled(BundledSource::Missing)
            .with_update_check_interval(None);
        let parts = parts(FakeRemote::ok(ROUTES_V1), vec![favorite(1), favorite(2)]);
        let mut app = App::launch(&config, parts);

        let report = app.startup_report().await.unwrap();
        assert_eq!((report.successes, report.total), (2, 2));
        assert_eq!(app.repository().catalog().origin(), Some(Tier::Remote));
        assert_eq!(app.alarms().pending_count(), 2);
        assert!(app.startup_report().await.is_none());

        app.shutdown().await;
    }

    #[tokio::test]
    async fn startup_survives_offline_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::new(dir.path()).with_update_check_interval(None);
        let mut app = App::launch(&config, parts(FakeRemote::failing(), vec![favorite(1)]));

        let report = app.startup_report().await.unwrap();
        assert_eq!(report.successes, 1);
        assert!(!app.repository().all_routes().is_empty());
        assert_eq!(app.repository().catalog().origin(), Some(Tier::Bundled));

        app.shutdown().await;
    }

    #[tokio::test]
    async fn settings_changes_reach_the_eligibility_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::new(dir.path()).with_update_check_interval(None);
        let mut app = App::launch(&config, parts(FakeRemote::ok(ROUTES_V1), vec![]));
        app.startup_report().await;

        assert!(app.eligibility().should_notify(Some("r1")));
        app.settings().set_quiet_mode(QuietMode::Disabled).await.unwrap();
        assert!(!app.eligibility().should_notify(Some("r1")));

        app.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_check_adopts_newer_data() {
        let dir = tempfile::tempdir().unwrap();
        let remote = FakeRemote::ok(ROUTES_V1);
        let config = AppConfig::new(dir.path())
            .with_bundled(BundledSource::Missing)
            .with_update_check_interval(Some(Duration::from_secs(3600)));
        let mut app = App::launch(&config, parts(remote.clone(), vec![favorite(1)]));
        app.startup_report().await;
        assert_eq!(app.repository().all_routes().len(), 1);

        let mut catalog = app.repository().subscribe();
        remote.set_body(Some(ROUTES_V2));
        tokio::time::sleep(Duration::from_secs(3601)).await;
        while app.repository().all_routes().len() != 2 {
            catalog.changed().await.unwrap();
        }

        assert_eq!(app.repository().all_routes().len(), 2);
        assert_eq!(app.repository().data_version().await.as_deref(), Some("v2"));

        app.shutdown().await;
    }
}
