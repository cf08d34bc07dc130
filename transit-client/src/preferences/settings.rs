//! Typed writers for notification settings.

use std::sync::Arc;

use tracing::info;

use crate::domain::RouteId;
use crate::error::StorageError;

use super::eligibility::EligibilityCache;
use super::policy::{
    KEY_MODE, KEY_QUIET_MODE, KEY_QUIET_UNTIL, KEY_SELECTED_DAYS, KEY_VIBRATION, NotificationMode,
    QuietMode, override_days_key, override_mode_key,
};
use super::store::{PreferenceValue, SettingsStore};

/// Writes settings under their persisted keys and refreshes the eligibility
/// cache after every successful change.
pub struct PreferenceSettings {
    store: Arc<dyn SettingsStore>,
    eligibility: Arc<EligibilityCache>,
}

impl PreferenceSettings {
    pub fn new(store: Arc<dyn SettingsStore>, eligibility: Arc<EligibilityCache>) -> Self {
        Self { store, eligibility }
    }

    pub async fn set_quiet_mode(&self, quiet: QuietMode) -> Result<(), StorageError> {
        self.store
            .set(KEY_QUIET_MODE, PreferenceValue::Text(quiet.storage_name().into()))
            .await?;
        match quiet {
            QuietMode::SuppressedUntil(until) => {
                self.store.set(KEY_QUIET_UNTIL, PreferenceValue::Int(until)).await?
            }
            QuietMode::Disabled | QuietMode::Enabled => self.store.remove(KEY_QUIET_UNTIL).await?,
        }
        info!(quiet = ?quiet, "Quiet mode updated");
        self.eligibility.refresh().await;
        Ok(())
    }

    pub async fn set_notification_mode(&self, mode: NotificationMode) -> Result<(), StorageError> {
        write_mode(self.store.as_ref(), KEY_MODE, KEY_SELECTED_DAYS, mode).await?;
        info!(mode = ?mode, "Notification mode updated");
        self.eligibility.refresh().await;
        Ok(())
    }

    /// Give `route_id` its own mode, replacing the global one for that route.
    pub async fn set_route_override(
        &self,
        route_id: &RouteId,
        mode: NotificationMode,
    ) -> Result<(), StorageError> {
        let mode_key = override_mode_key(route_id);
        let days_key = override_days_key(route_id);
        write_mode(self.store.as_ref(), &mode_key, &days_key, mode).await?;
        info!(route_id = %route_id, mode = ?mode, "Route notification override set");
        self.eligibility.refresh().await;
        Ok(())
    }

    pub async fn clear_route_override(&self, route_id: &RouteId) -> Result<(), StorageError> {
        self.store.remove(&override_mode_key(route_id)).await?;
        self.store.remove(&override_days_key(route_id)).await?;
        info!(route_id = %route_id, "Route notification override cleared");
        self.eligibility.refresh().await;
        Ok(())
    }

    pub async fn set_vibration(&self, enabled: bool) -> Result<(), StorageError> {
        self.store
            .set(KEY_VIBRATION, PreferenceValue::Bool(enabled))
            .await?;
        self.eligibility.refresh().await;
        Ok(())
    }
}

async fn write_mode(
    store: &dyn SettingsStore,
    mode_key: &str,
    days_key: &str,
    mode: NotificationMode,
) -> Result<(), StorageError> {
    store
        .set(mode_key, PreferenceValue::Text(mode.storage_name().into()))
        .await?;
    match mode {
        NotificationMode::SelectedDays(days) => {
            store
                .set(days_key, PreferenceValue::TextSet(days.to_names()))
                .await
        }
        _ => store.remove(days_key).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    use crate::clock::FixedClock;
    use crate::domain::DaySet;
    use crate::preferences::store::{JsonSettingsStore, MemorySettingsStore};

    // 2024-03-18 is a Monday.
    fn setup(store: Arc<dyn SettingsStore>) -> (PreferenceSettings, Arc<EligibilityCache>) {
        let clock = Arc::new(FixedClock::at("2024-03-18T08:00:00+00:00").unwrap());
        let eligibility = Arc::new(EligibilityCache::new(store.clone(), clock));
        (PreferenceSettings::new(store, eligibility.clone()), eligibility)
    }

    #[tokio::test]
    async fn quiet_mode_write_refreshes_cache() {
        let (settings, eligibility) = setup(Arc::new(MemorySettingsStore::new()));
        assert!(eligibility.should_notify(None));

        settings.set_quiet_mode(QuietMode::Disabled).await.unwrap();
        assert!(!eligibility.should_notify(None));

        settings.set_quiet_mode(QuietMode::Enabled).await.unwrap();
        assert!(eligibility.should_notify(None));
    }

    #[tokio::test]
    async fn suppressed_until_stores_the_deadline() {
        let store = Arc::new(MemorySettingsStore::new());
        let (settings, eligibility) = setup(store.clone());

        settings
            .set_quiet_mode(QuietMode::SuppressedUntil(i64::from(i32::MAX) * 1000))
            .await
            .unwrap();
        assert!(!eligibility.should_notify(None));
        assert!(store.load_all().await.unwrap().contains_key(KEY_QUIET_UNTIL));

        settings.set_quiet_mode(QuietMode::Enabled).await.unwrap();
        assert!(!store.load_all().await.unwrap().contains_key(KEY_QUIET_UNTIL));
    }

    #[tokio::test]
    async fn selected_days_round_trip_through_the_store() {
        let (settings, eligibility) = setup(Arc::new(MemorySettingsStore::new()));
        let tuesday_only = NotificationMode::SelectedDays(DaySet::empty().with(Weekday::Tue));

        settings.set_notification_mode(tuesday_only).await.unwrap();
        assert_eq!(eligibility.snapshot().mode, tuesday_only);
        assert!(!eligibility.should_notify(None));
    }

    #[tokio::test]
    async fn route_override_set_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let (settings, eligibility) = setup(Arc::new(JsonSettingsStore::in_dir(dir.path())));
        let x = RouteId::parse("X").unwrap();

        settings
            .set_route_override(&x, NotificationMode::Disabled)
            .await
            .unwrap();
        assert!(!eligibility.should_notify(Some("X")));
        assert!(eligibility.should_notify(Some("Y")));

        settings.clear_route_override(&x).await.unwrap();
        assert!(eligibility.should_notify(Some("X")));
        assert!(eligibility.snapshot().overrides.is_empty());
    }

    #[tokio::test]
    async fn vibration_flag() {
        let (settings, eligibility) = setup(Arc::new(MemorySettingsStore::new()));
        settings.set_vibration(false).await.unwrap();
        assert!(!eligibility.vibration_enabled());
    }
}
