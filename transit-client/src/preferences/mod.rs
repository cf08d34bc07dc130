//! User notification preferences.
//!
//! Settings live in a [`SettingsStore`]. The [`EligibilityCache`] turns them
//! into a [`NotificationPolicy`] snapshot that alarm callbacks can query
//! synchronously, and [`PreferenceSettings`] writes changes back.

mod eligibility;
mod policy;
mod settings;
mod store;

pub use eligibility::{EligibilityCache, FailurePolicy};
pub use policy::{
    EligibilityError, KEY_MODE, KEY_QUIET_MODE, KEY_QUIET_UNTIL, KEY_SELECTED_DAYS, KEY_VIBRATION,
    NotificationMode, NotificationPolicy, QuietMode, override_days_key, override_mode_key,
};
pub use settings::PreferenceSettings;
pub use store::{
    DEFAULT_SETTINGS_FILE, JsonSettingsStore, MemorySettingsStore, PreferenceValue, SettingsStore,
};
