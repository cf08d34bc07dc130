//! Saved favorite departures.
//!
//! Stores hand back raw [`FavoriteRecord`]s; each one is validated into a
//! [`crate::domain::FavoriteReminder`] separately by whoever consumes it.

mod record;
mod store;

pub use record::FavoriteRecord;
pub use store::{DEFAULT_FAVORITES_FILE, FavoritesStore, JsonFavoritesStore, MemoryFavoritesStore};
