//! Tiered route data resolution.
//!
//! Tiers are tried in order: remote, disk cache, bundled, built-in. The
//! built-in list cannot fail, so a caller always gets some data back.
//!
//! Parsed data is kept in memory: the whole document once, and per-route
//! schedules separately in a bounded cache with a TTL.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::{RouteId, ScheduleEntry};
use crate::error::SourceError;

use super::bundled::BundledSource;
use super::builtin::built_in_payload;
use super::cache::PayloadCache;
use super::client::RemoteSource;
use super::payload::{SourcePayload, Tier, peek_version};

/// Fallback tiers after a failed remote fetch, before the built-in list.
const FALLBACK_TIERS: [Tier; 2] = [Tier::DiskCache, Tier::Bundled];

/// Configuration for the in-memory schedule cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached per-route schedules.
    pub ttl: Duration,

    /// Maximum number of routes with cached schedules.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            max_capacity: 200,
        }
    }
}

/// Resolves route data from the available tiers.
pub struct SourceResolver {
    remote: Arc<dyn RemoteSource>,
    disk: PayloadCache,
    bundled: BundledSource,

    /// Last resolved document.
    memory: RwLock<Option<Arc<SourcePayload>>>,

    /// Departures per route id.
    schedules: MokaCache<RouteId, Arc<Vec<ScheduleEntry>>>,
}

impl SourceResolver {
    pub fn new(
        remote: Arc<dyn RemoteSource>,
        disk: PayloadCache,
        bundled: BundledSource,
        cache_config: &CacheConfig,
    ) -> Self {
        let schedules = MokaCache::builder()
            .time_to_live(cache_config.ttl)
            .max_capacity(cache_config.max_capacity)
            .build();

        Self {
            remote,
            disk,
            bundled,
            memory: RwLock::new(None),
            schedules,
        }
    }

    /// Resolve the route document.
    ///
    /// The remote tier is only tried when `force_refresh` is set or nothing
    /// is cached in memory yet. Never fails: the last resort is the built-in
    /// route list.
    pub async fn fetch(&self, force_refresh: bool) -> Arc<SourcePayload> {
        if force_refresh {
            self.clear_cache().await;
        } else if let Some(cached) = self.memory.read().await.clone() {
            return cached;
        }

        let payload = match self.fetch_remote().await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Remote route fetch failed, using fallback tiers");
                self.fallback().await
            }
        };

        let payload = Arc::new(payload);
        *self.memory.write().await = Some(payload.clone());
        payload
    }

    /// Load a single tier without touching the in-memory cache.
    pub async fn load_tier(&self, tier: Tier) -> Result<SourcePayload, SourceError> {
        match tier {
            Tier::Remote => self.fetch_remote().await,
            Tier::DiskCache => {
                let body = self.disk.load().await?;
                SourcePayload::parse(&body, Tier::DiskCache)
            }
            Tier::Bundled => {
                let body = self.bundled.load().await?;
                SourcePayload::parse(&body, Tier::Bundled)
            }
            Tier::BuiltIn => Ok(built_in_payload()),
        }
    }

    /// Fetch and parse the remote document, then persist it to disk.
    ///
    /// A failed cache write is logged and otherwise ignored. Documents with
    /// no valid routes are returned but not persisted, so they never replace
    /// usable offline data.
    async fn fetch_remote(&self) -> Result<SourcePayload, SourceError> {
        let body = self.remote.fetch_raw().await?;
        let payload = SourcePayload::parse(&body, Tier::Remote)?;

        if payload.is_empty() {
            warn!("Remote route data has no valid routes, not caching");
        } else if let Err(e) = self.disk.save(&body).await {
            warn!(path = %self.disk.path().display(), error = %e, "Failed to write route cache");
        }

        info!(
            routes = payload.routes.len(),
            version = payload.version.as_deref().unwrap_or("-"),
            "Fetched remote route data"
        );
        Ok(payload)
    }

    async fn fallback(&self) -> SourcePayload {
        for tier in FALLBACK_TIERS {
            match self.load_tier(tier).await {
                Ok(payload) if !payload.is_empty() => {
                    let cache_age = match tier {
                        Tier::DiskCache => self.disk.age().await.map(|age| age.as_secs()),
                        _ => None,
                    };
                    info!(
                        tier = %tier,
                        routes = payload.routes.len(),
                        cache_age_secs = ?cache_age,
                        "Loaded route data"
                    );
                    return payload;
                }
                Ok(_) => debug!(tier = %tier, "Tier has no valid routes"),
                Err(e) => debug!(tier = %tier, error = %e, "Tier unavailable"),
            }
        }

        warn!("No route data tier available, using built-in routes");
        built_in_payload()
    }

    /// Check whether the remote document differs from the disk-cached one.
    ///
    /// Returns false if the remote cannot be fetched or parsed. Returns true
    /// if nothing with a version has been cached yet.
    pub async fn check_for_update(&self) -> bool {
        let remote_version = match self.remote.fetch_raw().await {
            Ok(body) => match SourcePayload::parse(&body, Tier::Remote) {
                Ok(payload) => payload.version,
                Err(e) => {
                    warn!(error = %e, "Remote route data is invalid");
                    return false;
                }
            },
            Err(e) => {
                debug!(error = %e, "Update check failed");
                return false;
            }
        };

        let cached_version = self.disk.load().await.ok().and_then(|b| peek_version(&b));

        match cached_version {
            None => true,
            Some(cached) => remote_version.as_deref() != Some(cached.as_str()),
        }
    }

    /// Version of the data currently in use, or of the disk cache if nothing
    /// has been resolved yet.
    pub async fn data_version(&self) -> Option<String> {
        if let Some(payload) = self.memory.read().await.as_ref() {
            return payload.version.clone();
        }
        self.disk.load().await.ok().and_then(|b| peek_version(&b))
    }

    /// Departures for one route.
    ///
    /// Tiers are searched in order starting from the resolved document; the
    /// first non-empty list wins. Returns an empty list if no tier has any.
    pub async fn schedules_for_route(
        &self,
        route_id: &RouteId,
        force_refresh: bool,
    ) -> Arc<Vec<ScheduleEntry>> {
        if force_refresh {
            self.schedules.invalidate(route_id).await;
        } else if let Some(cached) = self.schedules.get(route_id).await {
            return cached;
        }

        let primary = self.fetch(force_refresh).await;
        let mut entries = primary.schedules_for(route_id).to_vec();

        if entries.is_empty() {
            for tier in [Tier::DiskCache, Tier::Bundled, Tier::BuiltIn] {
                if tier <= primary.origin {
                    continue;
                }
                match self.load_tier(tier).await {
                    Ok(payload) if !payload.schedules_for(route_id).is_empty() => {
                        debug!(route_id = %route_id, tier = %tier, "Schedules from lower tier");
                        entries = payload.schedules_for(route_id).to_vec();
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => debug!(tier = %tier, error = %e, "Tier unavailable"),
                }
            }
        }

        let entries = Arc::new(entries);
        if !entries.is_empty() {
            self.schedules.insert(route_id.clone(), entries.clone()).await;
        }
        entries
    }

    /// Drop the in-memory document and all cached schedules.
    ///
    /// The disk cache is left alone; the next remote success overwrites it.
    pub async fn clear_cache(&self) {
        *self.memory.write().await = None;
        self.schedules.invalidate_all();
    }

    #[cfg(test)]
    fn cached_schedule_count(&self) -> u64 {
        self.schedules.entry_count()
    }
}
