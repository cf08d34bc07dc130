//! The in-memory route catalog.
//!
//! The catalog is built once from the source tiers and published through a
//! `watch` channel. Reads never wait on I/O: they clone the current `Arc`.
//! A refresh builds a new catalog and swaps it in whole.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Weekday;
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use crate::domain::{Route, RouteId, ScheduleEntry};
use crate::source::{SourcePayload, SourceResolver, Tier, built_in_payload};

/// An immutable set of routes with lookup by id.
#[derive(Debug, Default)]
pub struct RouteCatalog {
    routes: Vec<Route>,
    index: HashMap<RouteId, usize>,
    origin: Option<Tier>,
}

impl RouteCatalog {
    fn new(routes: Vec<Route>, origin: Tier) -> Self {
        let index = routes
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        Self {
            routes,
            index,
            origin: Some(origin),
        }
    }

    fn from_payload(payload: &SourcePayload) -> Self {
        Self::new(payload.routes.clone(), payload.origin)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn get(&self, id: &RouteId) -> Option<&Route> {
        self.index.get(id).map(|&i| &self.routes[i])
    }

    /// Tier the routes came from; `None` before the first load.
    pub fn origin(&self) -> Option<Tier> {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Owner of the route catalog.
pub struct RouteRepository {
    resolver: Arc<SourceResolver>,
    catalog: watch::Sender<Arc<RouteCatalog>>,
    /// Held across the whole load-and-publish sequence; true once loaded.
    initialized: Mutex<bool>,
    loads: AtomicUsize,
}

impl RouteRepository {
    /// Create a repository with an empty catalog. Call [`init`](Self::init)
    /// to load it.
    pub fn new(resolver: Arc<SourceResolver>) -> Self {
        let (catalog, _) = watch::channel(Arc::new(RouteCatalog::default()));
        Self {
            resolver,
            catalog,
            initialized: Mutex::new(false),
            loads: AtomicUsize::new(0),
        }
    }

    /// Load the catalog once.
    ///
    /// Concurrent callers wait for the first load to finish; later calls
    /// return immediately. Never fails: if no tier yields routes the catalog
    /// stays empty and is still considered initialized.
    pub async fn init(&self) {
        let mut initialized = self.initialized.lock().await;
        if *initialized {
            return;
        }

        self.loads.fetch_add(1, Ordering::SeqCst);
        let catalog = self.load_catalog().await;
        info!(
            routes = catalog.len(),
            origin = ?catalog.origin(),
            "Route catalog initialized"
        );

        self.catalog.send_replace(Arc::new(catalog));
        *initialized = true;
    }

    async fn load_catalog(&self) -> RouteCatalog {
        let primary = self.resolver.fetch(false).await;
        if !primary.is_empty() {
            return RouteCatalog::from_payload(&primary);
        }
        warn!(tier = %primary.origin, "Resolved route data is empty, trying bundled routes");

        match self.resolver.load_tier(Tier::Bundled).await {
            Ok(bundled) if !bundled.is_empty() => return RouteCatalog::from_payload(&bundled),
            Ok(_) => warn!("Bundled route data is empty"),
            Err(e) => warn!(error = %e, "Bundled route data unavailable"),
        }

        let built_in = built_in_payload();
        if built_in.is_empty() {
            warn!("No valid built-in routes, catalog will be empty");
        }
        RouteCatalog::from_payload(&built_in)
    }

    /// Whether [`init`](Self::init) has completed.
    pub async fn is_initialized(&self) -> bool {
        *self.initialized.lock().await
    }

    /// Number of load sequences run so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Current catalog. Never blocks on I/O.
    pub fn catalog(&self) -> Arc<RouteCatalog> {
        self.catalog.borrow().clone()
    }

    /// All routes in the current catalog.
    pub fn all_routes(&self) -> Vec<Route> {
        self.catalog().routes().to_vec()
    }

    /// Live view of the catalog; notified whenever it is replaced.
    pub fn subscribe(&self) -> watch::Receiver<Arc<RouteCatalog>> {
        self.catalog.subscribe()
    }

    /// Look up a route by id. Blank ids never match.
    pub fn route_by_id(&self, id: &str) -> Option<Route> {
        let id = RouteId::parse(id).ok()?;
        self.catalog().get(&id).cloned()
    }

    /// Case-insensitive search over route number, name and description.
    ///
    /// A blank query returns every route.
    pub fn search_routes(&self, query: &str) -> Vec<Route> {
        let catalog = self.catalog();
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return catalog.routes().to_vec();
        }
        catalog
            .routes()
            .iter()
            .filter(|r| r.matches_lowercase(&needle))
            .cloned()
            .collect()
    }

    /// Re-download the route data and replace the catalog.
    ///
    /// Returns false, leaving the catalog untouched, unless the remote tier
    /// answered with at least one valid route.
    pub async fn refresh_from_remote(&self) -> bool {
        let mut initialized = self.initialized.lock().await;

        self.resolver.clear_cache().await;
        let payload = self.resolver.fetch(true).await;

        if payload.origin != Tier::Remote {
            warn!(tier = %payload.origin, "Route refresh failed, keeping current catalog");
            return false;
        }
        if payload.is_empty() {
            warn!("Remote route data is empty, keeping current catalog");
            return false;
        }

        info!(routes = payload.routes.len(), "Route catalog refreshed");
        self.catalog
            .send_replace(Arc::new(RouteCatalog::from_payload(&payload)));
        *initialized = true;
        true
    }

    /// Whether the remote data version differs from the cached one.
    pub async fn check_for_data_updates(&self) -> bool {
        self.resolver.check_for_update().await
    }

    /// Version of the data in use.
    pub async fn data_version(&self) -> Option<String> {
        self.resolver.data_version().await
    }

    /// Departures for one route, loaded on demand. Empty if none are known.
    pub async fn schedules_for_route(
        &self,
        route_id: &str,
        force_refresh: bool,
    ) -> Arc<Vec<ScheduleEntry>> {
        match RouteId::parse(route_id) {
            Ok(id) => self.resolver.schedules_for_route(&id, force_refresh).await,
            Err(_) => Arc::new(Vec::new()),
        }
    }

    /// Departures for one route that run on `day`, in departure order.
    pub async fn departures_on(&self, route_id: &str, day: Weekday) -> Vec<ScheduleEntry> {
        self.schedules_for_route(route_id, false)
            .await
            .iter()
            .filter(|entry| entry.days.runs_on(day))
            .cloned()
            .collect()
    }
}
