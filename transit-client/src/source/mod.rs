//! Route data sources.
//!
//! Route and schedule data comes from one of four tiers, in order of
//! preference:
//! - the remote endpoint (HTTP GET of a JSON document)
//! - the disk cache holding the last remote response
//! - the document bundled with the application
//! - a small built-in route list that always parses

mod builtin;
mod bundled;
mod cache;
mod client;
mod payload;
mod resolver;
#[cfg(test)]
pub(crate) mod testing;

pub use builtin::{BUILT_IN_VERSION, built_in_payload};
pub use bundled::BundledSource;
pub use cache::{DEFAULT_CACHE_FILE, PayloadCache};
pub use client::{HttpRemoteSource, RemoteConfig, RemoteSource};
pub use payload::{PayloadDto, RouteDto, ScheduleDto, SourcePayload, Tier, peek_version};
pub use resolver::{CacheConfig, SourceResolver};
