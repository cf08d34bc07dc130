//! Offline-first transit schedule client.
//!
//! Route and schedule data is resolved from a remote endpoint, a disk cache,
//! a bundled document or a built-in list, in that order. Notification
//! preferences are held in a snapshot that can be queried without I/O, and
//! saved favorites get their reminders re-registered at startup.

pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod favorites;
mod persist;
pub mod preferences;
pub mod reminders;
pub mod repository;
pub mod source;
pub mod startup;
