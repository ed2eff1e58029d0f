// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod dates;
pub mod issue;
pub mod pace;
pub mod schedule;

// Discovery: listing pages → candidates → merged links
pub mod ingest;

// Reconciliation against the schedule and local storage
pub mod gaps;
pub mod latest;
pub mod search;

// Side effects
pub mod download;
pub mod notify;
pub mod storage;

pub mod archiver;
pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::archiver::{Archiver, BackfillReport, Collaborators, LatestReport};
pub use crate::config::ArchiveConfig;
pub use crate::notify::{NotificationEvent, Notifier, NotifierMux};
