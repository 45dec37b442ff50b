//! Local caching module for offline data access.
//!
//! This module provides the `OfflineStore`, which keeps the last successful
//! response for each query key on disk. Entries expire after a week and the
//! store is trimmed to a fixed number of entries and bytes.

pub mod data;
pub mod offline;

pub use data::CachedData;
pub use offline::{OfflineEntry, OfflineLimits, OfflineStore};
