//! PlayBuddy core - data access for the PlayBuddy events directory.
//!
//! Views ask a [`resources::DataClient`] for events, organizers, attendees,
//! import sources, kinks, promo codes and the festival schedule. Reads are
//! cached in a shared [`query::QueryClient`]; writes are
//! [`query::Mutation`]s that invalidate what they change.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod promo;
pub mod query;
pub mod resources;
pub mod utils;

pub use api::{ApiClient, ApiError, ErrorKind};
pub use auth::{AuthGate, Session, SessionData};
pub use cache::{OfflineLimits, OfflineStore};
pub use config::Config;
pub use promo::{add_promo_code, add_promo_code_or_original, PromoError};
pub use query::{Mutation, QueryClient, QueryFilter, QueryKey, QueryOptions, QueryState, QueryStatus};
pub use resources::{DataClient, EventsOptions, ImportSourcesOptions};
