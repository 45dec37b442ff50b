//! Cached queries and the mutations that invalidate them.
//!
//! - `QueryKey` / `QueryFilter`: identity of cached data and how to select it
//! - `QueryClient`: the shared cache, with in-flight de-duplication
//! - `Mutation`: a write plus the filters it invalidates on success

pub mod client;
pub mod key;
pub mod mutation;
pub mod options;
pub mod state;

pub use client::QueryClient;
pub use key::{KeyPart, QueryFilter, QueryKey};
pub use mutation::Mutation;
pub use options::QueryOptions;
pub use state::{QueryState, QueryStatus};
