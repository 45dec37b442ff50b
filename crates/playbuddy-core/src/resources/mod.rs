//! Queries and mutations for each PlayBuddy resource.
//!
//! `DataClient` ties an [`ApiClient`] to a shared [`QueryClient`]. Reads go
//! through the cache under the keys in [`keys`]; writes are [`Mutation`]s
//! that invalidate the collections they change.
//!
//! [`Mutation`]: crate::query::Mutation

mod attendees;
mod events;
mod festival;
mod import_sources;
pub mod keys;
mod kinks;
mod organizers;
mod promo_codes;

#[cfg(test)]
pub(crate) mod test_server;

pub use events::EventsOptions;
pub use import_sources::ImportSourcesOptions;

use crate::api::ApiClient;
use crate::auth::{AuthGate, Session};
use crate::query::{QueryClient, QueryOptions};

#[derive(Clone, Debug)]
pub struct DataClient {
    api: ApiClient,
    queries: QueryClient,
    gate: AuthGate,
    options: QueryOptions,
}

impl DataClient {
    /// The gate starts closed; see [`DataClient::with_session`].
    pub fn new(api: ApiClient, queries: QueryClient) -> Self {
        Self {
            api,
            queries,
            gate: AuthGate::closed(),
            options: QueryOptions::default(),
        }
    }

    /// Authenticate requests with the session's token and open the gate
    /// while the session is valid.
    pub fn with_session(mut self, session: &Session) -> Self {
        self.gate = session.gate();
        if let Some(token) = session.token() {
            self.api = self.api.with_token(token.to_string());
        }
        self
    }

    pub fn with_gate(mut self, gate: AuthGate) -> Self {
        self.gate = gate;
        self
    }

    /// Options applied to every read, before per-resource gating.
    pub fn with_query_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn queries(&self) -> &QueryClient {
        &self.queries
    }

    pub fn gate(&self) -> AuthGate {
        self.gate
    }
}
