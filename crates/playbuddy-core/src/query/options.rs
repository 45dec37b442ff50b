use std::time::Duration;

use crate::auth::AuthGate;

/// Per-call settings for [`QueryClient::fetch_query`](super::QueryClient::fetch_query).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// When false the fetch function is never called. Default `true`.
    pub enabled: bool,
    /// How long cached data counts as fresh. Default zero, so every call
    /// refetches unless another fetch for the key is already running.
    pub stale_time: Duration,
    /// Serve the last persisted response when the network is unreachable.
    /// Only has an effect when the client has an offline store. Default `true`.
    pub offline_fallback: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            stale_time: Duration::ZERO,
            offline_fallback: true,
        }
    }
}

impl QueryOptions {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Narrow `enabled`; never re-enables a disabled query.
    pub fn enabled_if(mut self, condition: bool) -> Self {
        self.enabled = self.enabled && condition;
        self
    }

    pub fn gated_by(self, gate: AuthGate) -> Self {
        self.enabled_if(gate.is_open())
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn without_offline_fallback(mut self) -> Self {
        self.offline_fallback = false;
        self
    }
}
