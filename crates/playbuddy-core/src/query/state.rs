use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Nothing fetched yet, or the query is disabled
    Idle,
    Loading,
    Success,
    Error,
}

impl std::fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryStatus::Idle => write!(f, "idle"),
            QueryStatus::Loading => write!(f, "loading"),
            QueryStatus::Success => write!(f, "success"),
            QueryStatus::Error => write!(f, "error"),
        }
    }
}

/// What a view renders for one query: data, a loading flag or an error.
///
/// On error, `data` still holds whatever was cached before the failed
/// attempt.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub error: Option<Arc<ApiError>>,
    pub status: QueryStatus,
    pub is_loading: bool,
    pub updated_at: Option<DateTime<Utc>>,
    /// Data came from the offline store rather than the network
    pub from_offline: bool,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            status: QueryStatus::Idle,
            is_loading: false,
            updated_at: None,
            from_offline: false,
        }
    }
}

impl<T> QueryState<T> {
    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// Error wins over data; an idle query yields `Ok(None)`.
    pub fn into_result(self) -> Result<Option<T>, Arc<ApiError>> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.data),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryState<U> {
        QueryState {
            data: self.data.map(f),
            error: self.error,
            status: self.status,
            is_loading: self.is_loading,
            updated_at: self.updated_at,
            from_offline: self.from_offline,
        }
    }
}
