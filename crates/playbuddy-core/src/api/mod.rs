//! REST API client module for PlayBuddy services.
//!
//! This module provides the `ApiClient` used by every resource binding.
//! Requests carry an optional bearer token taken from the current session.

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_API_BASE_URL};
pub use error::{ApiError, ErrorKind};
