//! HTTP client for the PlayBuddy REST API.
//!
//! `ApiClient` owns the base URL and bearer token and exposes one method per
//! HTTP verb. Resource modules build on these; none of them retry.

use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Production API used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "https://api.playbuddy.me";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for PlayBuddy.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Self::parse_base_url(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
        let url = Url::parse(raw)
            .map_err(|e| ApiError::Validation(format!("invalid API base URL {raw:?}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(ApiError::Validation(format!(
                "API base URL {raw:?} cannot carry a path"
            )));
        }
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    /// Build `{base}/{segment}/{segment}...`, encoding each segment on its own
    /// so ids cannot smuggle extra path components.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ApiError::Validation(format!("API base URL {} cannot carry a path", self.base_url))
            })?;
            path.pop_if_empty();
            for segment in segments {
                if segment.is_empty() {
                    return Err(ApiError::Validation(format!(
                        "empty path segment in {segments:?}"
                    )));
                }
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::Validation("token is not a valid header value".into()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Decode a response body. An empty body reads as JSON `null` so
    /// endpoints that answer 204 still work with `()` or `Option<T>`.
    pub(crate) fn parse_body<T: DeserializeOwned>(url: &Url, text: &str) -> Result<T, ApiError> {
        let body = if text.trim().is_empty() { "null" } else { text };
        serde_json::from_str(body).map_err(|source| ApiError::Parse {
            url: url.to_string(),
            source,
        })
    }

    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, ApiError> {
        debug!(method = %method, url = %url, "API request");
        Ok(self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json")
            .headers(self.auth_headers()?))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, url: &Url) -> Result<T, ApiError> {
        let response = request.send().await?;
        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        Self::parse_body(url, &text)
    }

    // ===== Verbs =====

    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        let request = self.request(Method::GET, url.clone())?;
        self.send(request, &url).await
    }

    pub async fn get_with_query<T, Q>(&self, segments: &[&str], query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.endpoint(segments)?;
        let request = self.request(Method::GET, url.clone())?.query(query);
        self.send(request, &url).await
    }

    pub async fn post<T, B>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::POST, segments, body).await
    }

    pub async fn put<T, B>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::PUT, segments, body).await
    }

    pub async fn patch<T, B>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::PATCH, segments, body).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        let request = self.request(Method::DELETE, url.clone())?;
        self.send(request, &url).await
    }

    pub async fn delete_with_body<T, B>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::DELETE, segments, body).await
    }

    async fn send_json<T, B>(&self, method: Method, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(segments)?;
        let request = self.request(method, url.clone())?.json(body);
        self.send(request, &url).await
    }
}
