use std::future::Future;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, warn};

use super::{QueryClient, QueryFilter};
use crate::api::ApiError;
use crate::auth::AuthGate;

type MutationFn<I, O> = Box<dyn Fn(I) -> BoxFuture<'static, Result<O, ApiError>> + Send + Sync>;
type FilterFn<I> = Box<dyn Fn(&I) -> Vec<QueryFilter> + Send + Sync>;

/// A write against the API that invalidates cached queries once it succeeds.
///
/// ```ignore
/// let update = Mutation::new(&queries, move |input| api.patch(...))
///     .invalidates("organizers")
///     .invalidates("events");
/// update.mutate(input).await?;
/// ```
pub struct Mutation<I, O> {
    client: QueryClient,
    mutate_fn: MutationFn<I, O>,
    invalidates: Vec<QueryFilter>,
    invalidates_with: Vec<FilterFn<I>>,
    gate: AuthGate,
}

impl<I, O> Mutation<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn new<F, Fut>(client: &QueryClient, mutate_fn: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, ApiError>> + Send + 'static,
    {
        Self {
            client: client.clone(),
            mutate_fn: Box::new(move |input| mutate_fn(input).boxed()),
            invalidates: Vec::new(),
            invalidates_with: Vec::new(),
            gate: AuthGate::open(),
        }
    }

    /// Invalidate `filter` after every successful call.
    pub fn invalidates(mut self, filter: impl Into<QueryFilter>) -> Self {
        self.invalidates.push(filter.into());
        self
    }

    /// Invalidate filters derived from the input, for keys that embed an id.
    pub fn invalidates_with<F>(mut self, filters: F) -> Self
    where
        F: Fn(&I) -> Vec<QueryFilter> + Send + Sync + 'static,
    {
        self.invalidates_with.push(Box::new(filters));
        self
    }

    /// Refuse to run unless `gate` is open.
    pub fn gated_by(mut self, gate: AuthGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn filters(&self) -> &[QueryFilter] {
        &self.invalidates
    }

    /// Run the mutation. On success every configured filter is invalidated
    /// before this returns; on failure the cache is left untouched.
    pub async fn mutate(&self, input: I) -> Result<O, ApiError> {
        if !self.gate.is_open() {
            debug!("Mutation refused, not signed in");
            return Err(ApiError::Unauthenticated);
        }

        // The input moves into the request, so derive its filters first
        let mut filters = self.invalidates.clone();
        for derive in &self.invalidates_with {
            filters.extend(derive(&input));
        }

        match (self.mutate_fn)(input).await {
            Ok(output) => {
                for filter in &filters {
                    let count = self.client.invalidate_queries(filter);
                    debug!(filter = %filter, count, "Invalidated after mutation");
                }
                Ok(output)
            }
            Err(e) => {
                warn!(error = %e, "Mutation failed");
                Err(e)
            }
        }
    }
}
