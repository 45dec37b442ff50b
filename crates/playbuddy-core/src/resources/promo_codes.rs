use serde_json::Value;

use super::keys::{EVENTS, PROMO_CODES};
use super::{keys, DataClient};
use crate::api::ApiError;
use crate::models::{PromoCode, PromoCodeEventLink, PromoCodeInput};
use crate::query::{Mutation, QueryState};

impl DataClient {
    pub async fn fetch_promo_codes(&self) -> QueryState<Vec<PromoCode>> {
        let api = self.api.clone();
        self.queries
            .fetch_query(
                keys::promo_codes(),
                move || async move { api.get(&["promo_codes"]).await },
                self.options,
            )
            .await
    }

    pub fn create_promo_code(&self) -> Mutation<PromoCodeInput, PromoCode> {
        let api = self.api.clone();
        Mutation::new(&self.queries, move |input: PromoCodeInput| {
            let api = api.clone();
            async move { api.post(&["promo_codes"], &input).await }
        })
        .invalidates(PROMO_CODES)
    }

    /// `PUT /promo_codes/{id}`; the input must carry an id.
    pub fn update_promo_code(&self) -> Mutation<PromoCodeInput, PromoCode> {
        let api = self.api.clone();
        Mutation::new(&self.queries, move |input: PromoCodeInput| {
            let api = api.clone();
            async move {
                let id = input
                    .id
                    .clone()
                    .ok_or_else(|| ApiError::Validation("promo code update needs an id".into()))?;
                api.put(&["promo_codes", id.as_str()], &input).await
            }
        })
        .invalidates(PROMO_CODES)
    }

    /// Takes the promo code id.
    pub fn delete_promo_code(&self) -> Mutation<String, Value> {
        let api = self.api.clone();
        Mutation::new(&self.queries, move |id: String| {
            let api = api.clone();
            async move { api.delete(&["promo_codes", id.as_str()]).await }
        })
        .invalidates(PROMO_CODES)
    }

    /// Events embed their promo codes, so linking invalidates events.
    pub fn add_promo_code_to_event(&self) -> Mutation<PromoCodeEventLink, Value> {
        let api = self.api.clone();
        Mutation::new(&self.queries, move |link: PromoCodeEventLink| {
            let api = api.clone();
            async move { api.post(&["promo_codes", "events"], &link).await }
        })
        .invalidates(EVENTS)
    }

    pub fn remove_promo_code_from_event(&self) -> Mutation<PromoCodeEventLink, Value> {
        let api = self.api.clone();
        Mutation::new(&self.queries, move |link: PromoCodeEventLink| {
            let api = api.clone();
            async move { api.delete_with_body(&["promo_codes", "events"], &link).await }
        })
        .invalidates(EVENTS)
    }
}
