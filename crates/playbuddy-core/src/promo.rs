//! Promo-code links.
//!
//! Ticket links for events with a promo code carry the code and the
//! PlayBuddy affiliate tag as query parameters.

use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::api::ErrorKind;

const AFFILIATE_PARAM: &str = "aff";
const AFFILIATE_TAG: &str = "playbuddy";
const DISCOUNT_PARAM: &str = "discount";

#[derive(Error, Debug)]
pub enum PromoError {
    #[error("Invalid URL '{input}': {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },
}

impl PromoError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Add `discount=<code>` and `aff=playbuddy` to `url`.
///
/// Existing `discount` and `aff` values are replaced; all other parameters
/// keep their order. Applying the same code twice gives the same URL.
pub fn add_promo_code(url: &str, code: &str) -> Result<String, PromoError> {
    let mut parsed = Url::parse(url).map_err(|source| PromoError::InvalidUrl {
        input: url.to_string(),
        source,
    })?;

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(name, _)| name != AFFILIATE_PARAM && name != DISCOUNT_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(AFFILIATE_PARAM, AFFILIATE_TAG)
        .append_pair(DISCOUNT_PARAM, code);

    Ok(parsed.to_string())
}

/// Link to open for an event: the promo link when there is a code and the
/// URL parses, otherwise the URL unchanged.
pub fn add_promo_code_or_original(url: &str, code: Option<&str>) -> String {
    let Some(code) = code.filter(|c| !c.is_empty()) else {
        return url.to_string();
    };
    match add_promo_code(url, code) {
        Ok(link) => link,
        Err(e) => {
            warn!(error = %e, "Not adding promo code to link");
            url.to_string()
        }
    }
}
