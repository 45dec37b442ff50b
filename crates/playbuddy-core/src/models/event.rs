use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApprovalStatus, Organizer, PromoCode};
use crate::promo::add_promo_code_or_original;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    #[serde(default)]
    pub original_id: Option<String>,
    pub name: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub ticket_url: Option<String>,
    #[serde(default)]
    pub event_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub short_price: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub approval_status: Option<ApprovalStatus>,
    #[serde(default)]
    pub hidden: Option<bool>,
    // Only shown on facilitator profiles
    #[serde(default)]
    pub facilitator_only: bool,
    #[serde(default)]
    pub non_ny: bool,
    #[serde(default)]
    pub weekly_pick: bool,
    #[serde(default)]
    pub organizer_id: Option<i64>,
    #[serde(default)]
    pub organizer: Option<Organizer>,
    #[serde(default)]
    pub promo_codes: Vec<PromoCode>,
}

/// Fields accepted by `PATCH /events/{id}`. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventUpdate {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<ApprovalStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_pick: Option<bool>,
    /// Anything else the endpoint accepts
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Event {
    fn start(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.start_date).ok()
    }

    pub fn formatted_date(&self) -> String {
        match self.start() {
            Some(dt) => dt.format("%b %d, %Y").to_string(),
            // Fall back to the raw date
            None => self.start_date.chars().take(10).collect(),
        }
    }

    pub fn formatted_time(&self) -> Option<String> {
        self.start().map(|dt| dt.format("%H:%M").to_string())
    }

    /// Compact date/time for list view: "Jan 26 5:00p"
    pub fn formatted_datetime_short(&self) -> String {
        match self.start() {
            Some(dt) => {
                let hour = dt.format("%I").to_string().trim_start_matches('0').to_string();
                let minute = dt.format("%M");
                let ampm = if dt.format("%p").to_string() == "AM" { "a" } else { "p" };
                format!("{} {}:{}{}", dt.format("%b %d"), hour, minute, ampm)
            }
            None => self.formatted_date(),
        }
    }

    pub fn organizer_name(&self) -> &str {
        self.organizer.as_ref().map_or("", |o| o.name.as_str())
    }

    /// Event-specific codes win over the organizer's.
    pub fn promo_code(&self) -> Option<&PromoCode> {
        self.promo_codes.first().or_else(|| {
            self.organizer
                .as_ref()
                .and_then(|o| o.promo_codes.first())
        })
    }

    /// Where "get tickets" should go, carrying the promo code if there is one.
    pub fn ticket_link(&self) -> Option<String> {
        let url = self.ticket_url.as_deref().or(self.event_url.as_deref())?;
        let code = self.promo_code().map(|p| p.promo_code.as_str());
        Some(add_promo_code_or_original(url, code))
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Event {
        serde_json::from_value(json!({
            "id": 12,
            "name": "Rope Jam",
            "start_date": "2025-01-26T17:00:00-05:00",
            "end_date": "2025-01-26T20:00:00-05:00",
            "ticket_url": "https://tickets.example.com/e/12?src=pb",
            "type": "workshop",
            "organizer": {
                "id": 3,
                "name": "Knot House",
                "promo_codes": [{
                    "id": "org-code",
                    "organizer_id": 3,
                    "promo_code": "KNOTS",
                    "discount": 10,
                    "discount_type": "percent"
                }]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_deserializes_sparse_event() {
        let event = sample();
        assert_eq!(event.event_type.as_deref(), Some("workshop"));
        assert_eq!(event.visibility, Visibility::Public);
        assert!(event.promo_codes.is_empty());
        assert!(!event.facilitator_only);
        assert_eq!(event.organizer_name(), "Knot House");
    }

    #[test]
    fn test_date_formatting() {
        let event = sample();
        assert_eq!(event.formatted_date(), "Jan 26, 2025");
        assert_eq!(event.formatted_time().as_deref(), Some("17:00"));
        assert_eq!(event.formatted_datetime_short(), "Jan 26 5:00p");

        let mut raw = sample();
        raw.start_date = "2025-01-26 sometime".into();
        assert_eq!(raw.formatted_date(), "2025-01-26");
        assert!(raw.formatted_time().is_none());
    }

    #[test]
    fn test_ticket_link_uses_organizer_code() {
        let event = sample();
        assert_eq!(
            event.ticket_link().as_deref(),
            Some("https://tickets.example.com/e/12?src=pb&aff=playbuddy&discount=KNOTS")
        );
    }

    #[test]
    fn test_event_code_wins() {
        let mut event = sample();
        let mut code = event.promo_code().unwrap().clone();
        code.promo_code = "EVENT5".into();
        event.promo_codes.push(code);
        assert_eq!(event.promo_code().map(|p| p.promo_code.as_str()), Some("EVENT5"));
    }

    #[test]
    fn test_update_body_omits_id_and_unset_fields() {
        let update = EventUpdate {
            id: 12,
            hidden: Some(true),
            ..EventUpdate::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"hidden": true}));
    }
}
