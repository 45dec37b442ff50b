use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoCode {
    pub id: String,
    #[serde(default)]
    pub organizer_id: Option<i64>,
    pub promo_code: String,
    pub discount: f64,
    /// "percent" or "fixed"
    pub discount_type: String,
    /// "organizer" or "event"
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub commission_percentage: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
}

impl PromoCode {
    pub fn is_percent(&self) -> bool {
        self.discount_type == "percent"
    }

    /// "10% off" or "$10 off"
    pub fn discount_label(&self) -> String {
        let amount = format_amount(self.discount);
        if self.is_percent() {
            format!("{}% off", amount)
        } else {
            format!("${} off", amount)
        }
    }
}

fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Body of `POST /promo_codes` and `PUT /promo_codes/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoCodeInput {
    #[serde(skip)]
    pub id: Option<String>,
    pub organizer_id: i64,
    pub promo_code: String,
    pub discount: f64,
    pub discount_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub commission_percentage: f64,
}

/// Link between a promo code and an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoCodeEventLink {
    pub promo_code_id: String,
    pub event_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn code(discount: f64, discount_type: &str) -> PromoCode {
        serde_json::from_value(json!({
            "id": "p1",
            "organizer_id": null,
            "promo_code": "SAVE",
            "discount": discount,
            "discount_type": discount_type,
        }))
        .unwrap()
    }

    #[test]
    fn test_discount_label() {
        assert_eq!(code(10.0, "percent").discount_label(), "10% off");
        assert_eq!(code(10.0, "fixed").discount_label(), "$10 off");
        assert_eq!(code(7.5, "fixed").discount_label(), "$7.50 off");
    }

    #[test]
    fn test_input_body_omits_id() {
        let input = PromoCodeInput {
            id: Some("p1".into()),
            organizer_id: 3,
            promo_code: "SAVE".into(),
            discount: 15.0,
            discount_type: "percent".into(),
            scope: None,
            commission_percentage: 10.0,
        };
        let body = serde_json::to_value(&input).unwrap();
        assert!(body.get("id").is_none());
        assert_eq!(body["organizer_id"], 3);
    }
}
