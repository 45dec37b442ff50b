use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A play idea from the kinks catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kink {
    pub id: i64,
    pub idea_title: String,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub materials_required: Option<String>,
    #[serde(default)]
    pub idea_description: Option<String>,
    /// Free-form JSON; usually an array of category names
    #[serde(default)]
    pub categories: Option<Value>,
    #[serde(default)]
    pub recommended: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub to_do_priority: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Kink {
    pub fn category_names(&self) -> Vec<&str> {
        match &self.categories {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(single)) => vec![single.as_str()],
            _ => Vec::new(),
        }
    }

    pub fn is_recommended(&self) -> bool {
        self.recommended.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_names() {
        let mut kink: Kink = serde_json::from_value(json!({
            "id": 1,
            "idea_title": "Blindfold",
            "categories": ["sensory", 3, "beginner"],
            "recommended": null
        }))
        .unwrap();
        assert_eq!(kink.category_names(), vec!["sensory", "beginner"]);
        assert!(!kink.is_recommended());

        kink.categories = Some(json!("rope"));
        assert_eq!(kink.category_names(), vec!["rope"]);
        kink.categories = None;
        assert!(kink.category_names().is_empty());
    }
}
