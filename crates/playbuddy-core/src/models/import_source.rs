use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ApprovalStatus;

/// How events are pulled from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMethod {
    ChromeScraper,
    EbScraper,
    AiScraper,
    CustomScraper,
}

impl std::fmt::Display for ImportMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportMethod::ChromeScraper => write!(f, "chrome_scraper"),
            ImportMethod::EbScraper => write!(f, "eb_scraper"),
            ImportMethod::AiScraper => write!(f, "ai_scraper"),
            ImportMethod::CustomScraper => write!(f, "custom_scraper"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierType {
    Handle,
    Url,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSource {
    pub id: String,
    /// Handle, Eventbrite URL or raw URL
    pub source: String,
    pub method: ImportMethod,
    pub identifier: String,
    #[serde(default)]
    pub identifier_type: Option<IdentifierType>,
    #[serde(default)]
    pub approval_status: Option<ApprovalStatus>,
    #[serde(default)]
    pub skip_existing: Option<bool>,
    #[serde(default)]
    pub message_sent: Option<bool>,
    #[serde(default)]
    pub is_festival: Option<bool>,
    #[serde(default)]
    pub is_excluded: Option<bool>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub event_defaults: Map<String, Value>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl ImportSource {
    /// Organizer the source's events are attributed to, if any.
    pub fn organizer_id(&self) -> Option<i64> {
        ["organizer_id", "organizerId"]
            .iter()
            .find_map(|k| self.event_defaults.get(*k))
            .or_else(|| self.metadata.get("organizer_id"))
            .and_then(|v| match v {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            })
    }

    pub fn is_approved(&self) -> bool {
        self.approval_status == Some(ApprovalStatus::Approved)
    }
}

/// Body of `POST /import_sources`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewImportSource {
    pub source: String,
    pub method: ImportMethod,
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_type: Option<IdentifierType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_defaults: Option<Map<String, Value>>,
}

/// Body of `PATCH /import_sources/{id}`. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSourceUpdate {
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<ImportMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_type: Option<IdentifierType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<ApprovalStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_sent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_excluded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_defaults: Option<Map<String, Value>>,
}

impl ImportSourceUpdate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn approve(id: impl Into<String>) -> Self {
        Self {
            approval_status: Some(ApprovalStatus::Approved),
            ..Self::new(id)
        }
    }
}
