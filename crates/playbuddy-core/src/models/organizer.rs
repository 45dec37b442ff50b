use serde::{Deserialize, Serialize};

use super::PromoCode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organizer {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub original_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub hidden: Option<bool>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub promo_codes: Vec<PromoCode>,
    #[serde(default)]
    pub instagram_handle: Option<String>,
    #[serde(default)]
    pub fetlife_handle: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fetlife_handles: Vec<String>,
    #[serde(default)]
    pub membership_app_url: Option<String>,
    #[serde(default)]
    pub membership_only: Option<bool>,
    #[serde(default)]
    pub vetted: Option<bool>,
    #[serde(default)]
    pub vetted_instructions: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Organizer {
    pub fn is_hidden(&self) -> bool {
        self.hidden.unwrap_or(false)
    }

    /// Every FetLife handle, single field first, without duplicates.
    pub fn all_fetlife_handles(&self) -> Vec<&str> {
        let mut handles: Vec<&str> = Vec::new();
        for handle in self.fetlife_handle.iter().chain(self.fetlife_handles.iter()) {
            let handle = handle.trim();
            if !handle.is_empty() && !handles.iter().any(|h| h.eq_ignore_ascii_case(handle)) {
                handles.push(handle);
            }
        }
        handles
    }

    /// "Name (#id)" for pickers and confirmations
    pub fn label(&self) -> String {
        format!("{} (#{})", self.name, self.id)
    }
}

/// Body of `PATCH /organizers/{id}`. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizerUpdate {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetlife_handles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram_handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_app_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vetted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vetted_instructions: Option<String>,
}

impl OrganizerUpdate {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

/// Fold one organizer into another. `source_organizer_id` goes in the path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizerMerge {
    #[serde(skip)]
    pub source_organizer_id: i64,
    pub target_organizer_id: i64,
    #[serde(default = "default_true")]
    pub delete_source: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    #[serde(default)]
    pub events_moved: Option<i64>,
    #[serde(default)]
    pub source_deleted: Option<bool>,
}

/// Removal of an organizer's events. `organizer_id` goes in the path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizerEventsDeletion {
    #[serde(skip)]
    pub organizer_id: i64,
    /// Keep events that someone has saved
    #[serde(default)]
    pub only_without_attendees: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DeletedCount {
    #[serde(default)]
    pub deleted: i64,
}
