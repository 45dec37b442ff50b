//! Data models for PlayBuddy resources.
//!
//! - `Event`, `EventUpdate`: the event directory
//! - `Organizer` and its update/merge/deletion bodies
//! - `EventAttendees`, `Attendee`: who saved which event
//! - `ImportSource`: where scraped events come from
//! - `Kink`, `PromoCode`, `FestivalScheduleEvent`

pub mod attendee;
pub mod event;
pub mod festival;
pub mod import_source;
pub mod kink;
pub mod organizer;
pub mod promo_code;

use serde::{Deserialize, Serialize};

pub use attendee::{attendee_counts, attendees_for_event, Attendee, EventAttendees};
pub use event::{Event, EventUpdate, Visibility};
pub use festival::{group_by_day, FestivalScheduleEvent};
pub use import_source::{IdentifierType, ImportMethod, ImportSource, ImportSourceUpdate, NewImportSource};
pub use kink::Kink;
pub use organizer::{DeletedCount, MergeOutcome, Organizer, OrganizerEventsDeletion, OrganizerMerge, OrganizerUpdate};
pub use promo_code::{PromoCode, PromoCodeEventLink, PromoCodeInput};

/// Review state shared by events and import sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApprovalStatus::Pending => write!(f, "pending"),
            ApprovalStatus::Approved => write!(f, "approved"),
            ApprovalStatus::Rejected => write!(f, "rejected"),
        }
    }
}
