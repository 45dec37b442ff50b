//! Cache key names. Mutations invalidate by these as prefixes.

use crate::query::QueryKey;

pub const ATTENDEES: &str = "attendees";
pub const ORGANIZERS: &str = "organizers";
pub const EVENTS: &str = "events";
pub const UNAPPROVED_EVENTS: &str = "unapproved-events";
pub const IMPORT_SOURCES: &str = "import_sources";
pub const FESTIVAL_SCHEDULE: &str = "doFestivalSchedule";
pub const KINKS: &str = "kinks";
pub const PROMO_CODES: &str = "promoCodes";

pub fn attendees() -> QueryKey {
    QueryKey::new(ATTENDEES)
}

pub fn organizers() -> QueryKey {
    QueryKey::new(ORGANIZERS)
}

pub fn unapproved_events() -> QueryKey {
    QueryKey::new(UNAPPROVED_EVENTS)
}

pub fn festival_schedule() -> QueryKey {
    QueryKey::new(FESTIVAL_SCHEDULE)
}

pub fn kinks() -> QueryKey {
    QueryKey::new(KINKS)
}

pub fn promo_codes() -> QueryKey {
    QueryKey::new(PROMO_CODES)
}
