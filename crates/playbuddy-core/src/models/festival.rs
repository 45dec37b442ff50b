use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Sessions without an end time are shown as this long.
pub const DEFAULT_SESSION_MINUTES: i64 = 60;

/// One session of the festival schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FestivalScheduleEvent {
    pub name: String,
    pub start_date: String,
    // The feed has shipped the misspelled key
    #[serde(default, alias = "endDAte")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub organizers: Vec<String>,
}

/// Wall-clock time as written in the feed, ignoring any offset.
fn parse_local(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

impl FestivalScheduleEvent {
    /// Stable identity used for favorites.
    pub fn session_id(&self) -> String {
        format!(
            "{}__{}__{}__{}",
            self.start_date,
            self.end_date.as_deref().unwrap_or(""),
            self.name,
            self.location.as_deref().unwrap_or("")
        )
    }

    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        parse_local(&self.start_date)
    }

    pub fn ends_at(&self) -> Option<NaiveDateTime> {
        match self.end_date.as_deref().and_then(parse_local) {
            Some(end) => Some(end),
            None => self
                .starts_at()
                .map(|start| start + Duration::minutes(DEFAULT_SESSION_MINUTES)),
        }
    }

    pub fn day(&self) -> Option<NaiveDate> {
        self.starts_at().map(|dt| dt.date())
    }

    /// "7:00 PM - 8:00 PM"
    pub fn time_range(&self) -> Option<String> {
        let start = self.starts_at()?;
        let end = self.ends_at()?;
        Some(format!("{} - {}", clock(start), clock(end)))
    }

    /// Case-insensitive match on name, location, description or organizers.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        std::iter::once(self.name.as_str())
            .chain(self.location.as_deref())
            .chain(self.description.as_deref())
            .chain(self.organizers.iter().map(String::as_str))
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

fn clock(dt: NaiveDateTime) -> String {
    dt.format("%-I:%M %p").to_string()
}

/// Sessions grouped by day, days ascending, sessions by start time.
/// Sessions with an unreadable start are left out.
pub fn group_by_day(events: &[FestivalScheduleEvent]) -> BTreeMap<NaiveDate, Vec<&FestivalScheduleEvent>> {
    let mut days: BTreeMap<NaiveDate, Vec<&FestivalScheduleEvent>> = BTreeMap::new();
    for event in events {
        if let Some(day) = event.day() {
            days.entry(day).or_default().push(event);
        }
    }
    for sessions in days.values_mut() {
        sessions.sort_by_key(|e| e.starts_at());
    }
    days
}
