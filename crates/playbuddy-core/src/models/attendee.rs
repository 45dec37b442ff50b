use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Everyone who saved one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAttendees {
    pub event_id: i64,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
}

/// Attendees of `event_id`, without duplicates or placeholder rows.
pub fn attendees_for_event(entries: &[EventAttendees], event_id: i64) -> Vec<&Attendee> {
    let Some(entry) = entries.iter().find(|e| e.event_id == event_id) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    entry
        .attendees
        .iter()
        .filter(|a| !a.id.is_empty() && a.name.trim() != "0")
        .filter(|a| seen.insert(a.id.as_str()))
        .collect()
}

/// Number of attendees per event id.
pub fn attendee_counts(entries: &[EventAttendees]) -> Vec<(i64, usize)> {
    entries
        .iter()
        .map(|e| (e.event_id, attendees_for_event(entries, e.event_id).len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attendee(id: &str, name: &str) -> Attendee {
        Attendee {
            id: id.into(),
            name: name.into(),
            avatar_url: None,
        }
    }

    #[test]
    fn test_attendees_for_event_filters() {
        let entries = vec![
            EventAttendees {
                event_id: 1,
                attendees: vec![
                    attendee("a", "Ann"),
                    attendee("a", "Ann again"),
                    attendee("", "No id"),
                    attendee("z", "0"),
                    attendee("b", "Bea"),
                ],
            },
            EventAttendees {
                event_id: 2,
                attendees: vec![attendee("c", "Cy")],
            },
        ];

        let names: Vec<&str> = attendees_for_event(&entries, 1).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Ann", "Bea"]);
        assert!(attendees_for_event(&entries, 99).is_empty());
        assert_eq!(attendee_counts(&entries), vec![(1, 2), (2, 1)]);
    }
}
