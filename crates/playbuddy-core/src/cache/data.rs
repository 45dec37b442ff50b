use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A payload plus the moment it was cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.cached_at
    }

    pub fn age_minutes(&self) -> i64 {
        self.age().num_minutes()
    }

    /// True once the payload is at least `max_age` old. A zero `max_age`
    /// makes every payload stale.
    pub fn is_older_than(&self, max_age: Duration) -> bool {
        match chrono::Duration::from_std(max_age) {
            Ok(max_age) => self.age() >= max_age,
            // Larger than chrono can represent, so nothing is ever that old
            Err(_) => false,
        }
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CachedData<U> {
        CachedData {
            data: f(self.data),
            cached_at: self.cached_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_data_age_display() {
        let mut cached = CachedData::new(vec![1, 2, 3]);
        assert_eq!(cached.age_display(), "just now");

        cached.cached_at = Utc::now() - chrono::Duration::minutes(5);
        assert_eq!(cached.age_display(), "5m ago");

        cached.cached_at = Utc::now() - chrono::Duration::minutes(95);
        assert_eq!(cached.age_display(), "2h ago");

        cached.cached_at = Utc::now() - chrono::Duration::hours(30);
        assert_eq!(cached.age_display(), "1d ago");

        // Clock skew
        cached.cached_at = Utc::now() + chrono::Duration::minutes(10);
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_is_older_than() {
        let fresh = CachedData::new(1);
        assert!(!fresh.is_older_than(Duration::from_secs(60)));
        assert!(fresh.is_older_than(Duration::ZERO));
        assert!(!fresh.is_older_than(Duration::MAX));

        let mut old = CachedData::new(1);
        old.cached_at = Utc::now() - chrono::Duration::minutes(61);
        assert!(old.is_older_than(Duration::from_secs(60 * 60)));
    }

    #[test]
    fn test_map_keeps_timestamp() {
        let cached = CachedData::new(2);
        let at = cached.cached_at;
        let mapped = cached.map(|n| n * 10);
        assert_eq!(mapped.data, 20);
        assert_eq!(mapped.cached_at, at);
    }
}
