use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;

/// Minutes in a day, used for age display bucketing.
const MINUTES_PER_DAY: i64 = 1440;

/// One lookup table's contents as of a completed fetch.
///
/// Records keep the order the backend sent them in. A snapshot is only
/// ever replaced as a whole, never merged with a previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub records: Vec<Record>,
    pub fetched_at: DateTime<Utc>,
}

impl TableSnapshot {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            fetched_at: Utc::now(),
        }
    }

    pub fn with_fetched_at(records: Vec<Record>, fetched_at: DateTime<Utc>) -> Self {
        Self { records, fetched_at }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.fetched_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Negative ages come from clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < MINUTES_PER_DAY {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / MINUTES_PER_DAY;
            if (minutes % MINUTES_PER_DAY) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self, max_age_minutes: i64) -> bool {
        self.age_minutes() > max_age_minutes
    }
}
