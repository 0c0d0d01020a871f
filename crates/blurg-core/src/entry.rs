//! Journal entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display format for entry timestamps: `month-day-year hour:minute`.
pub const DATE_FORMAT: &str = "%m-%d-%Y %H:%M";

/// A single journal record. Entries are never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Positive id, unique within its diary and increasing with insertion
    pub id: u64,

    /// Entry body, trimmed on read
    pub text: String,

    /// Creation time
    pub date: DateTime<Utc>,
}

impl Entry {
    pub fn new(id: u64, text: impl AsRef<str>, date: DateTime<Utc>) -> Self {
        Self {
            id,
            text: text.as_ref().trim().to_string(),
            date,
        }
    }

    /// Render the stored timestamp for display.
    pub fn date_str(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_date_str_is_zero_padded_24h() {
        let date = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap();
        let entry = Entry::new(1, "Text 1", date);
        assert_eq!(entry.date_str(), "03-07-2024 09:05");

        let date = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let entry = Entry::new(2, "Text 2", date);
        assert_eq!(entry.date_str(), "12-31-2023 23:59");
    }

    #[test]
    fn test_date_str_matches_strftime_of_stored_date() {
        let entry = Entry::new(1, "Entry Test", Utc::now());
        assert_eq!(entry.date.format("%m-%d-%Y %H:%M").to_string(), entry.date_str());
    }

    #[test]
    fn test_text_is_trimmed() {
        let entry = Entry::new(1, "  Text 1\n", Utc::now());
        assert_eq!(entry.text, "Text 1");
    }
}
