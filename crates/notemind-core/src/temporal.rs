//! Named date ranges used by note search.
//!
//! Ranges are evaluated against a note's `updated_at` in UTC. `Pinned` is a
//! pseudo-range that selects pinned notes and ignores dates entirely.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Note;

// =============================================================================
// NAMED DATE RANGES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    /// Since 00:00 today
    Today,
    /// Since Monday 00:00 of the current week
    ThisWeek,
    /// The previous Monday-to-Monday week
    LastWeek,
    /// Last 30 days
    LastMonth,
    /// Last 365 days
    LastYear,
    /// Pinned notes, no date restriction
    Pinned,
}

impl DateRange {
    /// Parse a range name leniently ("this week", "this-week", "THIS_WEEK").
    pub fn parse(name: &str) -> Option<Self> {
        let key: String = name
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();
        match key.as_str() {
            "today" => Some(Self::Today),
            "this_week" => Some(Self::ThisWeek),
            "last_week" => Some(Self::LastWeek),
            "last_month" => Some(Self::LastMonth),
            "last_year" => Some(Self::LastYear),
            "pinned" => Some(Self::Pinned),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::ThisWeek => "this_week",
            Self::LastWeek => "last_week",
            Self::LastMonth => "last_month",
            Self::LastYear => "last_year",
            Self::Pinned => "pinned",
        }
    }

    /// Concrete `[start, end)` boundaries relative to `now`.
    ///
    /// Returns `None` for `Pinned`, which has no temporal restriction.
    pub fn boundaries_at(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start_of_today = start_of_day(now);
        let start_of_week =
            start_of_today - Duration::days(now.weekday().num_days_from_monday() as i64);
        // `end` is exclusive, so ranges that run up to "now" use a point just past it.
        let open_end = now + Duration::milliseconds(1);
        match self {
            Self::Today => Some((start_of_today, open_end)),
            Self::ThisWeek => Some((start_of_week, open_end)),
            Self::LastWeek => Some((start_of_week - Duration::days(7), start_of_week)),
            Self::LastMonth => Some((now - Duration::days(30), open_end)),
            Self::LastYear => Some((now - Duration::days(365), open_end)),
            Self::Pinned => None,
        }
    }

    /// Whether `note` falls inside this range as of `now`.
    pub fn matches(&self, note: &Note, now: DateTime<Utc>) -> bool {
        match self.boundaries_at(now) {
            Some((start, end)) => note.updated_at >= start && note.updated_at < end,
            None => note.pinned,
        }
    }
}

fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(at.year(), at.month(), at.day(), 0, 0, 0)
        .single()
        .unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_updated(at: DateTime<Utc>, pinned: bool) -> Note {
        Note {
            id: 1,
            user_id: 1,
            title: "t".into(),
            content: String::new(),
            tags: vec![],
            pinned,
            created_at: at,
            updated_at: at,
        }
    }

    // Wednesday 2026-03-18 15:30 UTC
    fn wednesday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 18, 15, 30, 0).unwrap()
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(DateRange::parse("this week"), Some(DateRange::ThisWeek));
        assert_eq!(DateRange::parse("Last-Month"), Some(DateRange::LastMonth));
        assert_eq!(DateRange::parse("PINNED"), Some(DateRange::Pinned));
        assert_eq!(DateRange::parse("next_week"), None);
    }

    #[test]
    fn test_today_starts_at_midnight() {
        let now = wednesday();
        let (start, _) = DateRange::Today.boundaries_at(now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 18, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_this_week_starts_monday() {
        let now = wednesday();
        let (start, _) = DateRange::ThisWeek.boundaries_at(now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_last_week_is_previous_monday_to_monday() {
        let now = wednesday();
        let (start, end) = DateRange::LastWeek.boundaries_at(now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap());

        let in_last_week = note_updated(Utc.with_ymd_and_hms(2026, 3, 12, 9, 0, 0).unwrap(), false);
        let in_this_week = note_updated(Utc.with_ymd_and_hms(2026, 3, 17, 9, 0, 0).unwrap(), false);
        assert!(DateRange::LastWeek.matches(&in_last_week, now));
        assert!(!DateRange::LastWeek.matches(&in_this_week, now));
    }

    #[test]
    fn test_note_updated_now_matches_today() {
        let now = wednesday();
        assert!(DateRange::Today.matches(&note_updated(now, false), now));
    }

    #[test]
    fn test_pinned_ignores_dates() {
        let now = wednesday();
        let old = note_updated(now - Duration::days(4000), true);
        assert!(DateRange::Pinned.matches(&old, now));
        assert!(!DateRange::Pinned.matches(&note_updated(now, false), now));
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&DateRange::LastYear).unwrap();
        assert_eq!(json, "\"last_year\"");
    }
}
