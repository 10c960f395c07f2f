//! Weekday-to-date resolution.
//!
//! The heatmap columns are weekdays, not dates. Which concrete date a column
//! shows depends on the week offset:
//!
//! - offset 0 ("scattered"): every weekday independently resolves to its most
//!   recent occurrence, so mid-week the trailing columns come from the prior
//!   calendar week. Each column is the freshest completed instance of that
//!   weekday.
//! - offset >= 1 ("sequential"): one contiguous Monday-anchored calendar week,
//!   `offset` weeks back.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

/// Weekday encoding used across the engine: Sunday=0, Monday=1, .. Saturday=6.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Column order of the heatmap: Monday first, Sunday last.
pub const WEEKDAY_ORDER: [u8; 7] = [1, 2, 3, 4, 5, 6, 0];

/// The 7 resolved dates for one request, in Monday..Sunday order.
///
/// Built once per pass and never mutated afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedWeek {
    days: [(u8, NaiveDate); 7],
}

impl ResolvedWeek {
    pub fn days(&self) -> &[(u8, NaiveDate); 7] {
        &self.days
    }

    pub fn date_of(&self, weekday: u8) -> Option<NaiveDate> {
        self.days
            .iter()
            .find(|(w, _)| *w == weekday)
            .map(|(_, d)| *d)
    }
}

/// Resolve the 7 dates backing the heatmap columns.
///
/// `week_offset` selects the policy: 0 is scattered, anything else is
/// sequential. A weekday matching `today` resolves to `today` itself, not a
/// week earlier.
pub fn resolve_week(week_offset: u32, today: NaiveDate) -> ResolvedWeek {
    let anchor = today - Duration::days(7 * week_offset as i64);
    let days = if week_offset == 0 {
        scattered(anchor)
    } else {
        sequential(anchor)
    };
    ResolvedWeek { days }
}

fn scattered(anchor: NaiveDate) -> [(u8, NaiveDate); 7] {
    WEEKDAY_ORDER.map(|w| {
        let back = (weekday_index(anchor) + 7 - w) % 7;
        (w, anchor - Duration::days(back as i64))
    })
}

fn sequential(anchor: NaiveDate) -> [(u8, NaiveDate); 7] {
    let since_monday = (weekday_index(anchor) + 6) % 7;
    let monday = anchor - Duration::days(since_monday as i64);
    std::array::from_fn(|i| (WEEKDAY_ORDER[i], monday + Duration::days(i as i64)))
}
