use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// An inclusive calendar date range. Construction is the only place the
/// engine rejects input outright: a start after its end is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::StartAfterEnd { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Inclusive length in days ([2024-03-10, 2024-03-16] spans 7 days).
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    StartAfterEnd { start: NaiveDate, end: NaiveDate },
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::StartAfterEnd { start, end } => {
                write!(f, "range start {} is after its end {}", start, end)
            }
        }
    }
}

impl std::error::Error for RangeError {}

/// Parse a calendar date leniently: `YYYY-MM-DD`, or any ISO datetime whose
/// first ten characters are a date. Anything else is `None`.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    let candidate = if trimmed.len() > 10 {
        trimmed.get(..10)?
    } else {
        trimmed
    };
    NaiveDate::parse_from_str(candidate, "%Y-%m-%d").ok()
}

/// Monday of the week containing `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Sunday of the week containing `date` (Monday + 6).
pub fn end_of_week(date: NaiveDate) -> NaiveDate {
    start_of_week(date) + Duration::days(6)
}

/// `"YYYY-MM"` key for the month containing `date`.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Parse a `"YYYY-MM"` month key.
pub fn parse_month_key(key: &str) -> Option<(i32, u32)> {
    let (year_str, month_str) = key.split_once('-')?;
    let year: i32 = year_str.parse().ok()?;
    let month: u32 = month_str.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)?;
    Some((year, month))
}

/// First and last day of a calendar month.
pub fn month_range(year: i32, month: u32) -> Option<DateRange> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(DateRange {
        start,
        end: next - Duration::days(1),
    })
}

/// First day of `date`'s month.
fn first_of_month(date: NaiveDate) -> NaiveDate {
    // with_day(1) cannot fail.
    date.with_day(1).unwrap()
}

/// First day of the month after `date`'s month.
pub fn next_month(date: NaiveDate) -> NaiveDate {
    let first = first_of_month(date);
    if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1).unwrap()
    }
}

/// Ordinal position (1-based) of a week's Monday within a month: weeks are
/// counted from the Monday of the week containing the 1st.
pub fn week_index_for_month(monday: NaiveDate, year: i32, month: u32) -> i64 {
    let first = match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(d) => d,
        None => return 0,
    };
    let first_week_start = start_of_week(first);
    (monday - first_week_start).num_days() / 7 + 1
}

/// A Monday-aligned week resolved for display under a selected range.
///
/// Membership is decided by the Monday alone; the selected range only clamps
/// the displayed start/end, and the month attribution follows the clamped
/// display end (a week spanning a month boundary belongs to the month its
/// visible end falls in).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekInfo {
    /// `"YYYY-MM-Wn"` bucket key.
    pub key: String,
    /// `"Week 2 Mar"` style label.
    pub label: String,
    /// The Monday; orders buckets chronologically.
    pub order: NaiveDate,
    /// `"04 Mar - 10 Mar"` display range.
    pub detail: String,
    pub month_key: String,
    pub week_index: i64,
    pub display_start: NaiveDate,
    pub display_end: NaiveDate,
}

/// Resolve the week of `date`, clamping the displayed range to `range` when
/// one of its boundaries falls inside the week.
pub fn week_info(date: NaiveDate, range: Option<&DateRange>) -> WeekInfo {
    let monday = start_of_week(date);
    let sunday = end_of_week(date);

    let mut display_start = monday;
    let mut display_end = sunday;
    if let Some(range) = range {
        if monday <= range.start && range.start <= sunday {
            display_start = range.start;
        }
        if monday <= range.end && range.end <= sunday {
            display_end = range.end;
        }
    }
    if display_end < display_start {
        display_end = display_start;
    }

    let label_year = display_end.year();
    let label_month = display_end.month();
    let week_index = week_index_for_month(monday, label_year, label_month);
    let month_key = format!("{:04}-{:02}", label_year, label_month);

    WeekInfo {
        key: format!("{}-W{}", month_key, week_index),
        label: format!("Week {} {}", week_index, display_end.format("%b")),
        order: monday,
        detail: format!(
            "{} - {}",
            display_start.format("%d %b"),
            display_end.format("%d %b")
        ),
        month_key,
        week_index,
        display_start,
        display_end,
    }
}

/// Walk the selected range in 7-day strides and resolve one `WeekInfo` per
/// intersecting week, so every week is represented before any record lands.
/// Strides containing a range boundary use it as their reference date, which
/// clamps the displayed edges of the first and last buckets.
pub fn seed_weeks(range: &DateRange) -> Vec<WeekInfo> {
    let mut infos = Vec::new();
    let mut cursor = start_of_week(range.start);
    let last = end_of_week(range.end);

    while cursor <= last {
        let week_end = end_of_week(cursor);
        let reference = if cursor <= range.start && range.start <= week_end {
            range.start
        } else if cursor <= range.end && range.end <= week_end {
            range.end
        } else {
            cursor
        };
        infos.push(week_info(reference, Some(range)));
        cursor = cursor + Duration::days(7);
    }

    infos
}

/// Default dashboard range: previous week's Monday through the current
/// week's Sunday.
pub fn default_range(today: NaiveDate) -> DateRange {
    DateRange {
        start: start_of_week(today) - Duration::days(7),
        end: end_of_week(today),
    }
}

/// Monday-aligned `[start, end]` of the `week_index`-th (0-based) week of a
/// month, counted from the first Monday on or after the 1st. `None` once the
/// index walks past the month.
pub fn week_range_for_month(year: i32, month: u32, week_index: u8) -> Option<DateRange> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let days_to_monday = (7 - first.weekday().num_days_from_monday()) % 7;
    let monday =
        first + Duration::days(days_to_monday as i64) + Duration::days(week_index as i64 * 7);

    if monday.month() != month && monday.day() > 7 {
        return None;
    }

    Some(DateRange {
        start: monday,
        end: monday + Duration::days(6),
    })
}

/// Fixed day-of-month slice used by the week-toggle filter: days 1-7 are
/// slice 0, 8-14 slice 1, 15-21 slice 2, and slice 3 absorbs days 22-31.
///
/// This is NOT the Monday-aligned partition used for aggregation. The two
/// disagree on purpose and must never be merged: this one ignores weekday
/// alignment and month boundaries, and only answers "does this day fall
/// under a toggled checkbox".
pub fn filter_slice_of_day(day: u32) -> u8 {
    ((day.saturating_sub(1)) / 7).min(3) as u8
}
