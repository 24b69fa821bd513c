use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::calendar::{filter_slice_of_day, DateRange};
use super::record::DatedRecord;

/// The user's period selection, threaded through one computation pass as an
/// immutable value: the date range plus the optional "specific weeks of a
/// month" toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub range: DateRange,
    /// `"YYYY-MM"` of the month the week toggles refer to.
    #[serde(default)]
    pub selected_month: Option<String>,
    /// Toggled 0-based week slices (0..=3).
    #[serde(default)]
    pub selected_weeks: BTreeSet<u8>,
}

impl FilterState {
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            selected_month: None,
            selected_weeks: BTreeSet::new(),
        }
    }

    pub fn with_weeks(range: DateRange, month: impl Into<String>, weeks: &[u8]) -> Self {
        Self {
            range,
            selected_month: Some(month.into()),
            selected_weeks: weeks.iter().copied().collect(),
        }
    }

    /// Week toggles only apply when a month is selected and at least one
    /// week is checked.
    pub fn filters_by_weeks(&self) -> bool {
        self.selected_month.is_some() && !self.selected_weeks.is_empty()
    }
}

/// Anything carrying a resolved week period: buckets and any per-week series
/// derived from them.
pub trait PeriodItem {
    fn month_key(&self) -> &str;
    fn week_index(&self) -> i64;
    fn display_start(&self) -> NaiveDate;
    fn display_end(&self) -> NaiveDate;
}

/// Keep the items whose displayed range overlaps the selected range and,
/// when week toggles are active, whose week belongs to the selected month
/// and a toggled slice.
pub fn filter_periods<T: PeriodItem + Clone>(items: &[T], state: &FilterState) -> Vec<T> {
    let by_weeks = state.filters_by_weeks();
    items
        .iter()
        .filter(|item| {
            let overlaps = item.display_start() <= state.range.end
                && item.display_end() >= state.range.start;

            let matches_weeks = if by_weeks {
                let slice = item.week_index() - 1;
                state.selected_month.as_deref() == Some(item.month_key())
                    && slice >= 0
                    && state.selected_weeks.contains(&(slice as u8))
            } else {
                true
            };

            overlaps && matches_weeks
        })
        .cloned()
        .collect()
}

/// Keep the countable records whose effective date falls in a toggled
/// day-of-month slice. With no toggles, every countable record passes.
pub fn filter_records<'a, T: DatedRecord>(
    records: &'a [T],
    selected_weeks: &BTreeSet<u8>,
) -> Vec<&'a T> {
    records
        .iter()
        .filter(|record| {
            if !record.is_countable() {
                return false;
            }
            if selected_weeks.is_empty() {
                return true;
            }
            match record.effective_date() {
                Some(date) => selected_weeks.contains(&filter_slice_of_day(date.day())),
                None => false,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::ExpenseRecord;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(day: u32, active: bool) -> ExpenseRecord {
        ExpenseRecord {
            id: day as i64,
            amount: 100,
            date: Some(date(2024, 3, day)),
            active,
        }
    }

    #[test]
    fn test_filter_records_without_toggles_keeps_countable() {
        let records = vec![expense(3, true), expense(9, false)];
        let kept = filter_records(&records, &BTreeSet::new());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 3);
    }

    #[test]
    fn test_filter_records_by_slices() {
        let records = vec![
            expense(3, true),  // slice 0
            expense(10, true), // slice 1
            expense(29, true), // slice 3 (extended)
        ];
        let weeks: BTreeSet<u8> = [0, 3].into_iter().collect();
        let kept = filter_records(&records, &weeks);
        let ids: Vec<i64> = kept.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 29]);
    }

    #[test]
    fn test_filter_records_skips_undated() {
        let records = vec![ExpenseRecord {
            id: 1,
            amount: 100,
            date: None,
            active: true,
        }];
        let weeks: BTreeSet<u8> = [0].into_iter().collect();
        assert!(filter_records(&records, &weeks).is_empty());
    }
}
