use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::calendar::{month_key, next_month, DateRange};
use super::record::{DatedRecord, ExpenseRecord, RawDataset, SaleRecord};
use super::Cents;

/// Signed percentage variation between two utilities.
///
/// Against a zero baseline the variation saturates at +/-100 instead of
/// dividing by zero: any gain reads as 100, any loss as -100, no change as 0.
pub fn variation(current: Cents, previous: Cents) -> f64 {
    if previous != 0 {
        (current - previous) as f64 / previous.abs() as f64 * 100.0
    } else if current > 0 {
        100.0
    } else if current < 0 {
        -100.0
    } else {
        0.0
    }
}

/// One calendar month of the growth table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthRow {
    pub month_key: String,
    /// `"March 2024"` style label.
    pub label: String,
    pub month_start: NaiveDate,
    pub revenue: Cents,
    pub expenses: Cents,
    pub utility: Cents,
    /// Percentage change of utility against the previous row. Zero for the
    /// first row.
    pub variation: f64,
    pub has_previous: bool,
    pub is_negative: bool,
}

/// Month-over-month growth across the selected range. Every month from the
/// range start's month through the range end is seeded, so quiet months show
/// up as zero rows; records outside the seeded months are ignored.
pub fn monthly_growth_rows(
    sales: &[SaleRecord],
    expenses: &[ExpenseRecord],
    range: &DateRange,
) -> Vec<GrowthRow> {
    struct MonthTotals {
        start: NaiveDate,
        revenue: Cents,
        expenses: Cents,
    }

    let mut months: BTreeMap<String, MonthTotals> = BTreeMap::new();
    let mut cursor = range.start.with_day(1).unwrap();
    while cursor <= range.end {
        months.insert(
            month_key(cursor),
            MonthTotals {
                start: cursor,
                revenue: 0,
                expenses: 0,
            },
        );
        cursor = next_month(cursor);
    }

    for sale in sales {
        if !sale.is_countable() {
            continue;
        }
        let Some(date) = sale.date else { continue };
        if let Some(month) = months.get_mut(&month_key(date)) {
            month.revenue += sale.total;
        }
    }

    for expense in expenses {
        if !expense.is_countable() {
            continue;
        }
        let Some(date) = expense.date else { continue };
        if let Some(month) = months.get_mut(&month_key(date)) {
            month.expenses += expense.amount;
        }
    }

    let mut rows: Vec<GrowthRow> = Vec::with_capacity(months.len());
    let mut previous_utility: Option<Cents> = None;
    for (key, totals) in months {
        let utility = totals.revenue - totals.expenses;
        let (variation_pct, has_previous) = match previous_utility {
            Some(prev) => (variation(utility, prev), true),
            None => (0.0, false),
        };
        rows.push(GrowthRow {
            month_key: key,
            label: totals.start.format("%B %Y").to_string(),
            month_start: totals.start,
            revenue: totals.revenue,
            expenses: totals.expenses,
            utility,
            variation: variation_pct,
            has_previous,
            is_negative: utility < 0,
        });
        previous_utility = Some(utility);
    }

    rows
}

/// Totals of one comparison window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowTotals {
    pub label: String,
    pub range: DateRange,
    pub revenue: Cents,
    pub expenses: Cents,
    /// Revenue minus expenses at this grain; cost of goods never enters.
    pub utility: Cents,
}

/// The selected window against its duration-matched predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowComparison {
    pub current: WindowTotals,
    pub previous: WindowTotals,
}

impl WindowComparison {
    pub fn revenue_variation(&self) -> f64 {
        variation(self.current.revenue, self.previous.revenue)
    }

    pub fn expense_variation(&self) -> f64 {
        variation(self.current.expenses, self.previous.expenses)
    }

    pub fn utility_variation(&self) -> f64 {
        variation(self.current.utility, self.previous.utility)
    }
}

/// The equal-length window immediately before `range`: it ends the day
/// before the range starts. Deliberately not a calendar month unless the
/// selection happens to be one.
pub fn previous_window(range: &DateRange) -> DateRange {
    let end = range.start - Duration::days(1);
    DateRange {
        start: end - Duration::days(range.len_days() - 1),
        end,
    }
}

fn window_totals(dataset: &RawDataset, range: &DateRange, label: &str) -> WindowTotals {
    let revenue = dataset
        .sales
        .iter()
        .filter(|sale| sale.is_countable())
        .filter(|sale| sale.date.is_some_and(|d| range.contains(d)))
        .map(|sale| sale.total)
        .sum();
    let expenses = dataset
        .expenses
        .iter()
        .filter(|expense| expense.is_countable())
        .filter(|expense| expense.date.is_some_and(|d| range.contains(d)))
        .map(|expense| expense.amount)
        .sum::<Cents>();

    WindowTotals {
        label: label.to_string(),
        range: *range,
        revenue,
        expenses,
        utility: revenue - expenses,
    }
}

/// Compare the selected window against the duration-matched window that
/// precedes it.
pub fn compare_windows(dataset: &RawDataset, range: &DateRange) -> WindowComparison {
    let previous_range = previous_window(range);
    WindowComparison {
        current: window_totals(dataset, range, "Current period"),
        previous: window_totals(dataset, &previous_range, "Previous period"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::LineItem;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(y: i32, m: u32, d: u32, total: Cents) -> SaleRecord {
        SaleRecord {
            id: 0,
            document: None,
            date: Some(date(y, m, d)),
            total,
            status: String::new(),
            active: true,
            discount: 0,
            lines: vec![LineItem {
                product: String::new(),
                quantity: 1,
                total,
                unit_cost: 0,
                discount: 0,
                active: true,
            }],
        }
    }

    fn expense(y: i32, m: u32, d: u32, amount: Cents) -> ExpenseRecord {
        ExpenseRecord {
            id: 0,
            amount,
            date: Some(date(y, m, d)),
            active: true,
        }
    }

    #[test]
    fn test_variation_edge_table() {
        assert_eq!(variation(100, 50), 100.0);
        assert_eq!(variation(50, 100), -50.0);
        assert_eq!(variation(0, 0), 0.0);
        assert_eq!(variation(10, 0), 100.0);
        assert_eq!(variation(-10, 0), -100.0);
        // Negative baselines divide by the absolute value.
        assert_eq!(variation(-50, -100), 50.0);
    }

    #[test]
    fn test_monthly_rows_seed_quiet_months() {
        let range = DateRange::new(date(2024, 1, 15), date(2024, 3, 10)).unwrap();
        let rows = monthly_growth_rows(&[sale(2024, 1, 20, 1000)], &[], &range);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].month_key, "2024-01");
        assert_eq!(rows[1].revenue, 0);
        assert_eq!(rows[2].month_key, "2024-03");
        assert!(!rows[0].has_previous);
        assert!(rows[1].has_previous);
    }

    #[test]
    fn test_monthly_rows_variation_chain() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 2, 29)).unwrap();
        let sales = vec![sale(2024, 1, 10, 10000), sale(2024, 2, 10, 15000)];
        let expenses = vec![expense(2024, 1, 12, 5000), expense(2024, 2, 12, 5000)];
        let rows = monthly_growth_rows(&sales, &expenses, &range);

        assert_eq!(rows[0].utility, 5000);
        assert_eq!(rows[1].utility, 10000);
        assert_eq!(rows[1].variation, 100.0);
        assert!(!rows[1].is_negative);
        assert_eq!(rows[0].label, "January 2024");
    }

    #[test]
    fn test_monthly_rows_skip_inactive_and_quotations() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        let mut inactive = sale(2024, 1, 5, 9999);
        inactive.active = false;
        let mut quotation = sale(2024, 1, 6, 8888);
        quotation.status = "QUOTATION".into();
        let mut inactive_expense = expense(2024, 1, 7, 7777);
        inactive_expense.active = false;

        let rows = monthly_growth_rows(
            &[sale(2024, 1, 4, 1000), inactive, quotation],
            &[inactive_expense],
            &range,
        );
        assert_eq!(rows[0].revenue, 1000);
        assert_eq!(rows[0].expenses, 0);
    }

    #[test]
    fn test_previous_window_is_duration_matched() {
        let range = DateRange::new(date(2024, 3, 10), date(2024, 3, 16)).unwrap();
        let previous = previous_window(&range);
        assert_eq!(previous.start, date(2024, 3, 3));
        assert_eq!(previous.end, date(2024, 3, 9));
        assert_eq!(previous.len_days(), range.len_days());
    }

    #[test]
    fn test_compare_windows() {
        let range = DateRange::new(date(2024, 3, 10), date(2024, 3, 16)).unwrap();
        let dataset = RawDataset {
            sales: vec![
                sale(2024, 3, 11, 20000),
                sale(2024, 3, 5, 10000),
                // Outside both windows.
                sale(2024, 2, 1, 99999),
            ],
            expenses: vec![expense(2024, 3, 12, 5000), expense(2024, 3, 4, 2000)],
            ..Default::default()
        };
        let comparison = compare_windows(&dataset, &range);

        assert_eq!(comparison.current.revenue, 20000);
        assert_eq!(comparison.previous.revenue, 10000);
        assert_eq!(comparison.current.utility, 15000);
        assert_eq!(comparison.previous.utility, 8000);
        assert_eq!(comparison.revenue_variation(), 100.0);
    }
}
