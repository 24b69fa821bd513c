// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use chrono::NaiveDate;
use mirador::application::{DashboardInputs, DashboardService};
use mirador::domain::{
    Cents, DateRange, ExpenseRecord, FilterState, Goals, KpiSnapshot, LineItem, RawDataset,
    ReturnRecord, SaleRecord,
};

/// Helper to parse a date string into NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Helper to build an inclusive date range
pub fn range(from: &str, to: &str) -> DateRange {
    DateRange::new(parse_date(from), parse_date(to)).unwrap()
}

/// Helper to build a filter with no week toggles
pub fn filter(from: &str, to: &str) -> FilterState {
    FilterState::new(range(from, to))
}

/// A sale with a single active line carrying the whole total.
pub fn simple_sale(id: i64, date: &str, total: Cents) -> SaleRecord {
    SaleRecord {
        id,
        document: None,
        date: Some(parse_date(date)),
        total,
        status: String::new(),
        active: true,
        discount: 0,
        lines: vec![LineItem {
            product: format!("product-{}", id),
            quantity: 1,
            total,
            unit_cost: 0,
            discount: 0,
            active: true,
        }],
    }
}

/// A sale with explicit lines; the record total is the line sum.
pub fn sale_with_lines(id: i64, date: &str, lines: Vec<LineItem>) -> SaleRecord {
    SaleRecord {
        id,
        document: None,
        date: Some(parse_date(date)),
        total: lines.iter().filter(|l| l.active).map(|l| l.total).sum(),
        status: String::new(),
        active: true,
        discount: 0,
        lines,
    }
}

pub fn line(product: &str, quantity: i64, total: Cents, unit_cost: Cents) -> LineItem {
    LineItem {
        product: product.into(),
        quantity,
        total,
        unit_cost,
        discount: 0,
        active: true,
    }
}

pub fn expense(id: i64, date: &str, amount: Cents) -> ExpenseRecord {
    ExpenseRecord {
        id,
        amount,
        date: Some(parse_date(date)),
        active: true,
    }
}

pub fn return_record(id: i64, return_date: &str, amount: Cents) -> ReturnRecord {
    ReturnRecord {
        id,
        amount,
        date: None,
        return_date: Some(parse_date(return_date)),
        status: String::new(),
        active: true,
    }
}

/// Day KPI snapshot with just the figures the quick alerts look at.
pub fn day_kpis(revenue: Cents, purchases: Cents, expenses: Cents, goal: Cents) -> KpiSnapshot {
    KpiSnapshot {
        revenue,
        goal,
        purchases,
        expenses,
        ..Default::default()
    }
}

/// Service over a dataset with no external figures attached.
pub fn bare_service(dataset: RawDataset) -> DashboardService {
    DashboardService::new(dataset, DashboardInputs::default())
}

/// Standard fixture: two weeks of March 2024 activity.
///
/// Week of Mar 4: sales 300.00 (cost 120.00), expenses 50.00, return 20.00.
/// Week of Mar 11: sales 100.00, expenses 30.00.
pub fn march_dataset() -> RawDataset {
    RawDataset {
        sales: vec![
            sale_with_lines(
                1,
                "2024-03-04",
                vec![line("mug", 2, 20000, 8000), line("tray", 1, 10000, 4000)],
            ),
            simple_sale(2, "2024-03-12", 10000),
        ],
        expenses: vec![expense(1, "2024-03-05", 5000), expense(2, "2024-03-13", 3000)],
        returns: vec![return_record(1, "2024-03-06", 2000)],
    }
}

/// External figures matching a day of slow sales against a 1000.00 goal.
pub fn inputs_with_goal(goal: Cents, revenue: Cents, expenses: Cents) -> DashboardInputs {
    DashboardInputs {
        kpis_day: Some(day_kpis(revenue, 0, expenses, 0)),
        goals: Some(Goals {
            daily: Some(goal),
            weekly: None,
            monthly: None,
        }),
        ..Default::default()
    }
}
