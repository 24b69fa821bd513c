use serde::{Deserialize, Serialize};

use super::money::format_currency;
use super::Cents;

/// Reporting grain of a KPI snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodGrain {
    Day,
    Week,
    Month,
}

impl PeriodGrain {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodGrain::Day => "day",
            PeriodGrain::Week => "week",
            PeriodGrain::Month => "month",
        }
    }

    fn total_label(&self) -> &'static str {
        match self {
            PeriodGrain::Day => "Total sales for the day",
            PeriodGrain::Week => "Total sales for the week",
            PeriodGrain::Month => "Total sales for the month",
        }
    }

    fn general_label(&self) -> &'static str {
        match self {
            PeriodGrain::Day => "Overall daily total",
            PeriodGrain::Week => "Overall weekly total",
            PeriodGrain::Month => "Overall monthly total",
        }
    }
}

impl std::fmt::Display for PeriodGrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A KPI snapshot as computed upstream for one grain. The engine only
/// derives from it; it never recomputes these figures from raw records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    pub revenue: Cents,
    /// The goal the source attached to this grain; the external goals take
    /// precedence over it when present.
    #[serde(default)]
    pub goal: Cents,
    #[serde(default)]
    pub average_ticket: Cents,
    #[serde(default)]
    pub transaction_count: i64,
    #[serde(default)]
    pub cash: Cents,
    #[serde(default)]
    pub transfer: Cents,
    #[serde(default)]
    pub card: Cents,
    #[serde(default)]
    pub check: Cents,
    #[serde(default)]
    pub voucher: Cents,
    #[serde(default)]
    pub credit: Cents,
    /// Returns over sales, in percent.
    #[serde(default)]
    pub return_rate: f64,
    #[serde(default)]
    pub purchases: Cents,
    #[serde(default)]
    pub expenses: Cents,
}

/// Externally supplied sales targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goals {
    #[serde(default)]
    pub daily: Option<Cents>,
    #[serde(default)]
    pub weekly: Option<Cents>,
    #[serde(default)]
    pub monthly: Option<Cents>,
}

/// One line of the indicator table. Only total rows carry a raw value; the
/// general total is the sum of those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub label: String,
    pub display: String,
    #[serde(default)]
    pub raw: Option<Cents>,
    #[serde(default)]
    pub is_total: bool,
}

impl IndicatorRow {
    fn plain(label: &str, display: String) -> Self {
        Self {
            label: label.to_string(),
            display,
            raw: None,
            is_total: false,
        }
    }

    fn total(label: &str, raw: Cents) -> Self {
        Self {
            label: label.to_string(),
            display: format_currency(raw),
            raw: Some(raw),
            is_total: true,
        }
    }
}

/// The flat, ordered indicator table for one grain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorTable {
    pub grain: PeriodGrain,
    pub rows: Vec<IndicatorRow>,
    pub general_label: String,
    pub general_total: Cents,
}

/// Flatten a snapshot into display rows: payment breakdown first, then the
/// ratio metrics, then the three signed total rows (sales positive,
/// purchases and expenses negated) whose raw values sum to the general
/// total.
pub fn indicator_table(kpis: &KpiSnapshot, grain: PeriodGrain) -> IndicatorTable {
    let total_in_banks = kpis.transfer + kpis.card;

    let mut rows = vec![
        IndicatorRow::plain("Average ticket", format_currency(kpis.average_ticket)),
        IndicatorRow::plain("Cash sales", format_currency(kpis.cash)),
        IndicatorRow::plain("Transfer sales", format_currency(kpis.transfer)),
        IndicatorRow::plain("Card sales", format_currency(kpis.card)),
        IndicatorRow::plain("Total in banks", format_currency(total_in_banks)),
        IndicatorRow::plain("Check sales", format_currency(kpis.check)),
        IndicatorRow::plain("Voucher sales", format_currency(kpis.voucher)),
        IndicatorRow::plain("Credit sales", format_currency(kpis.credit)),
        IndicatorRow::plain(
            "Returns over sales",
            format!("{:.2}%", kpis.return_rate),
        ),
        IndicatorRow::plain(
            "Number of sales",
            kpis.transaction_count.to_string(),
        ),
    ];

    let totals = [
        IndicatorRow::total(grain.total_label(), kpis.revenue),
        IndicatorRow::total("Total purchases", -kpis.purchases),
        IndicatorRow::total("Total expenses", -kpis.expenses),
    ];
    let general_total = totals.iter().filter_map(|row| row.raw).sum();
    rows.extend(totals);

    IndicatorTable {
        grain,
        rows,
        general_label: grain.general_label().to_string(),
        general_total,
    }
}

/// Net profit for the daily grain: revenue minus operating expenses.
/// Purchases are deliberately excluded here, unlike the weekly/monthly
/// utility figures; the two must never be substituted for one another.
pub fn daily_net_profit(kpis: Option<&KpiSnapshot>) -> Option<Cents> {
    kpis.map(|k| k.revenue - k.expenses)
}

/// Margin of the daily net profit over revenue, in percent. Zero when there
/// is no revenue to compare against.
pub fn daily_margin_percent(revenue: Cents, net_profit: Cents) -> f64 {
    if revenue > 0 {
        net_profit as f64 / revenue as f64 * 100.0
    } else {
        0.0
    }
}
