use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::calendar::parse_date;
use super::Cents;

/// Status marker for sales that were saved as quotations. Quotations never
/// count toward any monetary aggregate.
pub const QUOTATION_STATUS: &str = "QUOTATION";

fn default_active() -> bool {
    true
}

/// Deserialize a date field leniently: accept `YYYY-MM-DD` or a full ISO
/// datetime, and map anything unparseable (or absent) to `None`. Records
/// without a usable date stay in the dataset but never reach a bucket.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date))
}

fn serialize_date<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match date {
        Some(d) => serializer.serialize_some(&d.format("%Y-%m-%d").to_string()),
        None => serializer.serialize_none(),
    }
}

/// A single product line inside a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub product: String,
    pub quantity: i64,
    /// Line total in cents (unit price x quantity, after line discount).
    pub total: Cents,
    #[serde(default)]
    pub unit_cost: Cents,
    #[serde(default)]
    pub discount: Cents,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// A sale as fetched from the point-of-sale system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: i64,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_date",
        serialize_with = "serialize_date"
    )]
    pub date: Option<NaiveDate>,
    /// Record-level total in cents. Weekly aggregation sums line totals
    /// instead; this field feeds the monthly paths.
    pub total: Cents,
    #[serde(default)]
    pub status: String,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Sale-level discount amount; any positive value marks the whole sale
    /// as discounted.
    #[serde(default)]
    pub discount: Cents,
    #[serde(default)]
    pub lines: Vec<LineItem>,
}

impl SaleRecord {
    /// Sum of the totals of the active lines. This is the amount the weekly
    /// aggregation attributes to the sale.
    pub fn active_line_total(&self) -> Cents {
        self.lines
            .iter()
            .filter(|line| line.active)
            .map(|line| line.total)
            .sum()
    }

    /// A sale counts as discounted when it carries a sale-level discount or
    /// any of its active lines does.
    pub fn has_discount(&self) -> bool {
        self.discount > 0
            || self
                .lines
                .iter()
                .any(|line| line.active && line.discount > 0)
    }
}

/// An operating expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: i64,
    pub amount: Cents,
    #[serde(
        default,
        deserialize_with = "lenient_date",
        serialize_with = "serialize_date"
    )]
    pub date: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// A customer return. The upstream system stores these as cancelled sales;
/// here they are their own record kind with the active flag defaulting to
/// true so the exclusion predicate applies uniformly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnRecord {
    pub id: i64,
    pub amount: Cents,
    #[serde(
        default,
        deserialize_with = "lenient_date",
        serialize_with = "serialize_date"
    )]
    pub date: Option<NaiveDate>,
    /// Date the return was processed, when recorded separately from the
    /// original transaction date.
    #[serde(
        default,
        deserialize_with = "lenient_date",
        serialize_with = "serialize_date"
    )]
    pub return_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl ReturnRecord {
    /// The date the return is aggregated under: the dedicated return date,
    /// falling back to the transaction date.
    pub fn effective_date(&self) -> Option<NaiveDate> {
        self.return_date.or(self.date)
    }
}

/// Shared view over the three record kinds, used by week-slice filtering.
pub trait DatedRecord {
    fn effective_date(&self) -> Option<NaiveDate>;
    fn is_countable(&self) -> bool;
}

impl DatedRecord for SaleRecord {
    fn effective_date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn is_countable(&self) -> bool {
        self.active && self.status != QUOTATION_STATUS
    }
}

impl DatedRecord for ExpenseRecord {
    fn effective_date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn is_countable(&self) -> bool {
        self.active
    }
}

impl DatedRecord for ReturnRecord {
    fn effective_date(&self) -> Option<NaiveDate> {
        ReturnRecord::effective_date(self)
    }

    fn is_countable(&self) -> bool {
        self.active && self.status != QUOTATION_STATUS
    }
}

/// The frozen input of one computation pass. Collections are fetched by an
/// external layer, stay immutable for the duration of the pass, and are
/// replaced wholesale when the filters change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDataset {
    #[serde(default)]
    pub sales: Vec<SaleRecord>,
    #[serde(default)]
    pub expenses: Vec<ExpenseRecord>,
    #[serde(default)]
    pub returns: Vec<ReturnRecord>,
}

impl RawDataset {
    pub fn is_empty(&self) -> bool {
        self.sales.is_empty() && self.expenses.is_empty() && self.returns.is_empty()
    }
}
