use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::calendar::{seed_weeks, week_info, DateRange, WeekInfo};
use super::filter::PeriodItem;
use super::record::{DatedRecord, RawDataset};
use super::Cents;

/// One Monday-aligned aggregation cell. Seeded for every week intersecting
/// the selected range before any record is folded in, so empty weeks render
/// as zeros instead of disappearing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekBucket {
    pub key: String,
    pub label: String,
    pub detail: String,
    pub month_key: String,
    pub week_index: i64,
    /// The Monday; buckets sort by this.
    pub order: NaiveDate,
    pub display_start: NaiveDate,
    pub display_end: NaiveDate,
    /// Summed active line totals of countable sales.
    pub revenue: Cents,
    /// Cost of goods (unit cost x quantity of active lines). Tracked but
    /// never part of the weekly utility.
    pub cost: Cents,
    /// Operating expenses of active records.
    pub expenses: Cents,
    /// Returned amounts keyed by the return's effective date.
    pub returned: Cents,
    /// Whole-sale totals of sales carrying any discount.
    pub discounted: Cents,
}

impl WeekBucket {
    fn seeded(info: &WeekInfo) -> Self {
        Self {
            key: info.key.clone(),
            label: info.label.clone(),
            detail: info.detail.clone(),
            month_key: info.month_key.clone(),
            week_index: info.week_index,
            order: info.order,
            display_start: info.display_start,
            display_end: info.display_end,
            revenue: 0,
            cost: 0,
            expenses: 0,
            returned: 0,
            discounted: 0,
        }
    }

    /// Weekly utility subtracts operating expenses only; cost of goods is
    /// reported separately. Not interchangeable with the daily net profit
    /// derived from KPI snapshots.
    pub fn utility(&self) -> Cents {
        self.revenue - self.expenses
    }
}

impl PeriodItem for WeekBucket {
    fn month_key(&self) -> &str {
        &self.month_key
    }

    fn week_index(&self) -> i64 {
        self.week_index
    }

    fn display_start(&self) -> NaiveDate {
        self.display_start
    }

    fn display_end(&self) -> NaiveDate {
        self.display_end
    }
}

/// Quantity sold per product, collected during the weekly pass for the
/// least-sold listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuantity {
    pub product: String,
    pub quantity: i64,
}

/// Output of one weekly aggregation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklyAggregate {
    /// Buckets in chronological order.
    pub buckets: Vec<WeekBucket>,
    /// Products ordered by ascending quantity sold.
    pub least_sold: Vec<ProductQuantity>,
}

/// Totals across a bucket series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub revenue: Cents,
    pub cost: Cents,
    pub expenses: Cents,
    pub returned: Cents,
    pub discounted: Cents,
    /// Revenue minus operating expenses. Cost of goods stays out, matching
    /// the weekly utility definition.
    pub net_utility: Cents,
}

/// Fold the dataset into per-week buckets under the selected range.
///
/// Every pass starts from freshly seeded buckets: running it twice over the
/// same inputs yields identical sums. Records without a usable date are
/// skipped silently.
pub fn aggregate(dataset: &RawDataset, range: &DateRange) -> WeeklyAggregate {
    let mut buckets: HashMap<String, WeekBucket> = HashMap::new();
    let mut quantities: HashMap<String, i64> = HashMap::new();

    for info in seed_weeks(range) {
        buckets
            .entry(info.key.clone())
            .or_insert_with(|| WeekBucket::seeded(&info));
    }

    for sale in &dataset.sales {
        if !sale.is_countable() {
            continue;
        }
        let Some(date) = sale.date else { continue };
        let info = week_info(date, Some(range));
        let bucket = buckets
            .entry(info.key.clone())
            .or_insert_with(|| WeekBucket::seeded(&info));

        let mut sale_total: Cents = 0;
        for line in &sale.lines {
            if !line.active {
                continue;
            }
            bucket.revenue += line.total;
            bucket.cost += line.unit_cost * line.quantity;
            sale_total += line.total;
            if !line.product.is_empty() {
                *quantities.entry(line.product.clone()).or_insert(0) += line.quantity;
            }
        }

        if sale.has_discount() && sale_total > 0 {
            bucket.discounted += sale_total;
        }
    }

    for expense in &dataset.expenses {
        let Some(date) = expense.date else { continue };
        let info = week_info(date, Some(range));
        let bucket = buckets
            .entry(info.key.clone())
            .or_insert_with(|| WeekBucket::seeded(&info));
        if !expense.is_countable() {
            continue;
        }
        bucket.expenses += expense.amount;
    }

    for ret in &dataset.returns {
        if !ret.is_countable() {
            continue;
        }
        let Some(date) = ret.effective_date() else {
            continue;
        };
        let info = week_info(date, Some(range));
        let bucket = buckets
            .entry(info.key.clone())
            .or_insert_with(|| WeekBucket::seeded(&info));
        bucket.returned += ret.amount;
    }

    let mut buckets: Vec<WeekBucket> = buckets.into_values().collect();
    buckets.sort_by_key(|bucket| bucket.order);

    let mut least_sold: Vec<ProductQuantity> = quantities
        .into_iter()
        .map(|(product, quantity)| ProductQuantity { product, quantity })
        .collect();
    least_sold.sort_by(|a, b| a.quantity.cmp(&b.quantity).then(a.product.cmp(&b.product)));

    WeeklyAggregate {
        buckets,
        least_sold,
    }
}

/// Totals across a (possibly filtered) bucket series.
pub fn summarize(buckets: &[WeekBucket]) -> PeriodSummary {
    let mut summary = PeriodSummary::default();
    for bucket in buckets {
        summary.revenue += bucket.revenue;
        summary.cost += bucket.cost;
        summary.expenses += bucket.expenses;
        summary.returned += bucket.returned;
        summary.discounted += bucket.discounted;
    }
    summary.net_utility = summary.revenue - summary.expenses;
    summary
}
