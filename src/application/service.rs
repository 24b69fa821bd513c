use serde::{Deserialize, Serialize};

use crate::domain::{
    aggregate, compare_windows, daily_net_profit, evaluate_managerial_alerts,
    evaluate_quick_alerts, filter_periods, indicator_table, monthly_growth_rows, summarize,
    AlertContext, Cents, FilterState, Goals, GrowthRow, IndicatorTable, KpiSnapshot,
    ManagerialAlert, PeriodGrain, PeriodSummary, ProductQuantity, QuickAlert, RawDataset,
    ReturnImpact, SlowMover, WeekBucket, WindowComparison,
};

use super::AppError;

/// Externally computed figures the engine derives from but never
/// recalculates: KPI snapshots per grain, sales goals, the low-rotation
/// inventory list, and the return-impact summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardInputs {
    #[serde(default)]
    pub kpis_day: Option<KpiSnapshot>,
    #[serde(default)]
    pub kpis_week: Option<KpiSnapshot>,
    #[serde(default)]
    pub kpis_month: Option<KpiSnapshot>,
    #[serde(default)]
    pub goals: Option<Goals>,
    #[serde(default)]
    pub slow_movers: Vec<SlowMover>,
    #[serde(default)]
    pub return_impact: Option<ReturnImpact>,
}

/// Everything one pass produces, as plain serializable data. Any front end
/// (tables, charts, JSON consumers) renders from this without touching the
/// engine again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub filter: FilterState,
    /// Weekly buckets after the period/week filter.
    pub weekly: Vec<WeekBucket>,
    pub summary: PeriodSummary,
    /// Products by ascending quantity sold over the period.
    pub least_sold: Vec<ProductQuantity>,
    pub growth: Vec<GrowthRow>,
    pub comparison: WindowComparison,
    pub indicators_day: Option<IndicatorTable>,
    pub indicators_week: Option<IndicatorTable>,
    pub indicators_month: Option<IndicatorTable>,
    pub daily_net_profit: Option<Cents>,
    pub quick_alerts: Vec<QuickAlert>,
    pub managerial_alerts: Vec<ManagerialAlert>,
}

/// Application service running the aggregation and alert pipeline.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
///
/// The service holds one frozen snapshot of its inputs; recomputation after
/// a filter or data change means calling [`DashboardService::report`] again.
/// Nothing is cached or mutated between passes.
pub struct DashboardService {
    dataset: RawDataset,
    inputs: DashboardInputs,
}

impl DashboardService {
    pub fn new(dataset: RawDataset, inputs: DashboardInputs) -> Self {
        Self { dataset, inputs }
    }

    /// Run one full pass under the given filter and return the complete
    /// report.
    pub fn report(&self, filter: &FilterState) -> Result<DashboardReport, AppError> {
        tracing::debug!(
            from = %filter.range.start,
            to = %filter.range.end,
            sales = self.dataset.sales.len(),
            expenses = self.dataset.expenses.len(),
            returns = self.dataset.returns.len(),
            "running dashboard pass"
        );

        let aggregate = aggregate(&self.dataset, &filter.range);
        let weekly = filter_periods(&aggregate.buckets, filter);
        tracing::debug!(
            buckets = aggregate.buckets.len(),
            after_filter = weekly.len(),
            "aggregation complete"
        );

        let summary = summarize(&weekly);
        let growth = monthly_growth_rows(&self.dataset.sales, &self.dataset.expenses, &filter.range);
        let comparison = compare_windows(&self.dataset, &filter.range);
        let net_profit = daily_net_profit(self.inputs.kpis_day.as_ref());

        // The cash-flow rule falls back to the unfiltered series when the
        // week toggles filtered everything out.
        let alert_buckets: &[WeekBucket] = if weekly.is_empty() {
            &aggregate.buckets
        } else {
            &weekly
        };
        let context = AlertContext {
            kpis_day: self.inputs.kpis_day.as_ref(),
            kpis_week: self.inputs.kpis_week.as_ref(),
            kpis_month: self.inputs.kpis_month.as_ref(),
            goals: self.inputs.goals.as_ref(),
            daily_net_profit: net_profit,
            weekly_buckets: alert_buckets,
            comparison: Some(&comparison),
            slow_movers: &self.inputs.slow_movers,
            return_impact: self.inputs.return_impact.as_ref(),
        };
        let quick_alerts = evaluate_quick_alerts(&context);
        let managerial_alerts = evaluate_managerial_alerts(&context);

        Ok(DashboardReport {
            filter: filter.clone(),
            weekly,
            summary,
            least_sold: aggregate.least_sold,
            growth,
            comparison,
            indicators_day: self
                .inputs
                .kpis_day
                .as_ref()
                .map(|k| indicator_table(k, PeriodGrain::Day)),
            indicators_week: self
                .inputs
                .kpis_week
                .as_ref()
                .map(|k| indicator_table(k, PeriodGrain::Week)),
            indicators_month: self
                .inputs
                .kpis_month
                .as_ref()
                .map(|k| indicator_table(k, PeriodGrain::Month)),
            daily_net_profit: net_profit,
            quick_alerts,
            managerial_alerts,
        })
    }

    /// Indicator table for a single grain, when its snapshot is available.
    pub fn indicators(&self, grain: PeriodGrain) -> Option<IndicatorTable> {
        let kpis = match grain {
            PeriodGrain::Day => self.inputs.kpis_day.as_ref(),
            PeriodGrain::Week => self.inputs.kpis_week.as_ref(),
            PeriodGrain::Month => self.inputs.kpis_month.as_ref(),
        };
        kpis.map(|k| indicator_table(k, grain))
    }
}
