use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::bucket::WeekBucket;
use super::growth::WindowComparison;
use super::kpi::{daily_margin_percent, Goals, KpiSnapshot};
use super::money::{format_currency, format_percent};
use super::Cents;

/// Days without a sale after which inventory counts as stagnant.
const STAGNANT_DAYS: i64 = 30;
/// Daily loss above which the operating-loss alert escalates its wording.
const SEVERE_LOSS: Cents = 1_000_00;
/// Cash-flow thresholds over the last two weeks.
const CASH_FLOW_CRITICAL: Cents = -5_000_00;
const CASH_FLOW_COMFORTABLE: Cents = 5_000_00;
/// Return-rate thresholds, in percent, and the scale ceiling for progress.
const RETURN_RATE_CRITICAL: f64 = 30.0;
const RETURN_RATE_WARNING: f64 = 20.0;
const RETURN_RATE_NEUTRAL: f64 = 10.0;

/// Urgency tier shared by the managerial alerts. Quick alerts are binary;
/// managerial alerts are always present and graded by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Neutral,
    Stable,
    Info,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Critical => "critical",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Neutral => "neutral",
            AlertSeverity::Stable => "stable",
            AlertSeverity::Info => "info",
        }
    }

    /// Short badge text for display.
    pub fn label(&self) -> &'static str {
        match self {
            AlertSeverity::Critical => "Critical",
            AlertSeverity::Warning => "Caution",
            AlertSeverity::Neutral => "Fair",
            AlertSeverity::Stable => "Optimal",
            AlertSeverity::Info => "Pending",
        }
    }
}

/// An inventory item with no recent sales, as reported upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowMover {
    pub name: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub last_sale: Option<NaiveDate>,
    pub days_since_sale: i64,
    #[serde(default)]
    pub unit_price: Cents,
    /// Inventory value tied up in this item.
    #[serde(default)]
    pub stuck_value: Cents,
}

/// Precomputed summary of the period's returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnImpact {
    pub total_returned: Cents,
    #[serde(default)]
    pub cash_flow_impact: Cents,
    /// Returns over sales, in percent.
    pub return_rate: f64,
}

/// Read-only view the rules evaluate against. Rebuilt from scratch on every
/// pass; owns nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertContext<'a> {
    pub kpis_day: Option<&'a KpiSnapshot>,
    pub kpis_week: Option<&'a KpiSnapshot>,
    pub kpis_month: Option<&'a KpiSnapshot>,
    pub goals: Option<&'a Goals>,
    pub daily_net_profit: Option<Cents>,
    /// Weekly buckets backing the cash-flow rule; the filtered series when a
    /// week filter is active, the full series otherwise.
    pub weekly_buckets: &'a [WeekBucket],
    pub comparison: Option<&'a WindowComparison>,
    pub slow_movers: &'a [SlowMover],
    pub return_impact: Option<&'a ReturnImpact>,
}

impl<'a> AlertContext<'a> {
    /// Daily goal: the externally managed target wins, then the snapshot's
    /// own goal field, then zero.
    fn daily_goal(&self) -> Cents {
        self.goals
            .and_then(|g| g.daily)
            .or(self.kpis_day.map(|k| k.goal))
            .unwrap_or(0)
    }

    fn stagnant(&self) -> impl Iterator<Item = &'a SlowMover> {
        self.slow_movers
            .iter()
            .filter(|p| p.days_since_sale > STAGNANT_DAYS)
    }
}

// ---------------------------------------------------------------------------
// Quick alerts
// ---------------------------------------------------------------------------

/// The operational rule table, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickRule {
    SalesPace,
    OperatingLoss,
    CriticalMargin,
    StagnantCapital,
}

pub const QUICK_RULES: [QuickRule; 4] = [
    QuickRule::SalesPace,
    QuickRule::OperatingLoss,
    QuickRule::CriticalMargin,
    QuickRule::StagnantCapital,
];

impl QuickRule {
    pub fn title(&self) -> &'static str {
        match self {
            QuickRule::SalesPace => "Sales pace",
            QuickRule::OperatingLoss => "Operating loss",
            QuickRule::CriticalMargin => "Critical margin",
            QuickRule::StagnantCapital => "Stagnant capital",
        }
    }

    pub fn condition(&self) -> &'static str {
        match self {
            QuickRule::SalesPace => "Sales vs daily goal",
            QuickRule::OperatingLoss => "Negative net profit",
            QuickRule::CriticalMargin => "Negative profitability",
            QuickRule::StagnantCapital => "Products unsold for 30+ days",
        }
    }
}

/// One evaluated operational alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickAlert {
    pub rule: QuickRule,
    pub title: String,
    pub condition: String,
    pub active: bool,
    pub detail: Option<String>,
    pub action: String,
    pub progress: f64,
}

/// Evaluate the operational table. The result keeps table order except that
/// active alerts float to the front (stable, so ties keep their order).
pub fn evaluate_quick_alerts(ctx: &AlertContext) -> Vec<QuickAlert> {
    let mut alerts: Vec<QuickAlert> = QUICK_RULES
        .iter()
        .map(|rule| evaluate_quick_rule(*rule, ctx))
        .collect();
    alerts.sort_by_key(|alert| !alert.active);
    alerts
}

fn evaluate_quick_rule(rule: QuickRule, ctx: &AlertContext) -> QuickAlert {
    let (active, detail, action, progress) = match rule {
        QuickRule::SalesPace => sales_pace(ctx),
        QuickRule::OperatingLoss => operating_loss(ctx),
        QuickRule::CriticalMargin => critical_margin(ctx),
        QuickRule::StagnantCapital => stagnant_capital(ctx),
    };
    QuickAlert {
        rule,
        title: rule.title().to_string(),
        condition: rule.condition().to_string(),
        active,
        detail,
        action,
        progress,
    }
}

fn sales_pace(ctx: &AlertContext) -> (bool, Option<String>, String, f64) {
    let goal = ctx.daily_goal();
    let actual = ctx.kpis_day.map(|k| k.revenue).unwrap_or(0);
    let active = ctx.kpis_day.is_some() && goal > 0 && actual < goal;

    let progress = if ctx.kpis_day.is_none() || goal <= 0 {
        0.0
    } else {
        (actual as f64 / goal as f64 * 100.0).min(100.0)
    };

    let detail = if active && ctx.kpis_day.is_some() {
        let pct = if goal > 0 {
            actual as f64 / goal as f64 * 100.0
        } else {
            0.0
        };
        Some(format!("Progress: {}", format_percent(pct)))
    } else {
        None
    };

    let shortfall = goal - actual;
    let action = if shortfall <= 0 {
        "Goal met. Excellent pace.".to_string()
    } else {
        let ratio = if goal > 0 {
            actual as f64 / goal as f64
        } else {
            0.0
        };
        if ratio < 0.5 {
            format!(
                "SLOW: {} short of goal. Reach out to customers.",
                format_currency(shortfall)
            )
        } else {
            format!("Accelerate: {} to go.", format_currency(shortfall))
        }
    };

    (active, detail, action, progress)
}

fn operating_loss(ctx: &AlertContext) -> (bool, Option<String>, String, f64) {
    let profit = ctx.daily_net_profit;
    let active = profit.is_some_and(|p| p < 0);

    let detail = if active {
        profit.map(|p| format!("Balance: {}", format_currency(p)))
    } else {
        None
    };

    let action = match profit {
        Some(p) if p < 0 => {
            let loss = p.abs();
            if loss > SEVERE_LOSS {
                format!(
                    "Severe deficit of {}. Audit the register.",
                    format_currency(loss)
                )
            } else {
                format!("Careful: running {} in the red.", format_currency(loss))
            }
        }
        _ => "Operation healthy. No action needed.".to_string(),
    };

    let progress = if active { 100.0 } else { 0.0 };
    (active, detail, action, progress)
}

fn critical_margin(ctx: &AlertContext) -> (bool, Option<String>, String, f64) {
    let profit = ctx.daily_net_profit;
    let active = profit.is_some_and(|p| p < 0);

    // Same trigger as the operating-loss rule on purpose; this one talks
    // about the margin instead of the absolute balance.
    let detail = if active {
        match (ctx.kpis_day, profit) {
            (Some(kpis), Some(p)) => {
                let margin = daily_margin_percent(kpis.revenue, p);
                Some(format!("Margin: {}", format_percent(margin)))
            }
            _ => None,
        }
    } else {
        None
    };

    let action = if profit.is_some_and(|p| p < 0) {
        "Review costs urgently.".to_string()
    } else {
        "Margin healthy or no sales yet.".to_string()
    };

    let progress = if active { 100.0 } else { 0.0 };
    (active, detail, action, progress)
}

fn stagnant_capital(ctx: &AlertContext) -> (bool, Option<String>, String, f64) {
    let stagnant: Vec<&SlowMover> = ctx.stagnant().collect();
    let stuck_value: Cents = stagnant.iter().map(|p| p.stuck_value).sum();
    let active = !stagnant.is_empty();

    // Always report the held-up amount, even when it is zero.
    let detail = Some(format!("Held up: {}", format_currency(stuck_value)));

    let action = if stagnant.is_empty() {
        "Inventory rotation is fluid. No action needed.".to_string()
    } else {
        format!(
            "Recover {} by discounting {} stagnant product(s).",
            format_currency(stuck_value),
            stagnant.len()
        )
    };

    let progress = if active { 100.0 } else { 0.0 };
    (active, detail, action, progress)
}

// ---------------------------------------------------------------------------
// Managerial alerts
// ---------------------------------------------------------------------------

/// The strategic rule table, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerialRule {
    NetMargin,
    CashFlow,
    SalesTrend,
    ReturnRate,
}

pub const MANAGERIAL_RULES: [ManagerialRule; 4] = [
    ManagerialRule::NetMargin,
    ManagerialRule::CashFlow,
    ManagerialRule::SalesTrend,
    ManagerialRule::ReturnRate,
];

impl ManagerialRule {
    pub fn title(&self) -> &'static str {
        match self {
            ManagerialRule::NetMargin => "Net profit margin",
            ManagerialRule::CashFlow => "Cash flow status",
            ManagerialRule::SalesTrend => "Sales trend",
            ManagerialRule::ReturnRate => "Return rate",
        }
    }

    pub fn condition(&self) -> &'static str {
        match self {
            ManagerialRule::NetMargin => "Profitability over sales",
            ManagerialRule::CashFlow => "Recent balance (2 weeks)",
            ManagerialRule::SalesTrend => "Period comparison",
            ManagerialRule::ReturnRate => "Quality control",
        }
    }
}

/// Outcome of one managerial rule. Always produced; the severity carries the
/// signal and no rule ever fails to evaluate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerialAlert {
    pub rule: ManagerialRule,
    pub title: String,
    pub condition: String,
    pub severity: AlertSeverity,
    pub triggered: bool,
    pub detail: Option<String>,
    pub action: Option<String>,
    pub action_detail: Option<String>,
    pub status_note: Option<String>,
    pub progress: f64,
}

struct Outcome {
    severity: AlertSeverity,
    triggered: bool,
    detail: Option<String>,
    action: Option<String>,
    action_detail: Option<String>,
    status_note: Option<String>,
    progress: f64,
}

impl Outcome {
    fn info(detail: &str, action: Option<&str>) -> Self {
        Self {
            severity: AlertSeverity::Info,
            triggered: false,
            detail: Some(detail.to_string()),
            action: action.map(str::to_string),
            action_detail: None,
            status_note: None,
            progress: 0.0,
        }
    }
}

/// Evaluate the strategic table in order.
pub fn evaluate_managerial_alerts(ctx: &AlertContext) -> Vec<ManagerialAlert> {
    MANAGERIAL_RULES
        .iter()
        .map(|rule| {
            let outcome = match rule {
                ManagerialRule::NetMargin => net_margin(ctx),
                ManagerialRule::CashFlow => cash_flow(ctx),
                ManagerialRule::SalesTrend => sales_trend(ctx),
                ManagerialRule::ReturnRate => return_rate(ctx),
            };
            ManagerialAlert {
                rule: *rule,
                title: rule.title().to_string(),
                condition: rule.condition().to_string(),
                severity: outcome.severity,
                triggered: outcome.triggered,
                detail: outcome.detail,
                action: outcome.action,
                action_detail: outcome.action_detail,
                status_note: outcome.status_note,
                progress: outcome.progress,
            }
        })
        .collect()
}

fn net_margin(ctx: &AlertContext) -> Outcome {
    let Some(kpis) = ctx.kpis_month else {
        return Outcome::info("No data", Some("Awaiting register close."));
    };
    if kpis.revenue <= 0 {
        return Outcome::info("No sales", Some("Start operations to compute margins."));
    }

    let utility = kpis.revenue - kpis.purchases - kpis.expenses;
    let margin = utility as f64 / kpis.revenue as f64;
    let detail = Some(format!("Margin: {}", format_percent(margin * 100.0)));
    let action_detail = Some(format!("Net result: {}", format_currency(utility)));
    let progress = (margin * 100.0).clamp(0.0, 100.0);

    if margin < 0.05 {
        Outcome {
            severity: AlertSeverity::Critical,
            triggered: true,
            detail,
            action: Some("URGENT: freeze purchases and audit for leaks.".to_string()),
            action_detail,
            status_note: Some("Critical profitability.".to_string()),
            progress: 0.0,
        }
    } else if margin < 0.15 {
        Outcome {
            severity: AlertSeverity::Warning,
            triggered: true,
            detail,
            action: Some("Raise selected prices or renegotiate with suppliers.".to_string()),
            action_detail,
            status_note: Some("Thin margin.".to_string()),
            progress,
        }
    } else if margin < 0.25 {
        Outcome {
            severity: AlertSeverity::Neutral,
            triggered: false,
            detail,
            action: Some("Trim small recurring expenses to reach the next tier.".to_string()),
            action_detail,
            status_note: Some("Healthy margin.".to_string()),
            progress,
        }
    } else {
        Outcome {
            severity: AlertSeverity::Stable,
            triggered: false,
            detail,
            action: Some("Capitalize: invest in fast-moving stock or expansion.".to_string()),
            action_detail,
            status_note: Some("Excellent profitability.".to_string()),
            progress,
        }
    }
}

fn cash_flow(ctx: &AlertContext) -> Outcome {
    if ctx.weekly_buckets.is_empty() {
        return Outcome::info("Computing...", None);
    }

    let mut buckets: Vec<&WeekBucket> = ctx.weekly_buckets.iter().collect();
    buckets.sort_by_key(|bucket| bucket.display_end);
    let recent_flow: Cents = buckets
        .iter()
        .rev()
        .take(2)
        .map(|bucket| bucket.utility())
        .sum();

    let detail = Some(format!("Cash flow: {}", format_currency(recent_flow)));

    if recent_flow < CASH_FLOW_CRITICAL {
        Outcome {
            severity: AlertSeverity::Critical,
            triggered: true,
            detail,
            action: Some("Full spending freeze: cover payroll and utilities only.".to_string()),
            action_detail: Some("Stop outflows.".to_string()),
            status_note: Some("Capital drain.".to_string()),
            progress: 0.0,
        }
    } else if recent_flow < 0 {
        Outcome {
            severity: AlertSeverity::Warning,
            triggered: true,
            detail,
            action: Some("Push cash and upfront payments now.".to_string()),
            action_detail: Some("Review outflows.".to_string()),
            status_note: Some("Negative balance.".to_string()),
            progress: 20.0,
        }
    } else if recent_flow < CASH_FLOW_COMFORTABLE {
        Outcome {
            severity: AlertSeverity::Neutral,
            triggered: false,
            detail,
            action: Some("Watch supplier payment due dates.".to_string()),
            action_detail: Some("Keep watching.".to_string()),
            status_note: Some("Tight positive flow.".to_string()),
            progress: 50.0,
        }
    } else {
        Outcome {
            severity: AlertSeverity::Stable,
            triggered: false,
            detail,
            action: Some("Build an emergency fund with this surplus.".to_string()),
            action_detail: Some("Free cash flow.".to_string()),
            status_note: Some("Healthy finances.".to_string()),
            progress: 100.0,
        }
    }
}

fn sales_trend(ctx: &AlertContext) -> Outcome {
    let comparison = match ctx.comparison {
        Some(c) if c.previous.revenue > 0 => c,
        _ => return Outcome::info("No history", Some("Collecting historical data...")),
    };

    let current = comparison.current.revenue;
    let previous = comparison.previous.revenue;
    let growth = (current - previous) as f64 / previous as f64;

    let detail = Some(format!("Change: {}", format_percent(growth * 100.0)));
    let action_detail = Some(format!("Current sales: {}", format_currency(current)));

    if growth < -0.8 {
        // A collapse this steep almost always means the period just started.
        Outcome {
            severity: AlertSeverity::Info,
            triggered: false,
            detail: Some("Start of period".to_string()),
            action: Some("Launch an opening offer to start strong.".to_string()),
            action_detail: Some("Pending.".to_string()),
            status_note: Some("Accumulating data...".to_string()),
            progress: 10.0,
        }
    } else if growth < -0.1 {
        Outcome {
            severity: AlertSeverity::Critical,
            triggered: true,
            detail,
            action: Some("Run a flash sale to recover liquidity.".to_string()),
            action_detail,
            status_note: Some("Significant drop.".to_string()),
            progress: 20.0,
        }
    } else if growth < 0.0 {
        Outcome {
            severity: AlertSeverity::Warning,
            triggered: true,
            detail,
            action: Some("Contact inactive customers.".to_string()),
            action_detail,
            status_note: Some("Slight decline.".to_string()),
            progress: 40.0,
        }
    } else if growth < 0.05 {
        Outcome {
            severity: AlertSeverity::Neutral,
            triggered: false,
            detail,
            action: Some("Bundle products to raise the average ticket.".to_string()),
            action_detail,
            status_note: Some("Steady sales.".to_string()),
            progress: 60.0,
        }
    } else {
        Outcome {
            severity: AlertSeverity::Stable,
            triggered: false,
            detail,
            action: Some("Good moment to try new sales channels.".to_string()),
            action_detail,
            status_note: Some("Solid growth.".to_string()),
            progress: 100.0,
        }
    }
}

fn return_rate(ctx: &AlertContext) -> Outcome {
    let impact = match ctx.return_impact {
        Some(impact) if impact.total_returned != 0 => impact,
        _ => {
            return Outcome {
                severity: AlertSeverity::Stable,
                triggered: false,
                detail: Some("0.0% ($0.00)".to_string()),
                action: Some("Congratulate the team: impeccable quality.".to_string()),
                action_detail: Some("Excellent.".to_string()),
                status_note: Some("Optimal rate.".to_string()),
                progress: 0.0,
            };
        }
    };

    let rate = impact.return_rate;
    let returned = format_currency(impact.total_returned);
    let detail = Some(format!("{:.2}% retained ({})", rate, returned));
    let progress = (rate / RETURN_RATE_CRITICAL * 100.0).min(100.0);

    if rate >= RETURN_RATE_CRITICAL {
        Outcome {
            severity: AlertSeverity::Critical,
            triggered: true,
            detail,
            action: Some(format!(
                "Stop: monthly limit (30%) exceeded. {} leaking.",
                returned
            )),
            action_detail: Some("Review urgently.".to_string()),
            status_note: Some(format!("Impact of {}.", returned)),
            progress: 100.0,
        }
    } else if rate >= RETURN_RATE_WARNING {
        Outcome {
            severity: AlertSeverity::Warning,
            triggered: true,
            detail,
            action: Some(format!(
                "{} lost to returns. Check for factory vs packaging faults.",
                returned
            )),
            action_detail: Some("Monitor.".to_string()),
            status_note: Some("Approaching the limit.".to_string()),
            progress,
        }
    } else if rate >= RETURN_RATE_NEUTRAL {
        Outcome {
            severity: AlertSeverity::Neutral,
            triggered: false,
            detail,
            action: Some("Run a post-sale satisfaction survey.".to_string()),
            action_detail: Some("Reduce incidents.".to_string()),
            status_note: Some("Acceptable level.".to_string()),
            progress,
        }
    } else {
        Outcome {
            severity: AlertSeverity::Stable,
            triggered: false,
            detail,
            action: Some(format!("Minimal returns ({}). Impeccable quality.", returned)),
            action_detail: Some("Excellent.".to_string()),
            status_note: Some("Optimal rate.".to_string()),
            // Keep a visible sliver of bar even for tiny rates.
            progress: progress.max(5.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day_kpis(revenue: Cents, expenses: Cents, goal: Cents) -> KpiSnapshot {
        KpiSnapshot {
            revenue,
            expenses,
            goal,
            ..Default::default()
        }
    }

    #[test]
    fn test_sales_pace_slow_branch() {
        let kpis = day_kpis(400_00, 0, 0);
        let goals = Goals {
            daily: Some(1000_00),
            ..Default::default()
        };
        let ctx = AlertContext {
            kpis_day: Some(&kpis),
            goals: Some(&goals),
            ..Default::default()
        };
        let (active, detail, action, progress) = sales_pace(&ctx);
        assert!(active);
        assert_eq!(progress, 40.0);
        assert_eq!(detail.as_deref(), Some("Progress: 40.0%"));
        assert!(action.starts_with("SLOW"));
    }

    #[test]
    fn test_sales_pace_goal_met() {
        let kpis = day_kpis(1200_00, 0, 1000_00);
        let ctx = AlertContext {
            kpis_day: Some(&kpis),
            ..Default::default()
        };
        let (active, detail, action, progress) = sales_pace(&ctx);
        assert!(!active);
        assert_eq!(progress, 100.0);
        assert_eq!(detail, None);
        assert_eq!(action, "Goal met. Excellent pace.");
    }

    #[test]
    fn test_sales_pace_goal_fallback_order() {
        // External goal wins over the snapshot's own goal.
        let kpis = day_kpis(500_00, 0, 2000_00);
        let goals = Goals {
            daily: Some(400_00),
            ..Default::default()
        };
        let ctx = AlertContext {
            kpis_day: Some(&kpis),
            goals: Some(&goals),
            ..Default::default()
        };
        assert_eq!(ctx.daily_goal(), 400_00);
        let (active, ..) = sales_pace(&ctx);
        assert!(!active);

        // Without external goals, the snapshot goal applies.
        let ctx = AlertContext {
            kpis_day: Some(&kpis),
            ..Default::default()
        };
        assert_eq!(ctx.daily_goal(), 2000_00);
    }

    #[test]
    fn test_operating_loss_branches() {
        let ctx = AlertContext {
            daily_net_profit: Some(-500_00),
            ..Default::default()
        };
        let (active, detail, action, progress) = operating_loss(&ctx);
        assert!(active);
        assert_eq!(progress, 100.0);
        assert_eq!(detail.as_deref(), Some("Balance: -$500.00"));
        assert!(action.starts_with("Careful"));

        let ctx = AlertContext {
            daily_net_profit: Some(-2500_00),
            ..Default::default()
        };
        let (_, _, action, _) = operating_loss(&ctx);
        assert!(action.starts_with("Severe deficit"));

        let ctx = AlertContext {
            daily_net_profit: Some(0),
            ..Default::default()
        };
        let (active, detail, _, progress) = operating_loss(&ctx);
        assert!(!active);
        assert_eq!(detail, None);
        assert_eq!(progress, 0.0);
    }

    #[test]
    fn test_critical_margin_reports_percentage() {
        let kpis = day_kpis(1000_00, 0, 0);
        let ctx = AlertContext {
            kpis_day: Some(&kpis),
            daily_net_profit: Some(-250_00),
            ..Default::default()
        };
        let (active, detail, _, _) = critical_margin(&ctx);
        assert!(active);
        assert_eq!(detail.as_deref(), Some("Margin: -25.0%"));
    }

    #[test]
    fn test_stagnant_capital_reports_zero_value() {
        let ctx = AlertContext::default();
        let (active, detail, action, progress) = stagnant_capital(&ctx);
        assert!(!active);
        assert_eq!(detail.as_deref(), Some("Held up: $0.00"));
        assert_eq!(progress, 0.0);
        assert!(action.contains("fluid"));
    }

    #[test]
    fn test_stagnant_capital_sums_stuck_value() {
        let movers = vec![
            SlowMover {
                name: "dusty".into(),
                stock: 4,
                last_sale: None,
                days_since_sale: 45,
                unit_price: 100_00,
                stuck_value: 400_00,
            },
            SlowMover {
                name: "fresh".into(),
                stock: 2,
                last_sale: None,
                days_since_sale: 10,
                unit_price: 50_00,
                stuck_value: 100_00,
            },
        ];
        let ctx = AlertContext {
            slow_movers: &movers,
            ..Default::default()
        };
        let (active, detail, action, progress) = stagnant_capital(&ctx);
        assert!(active);
        assert_eq!(detail.as_deref(), Some("Held up: $400.00"));
        assert!(action.contains("1 stagnant"));
        assert_eq!(progress, 100.0);
    }

    #[test]
    fn test_quick_alerts_sort_active_first_stable() {
        let movers = vec![SlowMover {
            name: "dusty".into(),
            stock: 1,
            last_sale: None,
            days_since_sale: 60,
            unit_price: 100,
            stuck_value: 100,
        }];
        let ctx = AlertContext {
            slow_movers: &movers,
            daily_net_profit: Some(-100),
            ..Default::default()
        };
        let alerts = evaluate_quick_alerts(&ctx);
        let order: Vec<QuickRule> = alerts.iter().map(|a| a.rule).collect();
        // The three active rules keep their table order ahead of the
        // inactive one.
        assert_eq!(
            order,
            vec![
                QuickRule::OperatingLoss,
                QuickRule::CriticalMargin,
                QuickRule::StagnantCapital,
                QuickRule::SalesPace,
            ]
        );
    }

    fn month_kpis(revenue: Cents, purchases: Cents, expenses: Cents) -> KpiSnapshot {
        KpiSnapshot {
            revenue,
            purchases,
            expenses,
            ..Default::default()
        }
    }

    #[test]
    fn test_net_margin_no_data() {
        let evaluated = net_margin(&AlertContext::default());
        assert_eq!(evaluated.severity, AlertSeverity::Info);
        assert_eq!(evaluated.detail.as_deref(), Some("No data"));
    }

    #[test]
    fn test_net_margin_exact_five_percent_is_warning() {
        // margin == 0.05 fails the strict critical check and lands in the
        // warning band.
        let kpis = month_kpis(10_000_00, 3_000_00, 6_500_00);
        let ctx = AlertContext {
            kpis_month: Some(&kpis),
            ..Default::default()
        };
        let evaluated = net_margin(&ctx);
        assert_eq!(evaluated.severity, AlertSeverity::Warning);
        assert!(evaluated.triggered);
        assert_eq!(evaluated.detail.as_deref(), Some("Margin: 5.0%"));
    }

    #[test]
    fn test_net_margin_tiers() {
        let cases = [
            (10_000_00, 9_800_00, AlertSeverity::Critical, 0.0),
            (10_000_00, 9_000_00, AlertSeverity::Warning, 10.0),
            (10_000_00, 8_000_00, AlertSeverity::Neutral, 20.0),
            (10_000_00, 5_000_00, AlertSeverity::Stable, 50.0),
        ];
        for (revenue, costs, severity, progress) in cases {
            let kpis = month_kpis(revenue, costs, 0);
            let ctx = AlertContext {
                kpis_month: Some(&kpis),
                ..Default::default()
            };
            let evaluated = net_margin(&ctx);
            assert_eq!(evaluated.severity, severity);
            assert_eq!(evaluated.progress, progress);
        }
    }

    fn bucket(end_day: u32, revenue: Cents, expenses: Cents) -> WeekBucket {
        let end = NaiveDate::from_ymd_opt(2024, 3, end_day).unwrap();
        WeekBucket {
            key: format!("2024-03-W{}", end_day / 7 + 1),
            label: String::new(),
            detail: String::new(),
            month_key: "2024-03".into(),
            week_index: (end_day / 7 + 1) as i64,
            order: end - chrono::Duration::days(6),
            display_start: end - chrono::Duration::days(6),
            display_end: end,
            revenue,
            cost: 0,
            expenses,
            returned: 0,
            discounted: 0,
        }
    }

    #[test]
    fn test_cash_flow_uses_last_two_weeks() {
        let buckets = vec![
            bucket(10, 90_000_00, 0),
            bucket(17, 1_000_00, 2_000_00),
            bucket(24, 500_00, 2_500_00),
        ];
        let ctx = AlertContext {
            weekly_buckets: &buckets,
            ..Default::default()
        };
        // Last two weeks: (1000-2000) + (500-2500) = -3000.
        let evaluated = cash_flow(&ctx);
        assert_eq!(evaluated.severity, AlertSeverity::Warning);
        assert_eq!(evaluated.progress, 20.0);
        assert_eq!(evaluated.detail.as_deref(), Some("Cash flow: -$3000.00"));
    }

    #[test]
    fn test_cash_flow_tiers() {
        let cases = [
            (-6_000_00, AlertSeverity::Critical, 0.0),
            (-100_00, AlertSeverity::Warning, 20.0),
            (3_000_00, AlertSeverity::Neutral, 50.0),
            (9_000_00, AlertSeverity::Stable, 100.0),
        ];
        for (utility, severity, progress) in cases {
            let buckets = vec![bucket(10, utility, 0)];
            let ctx = AlertContext {
                weekly_buckets: &buckets,
                ..Default::default()
            };
            let evaluated = cash_flow(&ctx);
            assert_eq!(evaluated.severity, severity);
            assert_eq!(evaluated.progress, progress);
        }
    }

    #[test]
    fn test_cash_flow_no_data() {
        let evaluated = cash_flow(&AlertContext::default());
        assert_eq!(evaluated.severity, AlertSeverity::Info);
    }

    fn comparison(current: Cents, previous: Cents) -> WindowComparison {
        use crate::domain::calendar::DateRange;
        use crate::domain::growth::WindowTotals;
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
        .unwrap();
        WindowComparison {
            current: WindowTotals {
                label: "Current period".into(),
                range,
                revenue: current,
                expenses: 0,
                utility: current,
            },
            previous: WindowTotals {
                label: "Previous period".into(),
                range,
                revenue: previous,
                expenses: 0,
                utility: previous,
            },
        }
    }

    #[test]
    fn test_sales_trend_tiers() {
        let cases = [
            (1_00, 100_00, AlertSeverity::Info, 10.0),      // -99%
            (80_00, 100_00, AlertSeverity::Critical, 20.0), // -20%
            (95_00, 100_00, AlertSeverity::Warning, 40.0),  // -5%
            (102_00, 100_00, AlertSeverity::Neutral, 60.0), // +2%
            (120_00, 100_00, AlertSeverity::Stable, 100.0), // +20%
        ];
        for (current, previous, severity, progress) in cases {
            let cmp = comparison(current, previous);
            let ctx = AlertContext {
                comparison: Some(&cmp),
                ..Default::default()
            };
            let evaluated = sales_trend(&ctx);
            assert_eq!(evaluated.severity, severity);
            assert_eq!(evaluated.progress, progress);
        }
    }

    #[test]
    fn test_sales_trend_without_history() {
        let cmp = comparison(100_00, 0);
        let ctx = AlertContext {
            comparison: Some(&cmp),
            ..Default::default()
        };
        let evaluated = sales_trend(&ctx);
        assert_eq!(evaluated.severity, AlertSeverity::Info);
        assert_eq!(evaluated.detail.as_deref(), Some("No history"));
    }

    #[test]
    fn test_return_rate_zero_is_stable_with_forced_zero_text() {
        let impact = ReturnImpact {
            total_returned: 0,
            cash_flow_impact: 0,
            return_rate: 0.0,
        };
        let ctx = AlertContext {
            return_impact: Some(&impact),
            ..Default::default()
        };
        let evaluated = return_rate(&ctx);
        assert_eq!(evaluated.severity, AlertSeverity::Stable);
        assert_eq!(evaluated.detail.as_deref(), Some("0.0% ($0.00)"));
        assert_eq!(evaluated.progress, 0.0);
    }

    #[test]
    fn test_return_rate_tiers() {
        let cases = [
            (30.0, AlertSeverity::Critical, 100.0),
            (22.5, AlertSeverity::Warning, 75.0),
            (15.0, AlertSeverity::Neutral, 50.0),
            (0.9, AlertSeverity::Stable, 5.0), // progress floor
        ];
        for (rate, severity, progress) in cases {
            let impact = ReturnImpact {
                total_returned: 500_00,
                cash_flow_impact: -500_00,
                return_rate: rate,
            };
            let ctx = AlertContext {
                return_impact: Some(&impact),
                ..Default::default()
            };
            let evaluated = return_rate(&ctx);
            assert_eq!(evaluated.severity, severity);
            assert_eq!(evaluated.progress, progress);
        }
    }

    #[test]
    fn test_every_rule_is_total_on_an_empty_context() {
        let ctx = AlertContext::default();
        assert_eq!(evaluate_quick_alerts(&ctx).len(), 4);
        let managerial = evaluate_managerial_alerts(&ctx);
        assert_eq!(managerial.len(), 4);
        for alert in &managerial {
            assert!(matches!(
                alert.severity,
                AlertSeverity::Info | AlertSeverity::Stable
            ));
            assert!(!alert.triggered);
        }
    }
}
