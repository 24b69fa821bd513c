use std::fs::File;
use std::io::{stdout, Write};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};

use crate::application::{AppError, DashboardReport, DashboardService};
use crate::domain::{
    default_range, format_cents, format_currency, month_range, parse_date, parse_month_key,
    week_range_for_month, DateRange, FilterState, PeriodGrain,
};
use crate::io::{read_bundle, write_growth_csv, write_report_json, write_weekly_csv};

/// Mirador - Retail Analytics Dashboard
#[derive(Parser)]
#[command(name = "mirador")]
#[command(about = "A local-first retail analytics and alerting engine")]
#[command(version)]
pub struct Cli {
    /// Dashboard bundle file (JSON) with records, KPI snapshots and goals
    #[arg(short, long, global = true, default_value = "dashboard.json")]
    pub input: String,

    /// Start of the period (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub from: Option<String>,

    /// End of the period (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub to: Option<String>,

    /// Restrict week toggles to this month (YYYY-MM); also sets the period
    /// when --from/--to are omitted
    #[arg(long, global = true)]
    pub month: Option<String>,

    /// Toggled week slices of the selected month (0-3, comma separated)
    #[arg(long, global = true, value_delimiter = ',')]
    pub weeks: Vec<u8>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Weekly buckets over the selected period
    Weekly {
        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Totals across the selected period
    Summary,

    /// Month-over-month growth table
    Growth {
        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Selected period vs the equal-length preceding window
    Compare,

    /// Indicator table for one KPI grain
    Kpis {
        /// KPI grain: day, week, month
        #[arg(default_value = "day")]
        period: String,
    },

    /// Quick and managerial alerts
    Alerts,

    /// Least-sold products over the selected period
    LeastSold {
        /// Show at most this many products
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Toggleable weeks of the month given with --month
    Weeks,

    /// Write a computed report to a file or stdout
    Export {
        /// What to export: report, weekly, growth
        what: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Cli {
    pub fn run(self) -> Result<()> {
        init_tracing(self.verbose);

        // The week listing needs no data, only the month.
        if let Commands::Weeks = &self.command {
            let month = self
                .month
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("weeks requires --month"))?;
            return print_week_ranges(month);
        }

        let file = File::open(&self.input)
            .with_context(|| format!("Failed to open bundle file: {}", self.input))?;
        let bundle = read_bundle(file)?;
        let (dataset, inputs) = bundle.into_parts();
        let service = DashboardService::new(dataset, inputs);

        let filter = self.build_filter()?;
        let report = service.report(&filter)?;

        match &self.command {
            Commands::Weekly { format } => print_weekly(&report, format),
            Commands::Summary => print_summary(&report),
            Commands::Growth { format } => print_growth(&report, format),
            Commands::Compare => print_compare(&report),
            Commands::Kpis { period } => print_kpis(&report, period),
            Commands::Alerts => print_alerts(&report),
            Commands::LeastSold { limit } => print_least_sold(&report, *limit),
            // Handled before the bundle is loaded.
            Commands::Weeks => Ok(()),
            Commands::Export { what, output } => export(&report, what, output.as_deref()),
        }
    }

    fn build_filter(&self) -> Result<FilterState> {
        let range = self.build_range()?;

        if self.weeks.is_empty() {
            return Ok(FilterState::new(range));
        }

        let month = self.month.as_deref().ok_or_else(|| {
            anyhow::anyhow!("--weeks requires --month to name the month the toggles refer to")
        })?;
        if let Some(bad) = self.weeks.iter().find(|w| **w > 3) {
            anyhow::bail!("Week slice {} out of range (0-3)", bad);
        }
        Ok(FilterState::with_weeks(range, month, &self.weeks))
    }

    fn build_range(&self) -> Result<DateRange> {
        if let (Some(from), Some(to)) = (self.from.as_deref(), self.to.as_deref()) {
            let start = parse_date(from)
                .ok_or_else(|| AppError::InvalidDate(from.to_string()))?;
            let end = parse_date(to).ok_or_else(|| AppError::InvalidDate(to.to_string()))?;
            let range = DateRange::new(start, end).map_err(AppError::from)?;
            return Ok(range);
        }
        if self.from.is_some() != self.to.is_some() {
            anyhow::bail!("--from and --to must be given together");
        }

        if let Some(month) = self.month.as_deref() {
            let (year, month_num) = parse_month_key(month)
                .ok_or_else(|| AppError::InvalidMonthKey(month.to_string()))?;
            // parse_month_key already vetted year and month.
            return Ok(month_range(year, month_num).unwrap());
        }

        Ok(default_range(Local::now().date_naive()))
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max.saturating_sub(3)])
    }
}

fn print_period(report: &DashboardReport) {
    println!(
        "Period: {} to {}",
        report.filter.range.start.format("%Y-%m-%d"),
        report.filter.range.end.format("%Y-%m-%d")
    );
    if report.filter.filters_by_weeks() {
        let weeks: Vec<String> = report
            .filter
            .selected_weeks
            .iter()
            .map(|w| (w + 1).to_string())
            .collect();
        println!(
            "Weeks: {} of {}",
            weeks.join(", "),
            report.filter.selected_month.as_deref().unwrap_or("-")
        );
    }
    println!();
}

fn print_weekly(report: &DashboardReport, format: &str) -> Result<()> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report.weekly)?);
        }
        "csv" => {
            write_weekly_csv(stdout(), &report.weekly)?;
        }
        _ => {
            println!("Weekly Comparison");
            print_period(report);
            println!(
                "{:<14} {:<14} {:>12} {:>12} {:>12} {:>12} {:>12}",
                "WEEK", "RANGE", "REVENUE", "COST", "EXPENSES", "RETURNED", "UTILITY"
            );
            println!("{}", "-".repeat(94));
            for bucket in &report.weekly {
                println!(
                    "{:<14} {:<14} {:>12} {:>12} {:>12} {:>12} {:>12}",
                    truncate(&bucket.label, 14),
                    truncate(&bucket.detail, 14),
                    format_cents(bucket.revenue),
                    format_cents(bucket.cost),
                    format_cents(bucket.expenses),
                    format_cents(bucket.returned),
                    format_cents(bucket.utility()),
                );
            }
            println!("{}", "-".repeat(94));
            println!(
                "{:<29} {:>12} {:>12} {:>12} {:>12} {:>12}",
                "TOTAL",
                format_cents(report.summary.revenue),
                format_cents(report.summary.cost),
                format_cents(report.summary.expenses),
                format_cents(report.summary.returned),
                format_cents(report.summary.net_utility),
            );
        }
    }
    Ok(())
}

fn print_summary(report: &DashboardReport) -> Result<()> {
    println!("Period Summary");
    print_period(report);
    let summary = &report.summary;
    println!("{:<24} {:>14}", "Revenue", format_currency(summary.revenue));
    println!(
        "{:<24} {:>14}",
        "Cost of goods",
        format_currency(summary.cost)
    );
    println!(
        "{:<24} {:>14}",
        "Operating expenses",
        format_currency(summary.expenses)
    );
    println!(
        "{:<24} {:>14}",
        "Returned",
        format_currency(summary.returned)
    );
    println!(
        "{:<24} {:>14}",
        "Discounted sales",
        format_currency(summary.discounted)
    );
    println!("{}", "-".repeat(39));
    println!(
        "{:<24} {:>14}",
        "Net utility",
        format_currency(summary.net_utility)
    );
    Ok(())
}

fn print_growth(report: &DashboardReport, format: &str) -> Result<()> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report.growth)?);
        }
        "csv" => {
            write_growth_csv(stdout(), &report.growth)?;
        }
        _ => {
            println!("Monthly Growth");
            print_period(report);
            println!(
                "{:<16} {:>12} {:>12} {:>12} {:>10}",
                "MONTH", "REVENUE", "EXPENSES", "UTILITY", "CHANGE"
            );
            println!("{}", "-".repeat(66));
            for row in &report.growth {
                let change = if row.has_previous {
                    format!("{:+.1}%", row.variation)
                } else {
                    "-".to_string()
                };
                println!(
                    "{:<16} {:>12} {:>12} {:>12} {:>10}",
                    truncate(&row.label, 16),
                    format_cents(row.revenue),
                    format_cents(row.expenses),
                    format_cents(row.utility),
                    change,
                );
            }
        }
    }
    Ok(())
}

fn print_compare(report: &DashboardReport) -> Result<()> {
    let comparison = &report.comparison;
    println!("Period Comparison");
    print_period(report);
    println!(
        "{:<18} {:>24} {:>24}",
        "", comparison.current.label, comparison.previous.label
    );
    println!("{}", "-".repeat(68));
    for (label, current, previous) in [
        (
            "Revenue",
            comparison.current.revenue,
            comparison.previous.revenue,
        ),
        (
            "Expenses",
            comparison.current.expenses,
            comparison.previous.expenses,
        ),
        (
            "Utility",
            comparison.current.utility,
            comparison.previous.utility,
        ),
    ] {
        println!(
            "{:<18} {:>24} {:>24}",
            label,
            format_currency(current),
            format_currency(previous)
        );
    }
    println!("{}", "-".repeat(68));
    println!(
        "Revenue change: {:+.1}%   Utility change: {:+.1}%",
        comparison.revenue_variation(),
        comparison.utility_variation()
    );
    Ok(())
}

fn print_kpis(report: &DashboardReport, period: &str) -> Result<()> {
    let (grain, table) = match period {
        "week" => (PeriodGrain::Week, &report.indicators_week),
        "month" => (PeriodGrain::Month, &report.indicators_month),
        "day" => (PeriodGrain::Day, &report.indicators_day),
        other => anyhow::bail!("Invalid period '{}'. Valid periods: day, week, month", other),
    };

    let Some(table) = table else {
        println!("No {} KPI snapshot in the bundle.", grain);
        return Ok(());
    };

    println!("Financial Indicators ({})", grain);
    println!();
    println!("{:<34} {:>14}", "INDICATOR", "AMOUNT");
    println!("{}", "-".repeat(49));
    for row in &table.rows {
        if row.is_total {
            continue;
        }
        println!("{:<34} {:>14}", row.label, row.display);
    }
    println!("{}", "-".repeat(49));
    for row in table.rows.iter().filter(|row| row.is_total) {
        println!("{:<34} {:>14}", row.label, row.display);
    }
    println!(
        "{:<34} {:>14}",
        table.general_label,
        format_currency(table.general_total)
    );

    if grain == PeriodGrain::Day {
        if let Some(profit) = report.daily_net_profit {
            println!();
            println!(
                "{:<34} {:>14}",
                "Daily net profit",
                format_currency(profit)
            );
        }
    }
    Ok(())
}

fn print_alerts(report: &DashboardReport) -> Result<()> {
    println!("Quick Alerts");
    println!();
    println!(
        "{:<8} {:<18} {:<22} {:>9}  {}",
        "STATUS", "ALERT", "DETAIL", "PROGRESS", "ACTION"
    );
    println!("{}", "-".repeat(100));
    for alert in &report.quick_alerts {
        println!(
            "{:<8} {:<18} {:<22} {:>8.0}%  {}",
            if alert.active { "Active" } else { "Stable" },
            truncate(&alert.title, 18),
            truncate(alert.detail.as_deref().unwrap_or("-"), 22),
            alert.progress,
            alert.action,
        );
    }

    println!();
    println!("Managerial Alerts");
    println!();
    println!(
        "{:<10} {:<20} {:<24} {:>9}  {}",
        "SEVERITY", "ALERT", "DETAIL", "PROGRESS", "ACTION"
    );
    println!("{}", "-".repeat(100));
    for alert in &report.managerial_alerts {
        println!(
            "{:<10} {:<20} {:<24} {:>8.0}%  {}",
            alert.severity.label(),
            truncate(&alert.title, 20),
            truncate(alert.detail.as_deref().unwrap_or("-"), 24),
            alert.progress,
            alert.action.as_deref().unwrap_or("-"),
        );
        if let Some(note) = &alert.status_note {
            println!("{:<10} {:<20} {}", "", "", note);
        }
    }
    Ok(())
}

fn print_week_ranges(month: &str) -> Result<()> {
    let (year, month_num) =
        parse_month_key(month).ok_or_else(|| AppError::InvalidMonthKey(month.to_string()))?;

    println!("Toggleable weeks of {}", month);
    println!();
    for index in 0u8..4 {
        match week_range_for_month(year, month_num, index) {
            Some(range) => println!(
                "  --weeks {}   {} - {}",
                index,
                range.start.format("%d %b"),
                range.end.format("%d %b")
            ),
            None => break,
        }
    }
    Ok(())
}

fn print_least_sold(report: &DashboardReport, limit: usize) -> Result<()> {
    println!("Least-Sold Products");
    print_period(report);
    println!("{:<34} {:>10}", "PRODUCT", "QUANTITY");
    println!("{}", "-".repeat(45));
    for product in report.least_sold.iter().take(limit) {
        println!(
            "{:<34} {:>10}",
            truncate(&product.product, 34),
            product.quantity
        );
    }
    Ok(())
}

fn export(report: &DashboardReport, what: &str, output: Option<&str>) -> Result<()> {
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match what {
        "report" => {
            write_report_json(writer, report)?;
            if output.is_some() {
                eprintln!("Exported full report");
            }
        }
        "weekly" => {
            let count = write_weekly_csv(writer, &report.weekly)?;
            if output.is_some() {
                eprintln!("Exported {} weekly buckets", count);
            }
        }
        "growth" => {
            let count = write_growth_csv(writer, &report.growth)?;
            if output.is_some() {
                eprintln!("Exported {} growth rows", count);
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: report, weekly, growth",
                what
            );
        }
    }

    Ok(())
}
