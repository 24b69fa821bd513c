use std::io::Write;

use anyhow::{Context, Result};

use crate::application::DashboardReport;
use crate::domain::{format_cents, GrowthRow, WeekBucket};

/// Write the full report as pretty-printed JSON.
pub fn write_report_json<W: Write>(mut writer: W, report: &DashboardReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, report).context("Failed to serialize report")?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Write the weekly buckets as CSV. Returns the number of rows written.
pub fn write_weekly_csv<W: Write>(writer: W, buckets: &[WeekBucket]) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "key", "label", "start", "end", "revenue", "cost", "expenses", "returned", "discounted",
        "utility",
    ])?;

    for bucket in buckets {
        csv_writer.write_record([
            bucket.key.clone(),
            bucket.label.clone(),
            bucket.display_start.format("%Y-%m-%d").to_string(),
            bucket.display_end.format("%Y-%m-%d").to_string(),
            format_cents(bucket.revenue),
            format_cents(bucket.cost),
            format_cents(bucket.expenses),
            format_cents(bucket.returned),
            format_cents(bucket.discounted),
            format_cents(bucket.utility()),
        ])?;
    }

    csv_writer.flush()?;
    Ok(buckets.len())
}

/// Write the monthly growth table as CSV. Returns the number of rows
/// written.
pub fn write_growth_csv<W: Write>(writer: W, rows: &[GrowthRow]) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "month",
        "label",
        "revenue",
        "expenses",
        "utility",
        "variation",
        "has_previous",
    ])?;

    for row in rows {
        csv_writer.write_record([
            row.month_key.clone(),
            row.label.clone(),
            format_cents(row.revenue),
            format_cents(row.expenses),
            format_cents(row.utility),
            format!("{:.2}", row.variation),
            row.has_previous.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bucket() -> WeekBucket {
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        WeekBucket {
            key: "2024-03-W2".into(),
            label: "Week 2 Mar".into(),
            detail: "04 Mar - 10 Mar".into(),
            month_key: "2024-03".into(),
            week_index: 2,
            order: monday,
            display_start: monday,
            display_end: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            revenue: 15000,
            cost: 8000,
            expenses: 2500,
            returned: 0,
            discounted: 0,
        }
    }

    #[test]
    fn test_write_weekly_csv() {
        let mut out = Vec::new();
        let written = write_weekly_csv(&mut out, &[bucket()]).unwrap();
        assert_eq!(written, 1);

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("key,label,start"));
        let row = lines.next().unwrap();
        assert!(row.contains("2024-03-W2"));
        assert!(row.contains("150.00"));
        assert!(row.ends_with("125.00")); // utility = revenue - expenses
    }
}
