use std::io::Read;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::DashboardInputs;
use crate::domain::{
    parse_cents, parse_date, ExpenseRecord, Goals, KpiSnapshot, RawDataset, ReturnImpact,
    ReturnRecord, SaleRecord, SlowMover,
};

/// KPI snapshots keyed by grain, as the upstream exporter lays them out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KpiSet {
    #[serde(default)]
    pub day: Option<KpiSnapshot>,
    #[serde(default)]
    pub week: Option<KpiSnapshot>,
    #[serde(default)]
    pub month: Option<KpiSnapshot>,
}

/// One dashboard input file: the raw record collections plus the externally
/// computed figures, exactly as fetched. Amounts are integer cents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardBundle {
    #[serde(default)]
    pub sales: Vec<SaleRecord>,
    #[serde(default)]
    pub expenses: Vec<ExpenseRecord>,
    #[serde(default)]
    pub returns: Vec<ReturnRecord>,
    #[serde(default)]
    pub kpis: KpiSet,
    #[serde(default)]
    pub goals: Option<Goals>,
    #[serde(default)]
    pub slow_movers: Vec<SlowMover>,
    #[serde(default)]
    pub return_impact: Option<ReturnImpact>,
}

impl DashboardBundle {
    pub fn into_parts(self) -> (RawDataset, DashboardInputs) {
        (
            RawDataset {
                sales: self.sales,
                expenses: self.expenses,
                returns: self.returns,
            },
            DashboardInputs {
                kpis_day: self.kpis.day,
                kpis_week: self.kpis.week,
                kpis_month: self.kpis.month,
                goals: self.goals,
                slow_movers: self.slow_movers,
                return_impact: self.return_impact,
            },
        )
    }
}

/// Read a dashboard bundle from JSON.
pub fn read_bundle<R: Read>(reader: R) -> Result<DashboardBundle> {
    serde_json::from_reader(reader).context("Failed to parse dashboard bundle")
}

/// Problem found while importing one CSV line.
#[derive(Debug, Clone)]
pub struct ImportIssue {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Result of a CSV import: the usable records plus everything that had to
/// be skipped or degraded, line by line.
#[derive(Debug, Clone)]
pub struct CsvImport<T> {
    pub records: Vec<T>,
    pub skipped: usize,
    pub issues: Vec<ImportIssue>,
}

impl<T> Default for CsvImport<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: 0,
            issues: Vec::new(),
        }
    }
}

fn parse_active(raw: &str) -> bool {
    !matches!(raw.trim(), "0" | "false" | "no")
}

/// Import expenses from CSV with columns `id,amount,date,active`.
///
/// A bad amount skips the line and records an issue; a bad date keeps the
/// record without a date (it will not reach any bucket), mirroring how the
/// engine treats unparseable dates everywhere.
pub fn import_expenses_csv<R: Read>(reader: R) -> Result<CsvImport<ExpenseRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut import = CsvImport::default();

    for (line_num, result) in csv_reader.records().enumerate() {
        let line = line_num + 2; // +2 for header and 0-indexing

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                import.issues.push(ImportIssue {
                    line,
                    field: None,
                    error: format!("CSV parse error: {}", e),
                });
                import.skipped += 1;
                continue;
            }
        };

        let id: i64 = record.get(0).unwrap_or("").trim().parse().unwrap_or(0);
        let amount = match parse_cents(record.get(1).unwrap_or("")) {
            Ok(a) => a,
            Err(e) => {
                import.issues.push(ImportIssue {
                    line,
                    field: Some("amount".to_string()),
                    error: format!("Invalid amount: {}", e),
                });
                import.skipped += 1;
                continue;
            }
        };

        let raw_date = record.get(2).unwrap_or("");
        let date = parse_date(raw_date);
        if date.is_none() && !raw_date.trim().is_empty() {
            import.issues.push(ImportIssue {
                line,
                field: Some("date".to_string()),
                error: format!("Unparseable date '{}'; record kept without one", raw_date),
            });
        }

        import.records.push(ExpenseRecord {
            id,
            amount,
            date,
            active: record.get(3).map(parse_active).unwrap_or(true),
        });
    }

    Ok(import)
}

/// Import returns from CSV with columns `id,amount,date,return_date,active`.
pub fn import_returns_csv<R: Read>(reader: R) -> Result<CsvImport<ReturnRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut import = CsvImport::default();

    for (line_num, result) in csv_reader.records().enumerate() {
        let line = line_num + 2;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                import.issues.push(ImportIssue {
                    line,
                    field: None,
                    error: format!("CSV parse error: {}", e),
                });
                import.skipped += 1;
                continue;
            }
        };

        let id: i64 = record.get(0).unwrap_or("").trim().parse().unwrap_or(0);
        let amount = match parse_cents(record.get(1).unwrap_or("")) {
            Ok(a) => a,
            Err(e) => {
                import.issues.push(ImportIssue {
                    line,
                    field: Some("amount".to_string()),
                    error: format!("Invalid amount: {}", e),
                });
                import.skipped += 1;
                continue;
            }
        };

        import.records.push(ReturnRecord {
            id,
            amount,
            date: record.get(2).and_then(parse_date),
            return_date: record.get(3).and_then(parse_date),
            status: String::new(),
            active: record.get(4).map(parse_active).unwrap_or(true),
        });
    }

    Ok(import)
}
