use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::domain::{parse_timestamp, BusinessId, ReportType};
use crate::scoring::ReportSignal;

/// Failure while reading a report export.
#[derive(Debug, thiserror::Error)]
pub enum ReportImportError {
    #[error("failed to read report export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid report CSV data: {0}")]
    Csv(#[from] csv::Error),
}

/// One exported report row reduced to what scoring needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedReport {
    pub business_id: BusinessId,
    pub signal: ReportSignal,
}

/// Reads `business_id,report_type,created_at` rows. Blank or unparseable timestamps
/// are kept as undated reports.
pub fn parse_reports<R: Read>(reader: R) -> Result<Vec<ImportedReport>, ReportImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut reports = Vec::new();

    for record in csv_reader.deserialize::<ReportRow>() {
        let row = record?;
        let created_at = row.created_at.as_deref().and_then(parse_timestamp);

        reports.push(ImportedReport {
            business_id: BusinessId(row.business_id),
            signal: ReportSignal::new(ReportType::parse(&row.report_type), created_at),
        });
    }

    Ok(reports)
}

pub fn parse_reports_from_path<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<ImportedReport>, ReportImportError> {
    let file = File::open(path)?;
    parse_reports(file)
}

/// Buckets imported rows per business, keeping input order inside each bucket.
pub fn group_by_business(reports: Vec<ImportedReport>) -> BTreeMap<BusinessId, Vec<ReportSignal>> {
    let mut grouped: BTreeMap<BusinessId, Vec<ReportSignal>> = BTreeMap::new();
    for report in reports {
        grouped
            .entry(report.business_id)
            .or_default()
            .push(report.signal);
    }
    grouped
}

#[derive(Debug, Deserialize)]
struct ReportRow {
    business_id: String,
    report_type: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    created_at: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
