use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Stable identifier for a business in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessId(pub String);

impl fmt::Display for BusinessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier assigned to a report at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub String);

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Complaint category chosen by the reporter.
///
/// Only the first four categories carry their own severity weight. The remaining named
/// categories are surfaced to users but score with the default weight, and any wire value
/// outside the known set is kept, trimmed and lowercased, in [`ReportType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReportType {
    PriceGouging,
    NoReceipt,
    SuspiciousActivity,
    UnauthorizedCharges,
    FalseAdvertising,
    HiddenFees,
    Other(String),
}

impl ReportType {
    pub const DEFAULT_SEVERITY_POINTS: u32 = 5;
    pub const DEFAULT_SEVERITY: f64 = Self::DEFAULT_SEVERITY_POINTS as f64;

    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "price_gouging" => Self::PriceGouging,
            "no_receipt" => Self::NoReceipt,
            "suspicious_activity" => Self::SuspiciousActivity,
            "unauthorized_charges" => Self::UnauthorizedCharges,
            "false_advertising" => Self::FalseAdvertising,
            "hidden_fees" => Self::HiddenFees,
            _ => Self::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::PriceGouging => "price_gouging",
            Self::NoReceipt => "no_receipt",
            Self::SuspiciousActivity => "suspicious_activity",
            Self::UnauthorizedCharges => "unauthorized_charges",
            Self::FalseAdvertising => "false_advertising",
            Self::HiddenFees => "hidden_fees",
            Self::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::PriceGouging => "Price gouging",
            Self::NoReceipt => "No receipt",
            Self::SuspiciousActivity => "Suspicious activity",
            Self::UnauthorizedCharges => "Unauthorized charges",
            Self::FalseAdvertising => "False advertising",
            Self::HiddenFees => "Hidden fees",
            Self::Other(_) => "Other",
        }
    }

    /// Whole-number severity on the `0..=10` scale.
    pub fn severity_points(&self) -> u32 {
        match self {
            Self::PriceGouging => 7,
            Self::NoReceipt => 5,
            Self::SuspiciousActivity => 8,
            Self::UnauthorizedCharges => 9,
            Self::FalseAdvertising | Self::HiddenFees | Self::Other(_) => {
                Self::DEFAULT_SEVERITY_POINTS
            }
        }
    }

    pub fn severity_weight(&self) -> f64 {
        f64::from(self.severity_points())
    }
}

impl From<String> for ReportType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<ReportType> for String {
    fn from(value: ReportType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single complaint filed against a business. Never updated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub business_id: BusinessId,
    pub report_type: ReportType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_charged: Option<f64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload accepted from reporters; the service stamps the id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSubmission {
    pub business_id: BusinessId,
    pub report_type: ReportType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount_charged: Option<f64>,
}

/// Directory entry with the cached score projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: BusinessId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub scam_score: f64,
    pub report_count: usize,
    #[serde(default)]
    pub score_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessRegistration {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Parses RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}
