//! Composite scam score derived from a business's report history.
//!
//! Three factors are normalized to `0..=10` and blended with configurable weights:
//! report volume (saturating at twenty reports), recency (linear decay over thirty days,
//! averaged across reports), and severity (mean per-category weight). Factors are kept as
//! exact fractions and weights as thousandths, so the blend rounds half-up to one decimal
//! place without floating-point ties slipping downward.

mod factors;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reports::domain::{Report, ReportType};

use factors::Ratio;

pub const MAX_SCORE: f64 = 10.0;

const WEIGHT_SCALE: f64 = 1000.0;
const TENTHS_PER_MAX_SCORE: u128 = 100;

/// Anything that can feed the calculator: a category and, when known, a submission time.
pub trait ScoringSignal {
    fn report_type(&self) -> &ReportType;
    fn created_at(&self) -> Option<DateTime<Utc>>;
}

impl ScoringSignal for Report {
    fn report_type(&self) -> &ReportType {
        &self.report_type
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

/// Minimal scoring input for callers that do not hold full [`Report`] records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSignal {
    pub report_type: ReportType,
    pub created_at: Option<DateTime<Utc>>,
}

impl ReportSignal {
    pub fn new(report_type: ReportType, created_at: Option<DateTime<Utc>>) -> Self {
        Self {
            report_type,
            created_at,
        }
    }
}

impl ScoringSignal for ReportSignal {
    fn report_type(&self) -> &ReportType {
        &self.report_type
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

/// Weights and thresholds for the blend. `Default` carries the production values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub report_count_weight: f64,
    pub recency_weight: f64,
    pub severity_weight: f64,
    pub saturation_report_count: u32,
    pub recency_window_days: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            report_count_weight: 0.5,
            recency_weight: 0.3,
            severity_weight: 0.2,
            saturation_report_count: 20,
            recency_window_days: 30,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ScoringConfigError> {
        self.weight_units().map(|_| ())
    }

    fn weight_units(&self) -> Result<WeightUnits, ScoringConfigError> {
        if self.saturation_report_count == 0 {
            return Err(ScoringConfigError::ZeroSaturation);
        }
        if self.recency_window_days == 0 {
            return Err(ScoringConfigError::ZeroRecencyWindow);
        }

        Ok(WeightUnits {
            report_count: weight_units(ScoreFactor::ReportCount, self.report_count_weight)?,
            recency: weight_units(ScoreFactor::Recency, self.recency_weight)?,
            severity: weight_units(ScoreFactor::Severity, self.severity_weight)?,
        })
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ScoringConfigError {
    #[error("saturation_report_count must be at least 1")]
    ZeroSaturation,
    #[error("recency_window_days must be at least 1")]
    ZeroRecencyWindow,
    #[error("{factor:?} weight {value} must be a non-negative multiple of 0.001")]
    InvalidWeight { factor: ScoreFactor, value: f64 },
}

fn weight_units(factor: ScoreFactor, value: f64) -> Result<u128, ScoringConfigError> {
    let scaled = value * WEIGHT_SCALE;
    let units = scaled.round();
    if !value.is_finite() || value < 0.0 || (scaled - units).abs() > 1e-6 {
        return Err(ScoringConfigError::InvalidWeight { factor, value });
    }
    Ok(units as u128)
}

/// Weights in thousandths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WeightUnits {
    report_count: u128,
    recency: u128,
    severity: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    ReportCount,
    Recency,
    Severity,
}

/// One factor's normalized value and what it added to the unrounded score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorComponent {
    pub factor: ScoreFactor,
    pub value: f64,
    pub weight: f64,
    pub contribution: f64,
    pub notes: String,
}

/// Calculator output: the rounded score plus an audit trail of its factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub score: f64,
    pub report_count: usize,
    pub dated_reports: usize,
    pub components: Vec<FactorComponent>,
}

impl ScoreBreakdown {
    fn empty() -> Self {
        Self {
            score: 0.0,
            report_count: 0,
            dated_reports: 0,
            components: Vec::new(),
        }
    }

    pub fn component(&self, factor: ScoreFactor) -> Option<&FactorComponent> {
        self.components
            .iter()
            .find(|component| component.factor == factor)
    }
}

/// Stateless scorer; every call is independent and safe to run concurrently.
#[derive(Debug, Clone)]
pub struct ScamScoreCalculator {
    config: ScoringConfig,
    weights: WeightUnits,
}

impl Default for ScamScoreCalculator {
    fn default() -> Self {
        Self {
            config: ScoringConfig::default(),
            weights: WeightUnits {
                report_count: 500,
                recency: 300,
                severity: 200,
            },
        }
    }
}

impl ScamScoreCalculator {
    /// Rejects zero thresholds and weights that are negative, non-finite, or finer than 0.001.
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringConfigError> {
        let weights = config.weight_units()?;
        Ok(Self { config, weights })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score_now<S: ScoringSignal>(&self, reports: &[S]) -> ScoreBreakdown {
        self.score(reports, Utc::now())
    }

    pub fn score<S: ScoringSignal>(&self, reports: &[S], now: DateTime<Utc>) -> ScoreBreakdown {
        if reports.is_empty() {
            return ScoreBreakdown::empty();
        }

        let config = &self.config;
        let report_count = reports.len();

        let count = factors::report_count_factor(report_count, config);
        let (recency, dated_reports) = factors::recency_factor(reports, now, config);
        let severity = factors::severity_factor(reports);

        let components = vec![
            component(
                ScoreFactor::ReportCount,
                count.to_f64(),
                config.report_count_weight,
                format!(
                    "{report_count} report(s), saturating at {}",
                    config.saturation_report_count
                ),
            ),
            component(
                ScoreFactor::Recency,
                recency.to_f64(),
                config.recency_weight,
                if dated_reports == report_count {
                    format!("mean recency over a {}-day window", config.recency_window_days)
                } else {
                    format!(
                        "mean recency over {dated_reports} of {report_count} dated report(s)"
                    )
                },
            ),
            component(
                ScoreFactor::Severity,
                severity.to_f64(),
                config.severity_weight,
                format!("mean category severity {:.2}", severity.to_f64()),
            ),
        ];

        let score = match self.blend_tenths(count, recency, severity) {
            Some(tenths) => tenths.min(TENTHS_PER_MAX_SCORE) as f64 / 10.0,
            None => round_to_tenth(components.iter().map(|c| c.contribution).sum()),
        };

        ScoreBreakdown {
            score,
            report_count,
            dated_reports,
            components,
        }
    }

    /// Weighted sum in tenths of a point, rounded half-up. `None` only on overflow.
    fn blend_tenths(&self, count: Ratio, recency: Ratio, severity: Ratio) -> Option<u128> {
        let weights = &self.weights;
        let thousandths = count
            .checked_scale(weights.report_count)?
            .checked_add(recency.checked_scale(weights.recency)?)?
            .checked_add(severity.checked_scale(weights.severity)?)?;

        thousandths.checked_div(100)?.round_half_up()
    }
}

fn component(factor: ScoreFactor, value: f64, weight: f64, notes: String) -> FactorComponent {
    FactorComponent {
        factor,
        value,
        weight,
        contribution: value * weight,
        notes,
    }
}

/// Half away from zero, which for non-negative scores is half-up.
pub fn round_to_tenth(score: f64) -> f64 {
    ((score * 10.0).round() / 10.0).clamp(0.0, MAX_SCORE)
}

/// Scores `reports` with the default weights.
pub fn calculate_scam_score<S: ScoringSignal>(reports: &[S], now: DateTime<Utc>) -> f64 {
    ScamScoreCalculator::default().score(reports, now).score
}
