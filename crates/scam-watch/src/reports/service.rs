use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{
    Business, BusinessId, BusinessRegistration, Report, ReportId, ReportSubmission, ReportType,
};
use super::repository::{BusinessStore, ReportStore, StoreError};
use crate::config::ScoreMaintenanceConfig;
use crate::scoring::{ScamScoreCalculator, ScoreBreakdown};

pub const MAX_DESCRIPTION_CHARS: usize = 2000;

/// Service composing the report/business stores with the scam score calculator.
pub struct ScamWatchService<R, B> {
    reports: Arc<R>,
    businesses: Arc<B>,
    calculator: Arc<ScamScoreCalculator>,
    settings: ScoreMaintenanceConfig,
    report_sequence: AtomicU64,
    business_sequence: AtomicU64,
}

impl<R, B> ScamWatchService<R, B>
where
    R: ReportStore + 'static,
    B: BusinessStore + 'static,
{
    pub fn new(reports: Arc<R>, businesses: Arc<B>, settings: ScoreMaintenanceConfig) -> Self {
        Self::with_calculator(reports, businesses, ScamScoreCalculator::default(), settings)
    }

    pub fn with_calculator(
        reports: Arc<R>,
        businesses: Arc<B>,
        calculator: ScamScoreCalculator,
        settings: ScoreMaintenanceConfig,
    ) -> Self {
        Self {
            reports,
            businesses,
            calculator: Arc::new(calculator),
            settings,
            report_sequence: AtomicU64::new(1),
            business_sequence: AtomicU64::new(1),
        }
    }

    pub fn calculator(&self) -> &ScamScoreCalculator {
        &self.calculator
    }

    pub fn settings(&self) -> &ScoreMaintenanceConfig {
        &self.settings
    }

    fn next_report_id(&self) -> ReportId {
        let id = self.report_sequence.fetch_add(1, Ordering::Relaxed);
        ReportId(format!("rpt-{id:06}"))
    }

    fn next_business_id(&self) -> BusinessId {
        let id = self.business_sequence.fetch_add(1, Ordering::Relaxed);
        BusinessId(format!("biz-{id:06}"))
    }

    /// Add a business to the directory with an empty report history.
    pub fn register_business(
        &self,
        registration: BusinessRegistration,
    ) -> Result<Business, ScamWatchError> {
        let name = registration.name.trim();
        if name.is_empty() {
            return Err(SubmissionError::BlankBusinessName.into());
        }

        let business = Business {
            id: self.next_business_id(),
            name: name.to_string(),
            category: non_blank(registration.category),
            address: non_blank(registration.address),
            scam_score: 0.0,
            report_count: 0,
            score_updated_at: None,
        };

        let stored = self.businesses.insert(business)?;
        info!(business_id = %stored.id, name = %stored.name, "business registered");
        Ok(stored)
    }

    /// Record a report stamped with the current time and refresh the business's score.
    pub fn submit_report(
        &self,
        submission: ReportSubmission,
    ) -> Result<ReportReceipt, ScamWatchError> {
        self.submit_report_at(submission, Utc::now())
    }

    pub fn submit_report_at(
        &self,
        submission: ReportSubmission,
        now: DateTime<Utc>,
    ) -> Result<ReportReceipt, ScamWatchError> {
        let ReportSubmission {
            business_id,
            report_type,
            description,
            amount_charged,
        } = submission;

        let description = validate_description(description)?;
        let amount_charged = validate_amount(amount_charged)?;

        let business = self
            .businesses
            .fetch(&business_id)?
            .ok_or_else(|| SubmissionError::UnknownBusiness(business_id.clone()))?;

        let report = Report {
            id: self.next_report_id(),
            business_id,
            report_type,
            description,
            amount_charged,
            created_at: Some(now),
        };

        let stored = self.reports.insert(report)?;
        info!(
            report_id = %stored.id,
            business_id = %stored.business_id,
            report_type = %stored.report_type,
            "report submitted"
        );

        let update = self.recompute_business(business, now)?;
        Ok(ReportReceipt {
            report: stored,
            scam_score: update.business.scam_score,
            report_count: update.business.report_count,
        })
    }

    /// Rebuild one business's score from its full report history.
    pub fn recompute(
        &self,
        business_id: &BusinessId,
        now: DateTime<Utc>,
    ) -> Result<ScoreUpdate, ScamWatchError> {
        let business = self
            .businesses
            .fetch(business_id)?
            .ok_or(StoreError::NotFound)?;
        self.recompute_business(business, now)
    }

    fn recompute_business(
        &self,
        mut business: Business,
        now: DateTime<Utc>,
    ) -> Result<ScoreUpdate, ScamWatchError> {
        let reports = self.reports.list_by_business(&business.id)?;
        let breakdown = self.calculator.score(&reports, now);
        let previous_score = business.scam_score;

        business.scam_score = breakdown.score;
        business.report_count = breakdown.report_count;
        business.score_updated_at = Some(now);
        self.businesses.update(business.clone())?;

        debug!(business_id = %business.id, ?breakdown, "score breakdown");
        info!(
            business_id = %business.id,
            previous_score,
            scam_score = business.scam_score,
            report_count = business.report_count,
            "scam score recomputed"
        );

        Ok(ScoreUpdate {
            business,
            previous_score,
            breakdown,
        })
    }

    /// Recompute every business on scoped worker threads. Individual failures are
    /// collected in the summary rather than aborting the batch.
    pub fn recompute_all(
        &self,
        now: DateTime<Utc>,
    ) -> Result<BatchRecomputeSummary, ScamWatchError> {
        let businesses = self.businesses.list()?;
        if businesses.is_empty() {
            return Ok(BatchRecomputeSummary::default());
        }

        let workers = self.settings.recompute_workers.clamp(1, businesses.len());
        let chunk_size = businesses.len().div_ceil(workers);

        let outcomes: Vec<(BusinessId, Result<ScoreUpdate, String>)> = thread::scope(|scope| {
            let handles: Vec<_> = businesses
                .chunks(chunk_size)
                .map(|chunk| {
                    let ids: Vec<BusinessId> =
                        chunk.iter().map(|business| business.id.clone()).collect();
                    let handle = scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|business| {
                                let outcome = self
                                    .recompute_business(business.clone(), now)
                                    .map_err(|err| err.to_string());
                                (business.id.clone(), outcome)
                            })
                            .collect::<Vec<_>>()
                    });
                    (ids, handle)
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|(ids, handle)| match handle.join() {
                    Ok(results) => results,
                    Err(_) => ids
                        .into_iter()
                        .map(|id| (id, Err("recompute worker panicked".to_string())))
                        .collect(),
                })
                .collect()
        });

        let mut summary = BatchRecomputeSummary::default();
        for (business_id, outcome) in outcomes {
            summary.processed += 1;
            match outcome {
                Ok(update) => summary.updated.push(ScoreSummary::from(&update.business)),
                Err(error) => {
                    warn!(%business_id, %error, "scam score recompute failed");
                    summary.failures.push(RecomputeFailure { business_id, error });
                }
            }
        }

        info!(
            processed = summary.processed,
            failed = summary.failures.len(),
            workers,
            "batch recompute finished"
        );
        Ok(summary)
    }

    pub fn business(&self, business_id: &BusinessId) -> Result<Business, ScamWatchError> {
        let business = self
            .businesses
            .fetch(business_id)?
            .ok_or(StoreError::NotFound)?;
        Ok(business)
    }

    /// Reports for one business, newest first; undated reports sort last.
    pub fn reports_for_business(
        &self,
        business_id: &BusinessId,
    ) -> Result<Vec<Report>, ScamWatchError> {
        self.business(business_id)?;
        let mut reports = self.reports.list_by_business(business_id)?;
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    pub fn reports_by_type(&self, report_type: &ReportType) -> Result<Vec<Report>, ScamWatchError> {
        let mut reports = self.reports.list_by_type(report_type)?;
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    pub fn directory(&self, query: &DirectoryQuery) -> Result<Vec<Business>, ScamWatchError> {
        let mut businesses: Vec<Business> = self
            .businesses
            .list()?
            .into_iter()
            .filter(|business| query.matches(business))
            .collect();

        query.sort.apply(&mut businesses);
        if let Some(limit) = query.limit {
            businesses.truncate(limit);
        }
        Ok(businesses)
    }

    /// Businesses at or above the configured threshold, riskiest first.
    pub fn watchlist(&self) -> Result<Vec<Business>, ScamWatchError> {
        self.directory(&DirectoryQuery {
            min_score: Some(self.settings.watchlist_threshold),
            ..DirectoryQuery::default()
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn validate_description(description: Option<String>) -> Result<Option<String>, SubmissionError> {
    let description = non_blank(description);
    if let Some(text) = &description {
        let length = text.chars().count();
        if length > MAX_DESCRIPTION_CHARS {
            return Err(SubmissionError::DescriptionTooLong { length });
        }
    }
    Ok(description)
}

fn validate_amount(amount: Option<f64>) -> Result<Option<f64>, SubmissionError> {
    match amount {
        Some(value) if !value.is_finite() || value < 0.0 => {
            Err(SubmissionError::InvalidAmount(value))
        }
        other => Ok(other),
    }
}

/// Filter and ordering for the business directory.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DirectoryQuery {
    #[serde(default)]
    pub min_score: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sort: DirectorySort,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl DirectoryQuery {
    fn matches(&self, business: &Business) -> bool {
        let score_ok = self
            .min_score
            .map_or(true, |min| business.scam_score >= min);
        let category_ok = match (&self.category, &business.category) {
            (None, _) => true,
            (Some(wanted), Some(actual)) => wanted.eq_ignore_ascii_case(actual),
            (Some(_), None) => false,
        };
        score_ok && category_ok
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectorySort {
    #[default]
    Score,
    Reports,
    Name,
}

impl DirectorySort {
    fn apply(self, businesses: &mut [Business]) {
        match self {
            DirectorySort::Score => businesses.sort_by(|a, b| {
                b.scam_score
                    .total_cmp(&a.scam_score)
                    .then_with(|| b.report_count.cmp(&a.report_count))
                    .then_with(|| a.name.cmp(&b.name))
            }),
            DirectorySort::Reports => businesses.sort_by(|a, b| {
                b.report_count
                    .cmp(&a.report_count)
                    .then_with(|| b.scam_score.total_cmp(&a.scam_score))
                    .then_with(|| a.name.cmp(&b.name))
            }),
            DirectorySort::Name => businesses.sort_by(|a, b| {
                a.name
                    .to_lowercase()
                    .cmp(&b.name.to_lowercase())
                    .then_with(|| a.id.cmp(&b.id))
            }),
        }
    }
}

/// Stored report plus the business projection it refreshed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportReceipt {
    pub report: Report,
    pub scam_score: f64,
    pub report_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreUpdate {
    pub business: Business,
    pub previous_score: f64,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub business_id: BusinessId,
    pub scam_score: f64,
    pub report_count: usize,
}

impl From<&Business> for ScoreSummary {
    fn from(business: &Business) -> Self {
        Self {
            business_id: business.id.clone(),
            scam_score: business.scam_score,
            report_count: business.report_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecomputeFailure {
    pub business_id: BusinessId,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchRecomputeSummary {
    pub processed: usize,
    pub updated: Vec<ScoreSummary>,
    pub failures: Vec<RecomputeFailure>,
}

/// Input rejected before touching the stores.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("business name must not be blank")]
    BlankBusinessName,
    #[error("business {0} is not in the directory")]
    UnknownBusiness(BusinessId),
    #[error("description is {length} characters; the limit is {MAX_DESCRIPTION_CHARS}")]
    DescriptionTooLong { length: usize },
    #[error("amount charged must be a non-negative number (got {0})")]
    InvalidAmount(f64),
}

/// Error raised by the scam watch service.
#[derive(Debug, thiserror::Error)]
pub enum ScamWatchError {
    #[error(transparent)]
    Validation(#[from] SubmissionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
