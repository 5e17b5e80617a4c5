//! Report intake, business directory, and score maintenance.

pub mod domain;
pub mod extract;
pub mod import;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    parse_timestamp, Business, BusinessId, BusinessRegistration, Report, ReportId,
    ReportSubmission, ReportType,
};
pub use import::{
    group_by_business, parse_reports, parse_reports_from_path, ImportedReport, ReportImportError,
};
pub use repository::{BusinessStore, ReportStore, StoreError};
pub use router::scam_watch_router;
pub use service::{
    BatchRecomputeSummary, DirectoryQuery, DirectorySort, RecomputeFailure, ReportReceipt,
    ScamWatchError, ScamWatchService, ScoreSummary, ScoreUpdate, SubmissionError,
};
