use super::domain::{Business, BusinessId, Report, ReportType};

/// Persistence for submitted reports. Reports are append-only.
pub trait ReportStore: Send + Sync {
    fn insert(&self, report: Report) -> Result<Report, StoreError>;
    fn list_by_business(&self, business_id: &BusinessId) -> Result<Vec<Report>, StoreError>;
    fn list_by_type(&self, report_type: &ReportType) -> Result<Vec<Report>, StoreError>;
}

/// Persistence for business metadata and the cached score projection.
pub trait BusinessStore: Send + Sync {
    fn insert(&self, business: Business) -> Result<Business, StoreError>;
    fn fetch(&self, id: &BusinessId) -> Result<Option<Business>, StoreError>;
    fn update(&self, business: Business) -> Result<(), StoreError>;
    fn list(&self) -> Result<Vec<Business>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
