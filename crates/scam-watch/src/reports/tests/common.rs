use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::ScoreMaintenanceConfig;
use crate::reports::domain::{
    Business, BusinessId, BusinessRegistration, Report, ReportSubmission, ReportType,
};
use crate::reports::repository::{BusinessStore, ReportStore, StoreError};
use crate::reports::service::ScamWatchService;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 15, 12, 0, 0).unwrap()
}

pub(super) fn settings() -> ScoreMaintenanceConfig {
    ScoreMaintenanceConfig {
        recompute_workers: 3,
        watchlist_threshold: 4.5,
    }
}

pub(super) fn registration(name: &str) -> BusinessRegistration {
    BusinessRegistration {
        name: name.to_string(),
        category: Some("Grocery".to_string()),
        address: Some("12 Market St".to_string()),
    }
}

pub(super) fn submission(business_id: &BusinessId, report_type: ReportType) -> ReportSubmission {
    ReportSubmission {
        business_id: business_id.clone(),
        report_type,
        description: Some("Charged double the shelf price for water".to_string()),
        amount_charged: Some(12.5),
    }
}

pub(super) type MemoryService = ScamWatchService<MemoryReports, MemoryBusinesses>;

pub(super) fn build_service() -> (MemoryService, Arc<MemoryReports>, Arc<MemoryBusinesses>) {
    let reports = Arc::new(MemoryReports::default());
    let businesses = Arc::new(MemoryBusinesses::default());
    let service = ScamWatchService::new(reports.clone(), businesses.clone(), settings());
    (service, reports, businesses)
}

#[derive(Default)]
pub(super) struct MemoryReports {
    records: Mutex<Vec<Report>>,
}

impl MemoryReports {
    /// Seeds a report directly, bypassing submission so tests control the timestamp.
    pub(super) fn seed(&self, report: Report) {
        self.records.lock().expect("report mutex poisoned").push(report);
    }
}

impl ReportStore for MemoryReports {
    fn insert(&self, report: Report) -> Result<Report, StoreError> {
        let mut guard = self.records.lock().expect("report mutex poisoned");
        if guard.iter().any(|existing| existing.id == report.id) {
            return Err(StoreError::Conflict);
        }
        guard.push(report.clone());
        Ok(report)
    }

    fn list_by_business(&self, business_id: &BusinessId) -> Result<Vec<Report>, StoreError> {
        let guard = self.records.lock().expect("report mutex poisoned");
        Ok(guard
            .iter()
            .filter(|report| &report.business_id == business_id)
            .cloned()
            .collect())
    }

    fn list_by_type(&self, report_type: &ReportType) -> Result<Vec<Report>, StoreError> {
        let guard = self.records.lock().expect("report mutex poisoned");
        Ok(guard
            .iter()
            .filter(|report| &report.report_type == report_type)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryBusinesses {
    records: Mutex<HashMap<BusinessId, Business>>,
}

impl BusinessStore for MemoryBusinesses {
    fn insert(&self, business: Business) -> Result<Business, StoreError> {
        let mut guard = self.records.lock().expect("business mutex poisoned");
        if guard.contains_key(&business.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(business.id.clone(), business.clone());
        Ok(business)
    }

    fn fetch(&self, id: &BusinessId) -> Result<Option<Business>, StoreError> {
        let guard = self.records.lock().expect("business mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, business: Business) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("business mutex poisoned");
        match guard.get_mut(&business.id) {
            Some(existing) => {
                *existing = business;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn list(&self) -> Result<Vec<Business>, StoreError> {
        let guard = self.records.lock().expect("business mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

/// Report store that refuses reads for one business, for batch failure paths.
pub(super) struct FlakyReports {
    pub(super) inner: MemoryReports,
    pub(super) broken: BusinessId,
}

impl ReportStore for FlakyReports {
    fn insert(&self, report: Report) -> Result<Report, StoreError> {
        self.inner.insert(report)
    }

    fn list_by_business(&self, business_id: &BusinessId) -> Result<Vec<Report>, StoreError> {
        if business_id == &self.broken {
            return Err(StoreError::Unavailable("replica lagging".to_string()));
        }
        self.inner.list_by_business(business_id)
    }

    fn list_by_type(&self, report_type: &ReportType) -> Result<Vec<Report>, StoreError> {
        self.inner.list_by_type(report_type)
    }
}

pub(super) struct UnavailableReports;

impl ReportStore for UnavailableReports {
    fn insert(&self, _report: Report) -> Result<Report, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn list_by_business(&self, _business_id: &BusinessId) -> Result<Vec<Report>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn list_by_type(&self, _report_type: &ReportType) -> Result<Vec<Report>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn aged_report(
    id: &str,
    business_id: &BusinessId,
    report_type: ReportType,
    days_old: i64,
) -> Report {
    Report {
        id: crate::reports::domain::ReportId(id.to_string()),
        business_id: business_id.clone(),
        report_type,
        description: None,
        amount_charged: None,
        created_at: Some(now() - chrono::Duration::days(days_old)),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
