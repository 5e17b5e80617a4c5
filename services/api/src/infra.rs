use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use scam_watch::reports::{
    parse_timestamp, Business, BusinessId, BusinessStore, Report, ReportStore, ReportType,
    StoreError,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryReportStore {
    records: Arc<Mutex<Vec<Report>>>,
}

impl ReportStore for InMemoryReportStore {
    fn insert(&self, report: Report) -> Result<Report, StoreError> {
        let mut guard = lock(&self.records)?;
        if guard.iter().any(|existing| existing.id == report.id) {
            return Err(StoreError::Conflict);
        }
        guard.push(report.clone());
        Ok(report)
    }

    fn list_by_business(&self, business_id: &BusinessId) -> Result<Vec<Report>, StoreError> {
        let guard = lock(&self.records)?;
        Ok(guard
            .iter()
            .filter(|report| &report.business_id == business_id)
            .cloned()
            .collect())
    }

    fn list_by_type(&self, report_type: &ReportType) -> Result<Vec<Report>, StoreError> {
        let guard = lock(&self.records)?;
        Ok(guard
            .iter()
            .filter(|report| &report.report_type == report_type)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryBusinessStore {
    records: Arc<Mutex<HashMap<BusinessId, Business>>>,
}

impl BusinessStore for InMemoryBusinessStore {
    fn insert(&self, business: Business) -> Result<Business, StoreError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&business.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(business.id.clone(), business.clone());
        Ok(business)
    }

    fn fetch(&self, id: &BusinessId) -> Result<Option<Business>, StoreError> {
        let guard = lock(&self.records)?;
        Ok(guard.get(id).cloned())
    }

    fn update(&self, business: Business) -> Result<(), StoreError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&business.id) {
            guard.insert(business.id.clone(), business);
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn list(&self) -> Result<Vec<Business>, StoreError> {
        let guard = lock(&self.records)?;
        Ok(guard.values().cloned().collect())
    }
}

/// Accepts RFC 3339 timestamps or `YYYY-MM-DD` (midnight UTC).
pub(crate) fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(raw)
        .ok_or_else(|| format!("failed to parse '{raw}' as an RFC 3339 timestamp or YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use scam_watch::reports::ReportId;

    fn report(id: &str, business: &str, report_type: ReportType) -> Report {
        Report {
            id: ReportId(id.to_string()),
            business_id: BusinessId(business.to_string()),
            report_type,
            description: None,
            amount_charged: None,
            created_at: None,
        }
    }

    #[test]
    fn report_store_rejects_duplicate_ids() {
        let store = InMemoryReportStore::default();
        store
            .insert(report("r1", "b1", ReportType::NoReceipt))
            .expect("first insert");
        assert!(matches!(
            store.insert(report("r1", "b2", ReportType::HiddenFees)),
            Err(StoreError::Conflict)
        ));
        assert_eq!(
            store
                .list_by_business(&BusinessId("b1".to_string()))
                .expect("lists")
                .len(),
            1
        );
    }

    #[test]
    fn unknown_types_match_regardless_of_case() {
        let store = InMemoryReportStore::default();
        store
            .insert(report("r1", "b1", ReportType::parse("Bait_And_Switch")))
            .expect("insert");
        store
            .insert(report("r2", "b1", ReportType::parse("bait_and_switch")))
            .expect("insert");

        let matched = store
            .list_by_type(&ReportType::parse("BAIT_AND_SWITCH"))
            .expect("lists");
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn business_store_update_requires_existing_record() {
        let store = InMemoryBusinessStore::default();
        let business = Business {
            id: BusinessId("b1".to_string()),
            name: "Corner Mart".to_string(),
            category: None,
            address: None,
            scam_score: 0.0,
            report_count: 0,
            score_updated_at: None,
        };
        assert!(matches!(
            store.update(business.clone()),
            Err(StoreError::NotFound)
        ));
        store.insert(business.clone()).expect("inserts");
        store
            .update(Business {
                scam_score: 4.2,
                ..business
            })
            .expect("updates");
        let stored = store
            .fetch(&BusinessId("b1".to_string()))
            .expect("fetches")
            .expect("present");
        assert_eq!(stored.scam_score, 4.2);
    }

    #[test]
    fn parse_instant_accepts_dates() {
        assert_eq!(
            parse_instant("2025-10-15"),
            Ok(Utc.with_ymd_and_hms(2025, 10, 15, 0, 0, 0).unwrap())
        );
        assert!(parse_instant("15/10/2025").is_err());
    }
}
