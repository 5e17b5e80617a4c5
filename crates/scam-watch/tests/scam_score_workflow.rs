//! End-to-end checks through the public API: raw store records in, cached scores out.

mod common {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use scam_watch::config::ScoreMaintenanceConfig;
    use scam_watch::reports::{
        Business, BusinessId, BusinessStore, Report, ReportStore, ReportType, ScamWatchService,
        StoreError,
    };

    #[derive(Default)]
    pub struct Reports(Mutex<Vec<Report>>);

    impl ReportStore for Reports {
        fn insert(&self, report: Report) -> Result<Report, StoreError> {
            self.0.lock().unwrap().push(report.clone());
            Ok(report)
        }

        fn list_by_business(&self, business_id: &BusinessId) -> Result<Vec<Report>, StoreError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .iter()
                .filter(|report| &report.business_id == business_id)
                .cloned()
                .collect())
        }

        fn list_by_type(&self, report_type: &ReportType) -> Result<Vec<Report>, StoreError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .iter()
                .filter(|report| &report.report_type == report_type)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    pub struct Businesses(Mutex<BTreeMap<BusinessId, Business>>);

    impl BusinessStore for Businesses {
        fn insert(&self, business: Business) -> Result<Business, StoreError> {
            self.0
                .lock()
                .unwrap()
                .insert(business.id.clone(), business.clone());
            Ok(business)
        }

        fn fetch(&self, id: &BusinessId) -> Result<Option<Business>, StoreError> {
            Ok(self.0.lock().unwrap().get(id).cloned())
        }

        fn update(&self, business: Business) -> Result<(), StoreError> {
            let mut guard = self.0.lock().unwrap();
            if !guard.contains_key(&business.id) {
                return Err(StoreError::NotFound);
            }
            guard.insert(business.id.clone(), business);
            Ok(())
        }

        fn list(&self) -> Result<Vec<Business>, StoreError> {
            Ok(self.0.lock().unwrap().values().cloned().collect())
        }
    }

    pub fn service() -> (ScamWatchService<Reports, Businesses>, Arc<Reports>) {
        let reports = Arc::new(Reports::default());
        let service = ScamWatchService::new(
            reports.clone(),
            Arc::new(Businesses::default()),
            ScoreMaintenanceConfig::default(),
        );
        (service, reports)
    }
}

use chrono::{DateTime, TimeZone, Utc};
use scam_watch::reports::{BusinessRegistration, Report, ReportStore};
use scam_watch::scoring::{calculate_scam_score, ScamScoreCalculator, ScoreFactor};
use serde_json::json;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 1, 18, 0, 0).unwrap()
}

fn store_records(rows: serde_json::Value) -> Vec<Report> {
    serde_json::from_value(rows).expect("store rows deserialize")
}

#[test]
fn scores_raw_store_rows_with_iso_timestamps() {
    let reports = store_records(json!([
        { "id": "1", "business_id": "b", "report_type": "price_gouging",
          "created_at": "2025-11-01T09:15:00Z" },
        { "id": "2", "business_id": "b", "report_type": "no_receipt",
          "created_at": "2025-09-01T09:15:00Z" }
    ]));

    assert_eq!(calculate_scam_score(&reports, now()), 3.2);
}

#[test]
fn malformed_timestamp_only_drops_out_of_recency() {
    let reports = store_records(json!([
        { "id": "1", "business_id": "b", "report_type": "suspicious_activity",
          "created_at": "2025-11-01T17:00:00+00:00" },
        { "id": "2", "business_id": "b", "report_type": "suspicious_activity",
          "created_at": "not-a-timestamp" }
    ]));

    let breakdown = ScamScoreCalculator::default().score(&reports, now());
    assert_eq!(breakdown.report_count, 2);
    assert_eq!(breakdown.dated_reports, 1);
    assert_eq!(
        breakdown
            .component(ScoreFactor::Recency)
            .map(|component| component.value),
        Some(10.0)
    );
    // 1.0 * 0.5 + 10 * 0.3 + 8 * 0.2
    assert_eq!(breakdown.score, 5.1);
}

#[test]
fn submissions_keep_cached_score_in_step_with_history() {
    let (service, reports) = common::service();
    let business = service
        .register_business(BusinessRegistration {
            name: "Harbor Souvenirs".to_string(),
            category: Some("Retail".to_string()),
            address: None,
        })
        .expect("registers");

    let mut last = 0.0;
    for _ in 0..25 {
        let receipt = service
            .submit_report_at(
                scam_watch::reports::ReportSubmission {
                    business_id: business.id.clone(),
                    report_type: "unauthorized_charges".to_string().into(),
                    description: None,
                    amount_charged: None,
                },
                now(),
            )
            .expect("report accepted");
        assert!(receipt.scam_score >= last);
        last = receipt.scam_score;
    }
    assert_eq!(last, 9.8);

    let history = reports.list_by_business(&business.id).expect("history");
    let recomputed = service.recompute(&business.id, now()).expect("recompute");
    assert_eq!(
        recomputed.business.scam_score,
        calculate_scam_score(&history, now())
    );
    assert_eq!(recomputed.previous_score, recomputed.business.scam_score);
}
