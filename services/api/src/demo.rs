use crate::infra::{parse_instant, InMemoryBusinessStore, InMemoryReportStore};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use scam_watch::config::ScoreMaintenanceConfig;
use scam_watch::error::AppError;
use scam_watch::reports::{
    group_by_business, parse_reports_from_path, Business, BusinessRegistration, DirectoryQuery,
    ReportSubmission, ReportType, ScamWatchService,
};
use scam_watch::scoring::{ScamScoreCalculator, ScoreBreakdown};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreReportArgs {
    /// CSV export with business_id, report_type and created_at columns
    #[arg(long)]
    pub(crate) reports_csv: PathBuf,
    /// Reference time for recency (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_instant)]
    pub(crate) now: Option<DateTime<Utc>>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reference time for the seeded reports (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_instant)]
    pub(crate) now: Option<DateTime<Utc>>,
}

pub(crate) fn run_score_report(args: ScoreReportArgs) -> Result<(), AppError> {
    let ScoreReportArgs { reports_csv, now } = args;
    let now = now.unwrap_or_else(Utc::now);

    let imported = parse_reports_from_path(&reports_csv)?;
    let total = imported.len();
    let grouped = group_by_business(imported);
    let calculator = ScamScoreCalculator::default();

    println!(
        "Scored {} report(s) across {} business(es) from {} (as of {})",
        total,
        grouped.len(),
        reports_csv.display(),
        now.format("%Y-%m-%d %H:%M UTC")
    );

    for (business_id, signals) in &grouped {
        let breakdown = calculator.score(signals, now);
        println!("\n{business_id}");
        render_breakdown(&breakdown);
    }

    Ok(())
}

fn render_breakdown(breakdown: &ScoreBreakdown) {
    println!(
        "  scam score {:.1} ({} report(s), {} dated)",
        breakdown.score, breakdown.report_count, breakdown.dated_reports
    );
    for component in &breakdown.components {
        println!(
            "    - {:?}: {:.2} x {:.1} = {:.2} ({})",
            component.factor,
            component.value,
            component.weight,
            component.contribution,
            component.notes
        );
    }
}

struct SeedReport {
    report_type: ReportType,
    days_old: i64,
    amount_charged: Option<f64>,
}

fn seed(report_type: ReportType, days_old: i64, amount_charged: Option<f64>) -> SeedReport {
    SeedReport {
        report_type,
        days_old,
        amount_charged,
    }
}

fn demo_directory() -> Vec<(BusinessRegistration, Vec<SeedReport>)> {
    let registration = |name: &str, category: &str| BusinessRegistration {
        name: name.to_string(),
        category: Some(category.to_string()),
        address: None,
    };

    vec![
        (
            registration("Harborview Fuel", "Fuel"),
            (0..22)
                .map(|day| seed(ReportType::PriceGouging, day % 5, Some(8.99)))
                .collect(),
        ),
        (
            registration("Quickfix Phone Repair", "Electronics"),
            vec![
                seed(ReportType::UnauthorizedCharges, 1, Some(149.0)),
                seed(ReportType::UnauthorizedCharges, 3, Some(89.0)),
                seed(ReportType::SuspiciousActivity, 6, None),
                seed(ReportType::HiddenFees, 12, Some(25.0)),
            ],
        ),
        (
            registration("Main Street Grocer", "Grocery"),
            vec![
                seed(ReportType::NoReceipt, 45, None),
                seed(ReportType::FalseAdvertising, 80, None),
            ],
        ),
        (registration("Lakeside Bakery", "Food"), Vec::new()),
    ]
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let now = args.now.unwrap_or_else(Utc::now);
    let settings = ScoreMaintenanceConfig::default();
    let service = ScamWatchService::new(
        Arc::new(InMemoryReportStore::default()),
        Arc::new(InMemoryBusinessStore::default()),
        settings,
    );

    println!("Scam Watch demo (as of {})", now.format("%Y-%m-%d"));

    for (registration, reports) in demo_directory() {
        let business = service.register_business(registration)?;
        for report in reports {
            service.submit_report_at(
                ReportSubmission {
                    business_id: business.id.clone(),
                    report_type: report.report_type,
                    description: None,
                    amount_charged: report.amount_charged,
                },
                now - Duration::days(report.days_old),
            )?;
        }
    }

    let summary = service.recompute_all(now)?;
    println!(
        "Recomputed {} business(es), {} failure(s)",
        summary.processed,
        summary.failures.len()
    );

    println!("\nDirectory (highest risk first)");
    for business in service.directory(&DirectoryQuery::default())? {
        render_business(&business);
    }

    let threshold = service.settings().watchlist_threshold;
    let watchlist = service.watchlist()?;
    println!("\nWatchlist (score >= {threshold:.1})");
    if watchlist.is_empty() {
        println!("  nothing above threshold");
    }
    for business in &watchlist {
        render_business(business);
        let update = service.recompute(&business.id, now)?;
        render_breakdown(&update.breakdown);
    }

    Ok(())
}

fn render_business(business: &Business) {
    println!(
        "- {} [{}] score {:.1} from {} report(s){}",
        business.name,
        business.id,
        business.scam_score,
        business.report_count,
        business
            .category
            .as_deref()
            .map(|category| format!(" | {category}"))
            .unwrap_or_default()
    );
}
