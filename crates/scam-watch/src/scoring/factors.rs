use chrono::{DateTime, Utc};

use super::{ScoringConfig, ScoringSignal};

const MAX_POINTS: u128 = 10;

/// Non-negative fraction kept in lowest terms so factor values combine without float drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ratio {
    num: u128,
    den: u128,
}

impl Ratio {
    pub(crate) const ZERO: Ratio = Ratio { num: 0, den: 1 };

    pub(crate) fn new(num: u128, den: u128) -> Self {
        if den == 0 {
            return Self::ZERO;
        }
        let divisor = gcd(num, den);
        Self {
            num: num / divisor,
            den: den / divisor,
        }
    }

    pub(crate) fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    pub(crate) fn checked_scale(self, factor: u128) -> Option<Self> {
        Some(Self::new(self.num.checked_mul(factor)?, self.den))
    }

    pub(crate) fn checked_div(self, divisor: u128) -> Option<Self> {
        Some(Self::new(self.num, self.den.checked_mul(divisor)?))
    }

    pub(crate) fn checked_add(self, other: Self) -> Option<Self> {
        let lhs = self.num.checked_mul(other.den)?;
        let rhs = other.num.checked_mul(self.den)?;
        Some(Self::new(lhs.checked_add(rhs)?, self.den.checked_mul(other.den)?))
    }

    /// Nearest integer, ties rounding up.
    pub(crate) fn round_half_up(self) -> Option<u128> {
        let doubled = self.num.checked_mul(2)?.checked_add(self.den)?;
        Some(doubled / self.den.checked_mul(2)?)
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}

pub(crate) fn report_count_factor(count: usize, config: &ScoringConfig) -> Ratio {
    let saturation = u128::from(config.saturation_report_count);
    let counted = (count as u128).min(saturation);
    Ratio::new(counted * MAX_POINTS, saturation)
}

/// Whole days elapsed, floored. Timestamps ahead of `now` count as zero days.
pub(crate) fn days_since(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(created_at).num_days().max(0)
}

/// Remaining recency points for one report, scaled by the window length.
fn recency_points(days: i64, config: &ScoringConfig) -> u128 {
    let window = u128::from(config.recency_window_days);
    let elapsed = u128::try_from(days).unwrap_or(0).min(window);
    (window - elapsed) * MAX_POINTS
}

pub(crate) fn report_recency(days: i64, config: &ScoringConfig) -> Ratio {
    Ratio::new(
        recency_points(days, config),
        u128::from(config.recency_window_days),
    )
}

/// Mean recency over reports that carry a timestamp, plus how many did.
pub(crate) fn recency_factor<S: ScoringSignal>(
    reports: &[S],
    now: DateTime<Utc>,
    config: &ScoringConfig,
) -> (Ratio, usize) {
    let (points, dated) = reports
        .iter()
        .filter_map(|report| report.created_at())
        .fold((0u128, 0usize), |(points, dated), created_at| {
            let report_points = recency_points(days_since(created_at, now), config);
            (points.saturating_add(report_points), dated + 1)
        });

    let window = u128::from(config.recency_window_days);
    (Ratio::new(points, window.saturating_mul(dated as u128)), dated)
}

pub(crate) fn severity_factor<S: ScoringSignal>(reports: &[S]) -> Ratio {
    let points: u128 = reports
        .iter()
        .map(|report| u128::from(report.report_type().severity_points()))
        .sum();
    Ratio::new(points, reports.len() as u128)
}
