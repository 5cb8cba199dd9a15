//! Financial derivation helpers: EMI, compound growth, credit utilization.
//!
//! All functions are pure and total: degenerate inputs produce a zero or
//! "no card" result instead of an error, NaN or infinity.

use crate::config::UtilizationBands;
use serde::{Deserialize, Serialize};
use std::fmt;

// ── EMI ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EmiBreakdown {
    pub emi: f64,
    pub total_interest: f64,
    pub total_payable: f64,
}

/// Equated monthly instalment for an amortized loan.
///
/// `emi = P * r * (1+r)^n / ((1+r)^n - 1)` with `r = annual_rate_percent / 12 / 100`.
/// A zero rate amortizes linearly (`P / n`).
pub fn compute_emi(principal: f64, annual_rate_percent: f64, term_months: u32) -> EmiBreakdown {
    if !principal.is_finite() || principal <= 0.0 || term_months == 0 {
        return EmiBreakdown::default();
    }
    if !annual_rate_percent.is_finite() || annual_rate_percent < 0.0 {
        return EmiBreakdown::default();
    }

    let n = term_months as f64;
    let r = annual_rate_percent / 12.0 / 100.0;

    let emi = if r == 0.0 {
        principal / n
    } else {
        let growth = (1.0 + r).powf(n);
        if growth.is_finite() {
            principal * r * growth / (growth - 1.0)
        } else {
            // Very long terms converge to paying interest only.
            principal * r
        }
    };

    let total_payable = emi * n;
    EmiBreakdown {
        emi,
        total_interest: total_payable - principal,
        total_payable,
    }
}

// ── Compound growth ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthPoint {
    pub period: u32,
    pub investment: f64,
    pub growth: f64,
    pub total: f64,
}

/// Year-by-year growth points. Cheap to copy; every call to `iter()`
/// starts again from period 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthSeries {
    principal: f64,
    rate: f64,
    years: u32,
    frequency: u32,
}

impl GrowthSeries {
    pub fn iter(&self) -> GrowthIter {
        GrowthIter {
            series: *self,
            next_period: Some(0),
        }
    }

    pub fn len(&self) -> usize {
        (self.years as usize).saturating_add(1)
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Point for a single period, or `None` past the horizon.
    pub fn point(&self, period: u32) -> Option<GrowthPoint> {
        if period > self.years {
            return None;
        }
        let compounded = (1.0 + self.rate / self.frequency as f64)
            .powf(period as f64 * self.frequency as f64);
        let total = self.principal * compounded;
        Some(GrowthPoint {
            period,
            investment: self.principal,
            growth: total - self.principal,
            total,
        })
    }
}

impl IntoIterator for GrowthSeries {
    type Item = GrowthPoint;
    type IntoIter = GrowthIter;

    fn into_iter(self) -> GrowthIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &'a GrowthSeries {
    type Item = GrowthPoint;
    type IntoIter = GrowthIter;

    fn into_iter(self) -> GrowthIter {
        self.iter()
    }
}

pub struct GrowthIter {
    series: GrowthSeries,
    /// `None` once the final period has been yielded.
    next_period: Option<u32>,
}

impl Iterator for GrowthIter {
    type Item = GrowthPoint;

    fn next(&mut self) -> Option<GrowthPoint> {
        let period = self.next_period?;
        let point = self.series.point(period)?;
        self.next_period = period.checked_add(1);
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = match self.next_period {
            Some(p) if p <= self.series.years => ((self.series.years - p) as usize).saturating_add(1),
            _ => 0,
        };
        (left, Some(left))
    }
}

impl ExactSizeIterator for GrowthIter {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthProjection {
    pub maturity: f64,
    pub profit: f64,
    pub series: GrowthSeries,
}

/// Project `principal` compounded `frequency` times a year for `years` years.
/// A frequency of 0 compounds annually.
pub fn compute_growth(
    principal: f64,
    annual_rate_percent: f64,
    years: u32,
    frequency: u32,
) -> GrowthProjection {
    let principal = if principal.is_finite() { principal.max(0.0) } else { 0.0 };
    let rate = if annual_rate_percent.is_finite() {
        annual_rate_percent / 100.0
    } else {
        0.0
    };
    let series = GrowthSeries {
        principal,
        rate,
        years,
        frequency: frequency.max(1),
    };
    let maturity = series.point(years).map(|p| p.total).unwrap_or(principal);
    GrowthProjection {
        maturity,
        profit: maturity - principal,
        series,
    }
}

// ── Credit utilization ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UtilizationLabel {
    NoActiveCard,
    Excellent,
    Good,
    HighUsage,
    Critical,
}

impl UtilizationLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoActiveCard => "No Active Card",
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::HighUsage => "High Usage",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for UtilizationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtilizationReport {
    pub percentage: f64,
    pub label: UtilizationLabel,
}

impl UtilizationReport {
    pub fn has_active_card(&self) -> bool {
        self.label != UtilizationLabel::NoActiveCard
    }
}

pub fn classify_utilization(used: f64, limit: f64) -> UtilizationReport {
    classify_utilization_with(used, limit, &UtilizationBands::default())
}

pub fn classify_utilization_with(
    used: f64,
    limit: f64,
    bands: &UtilizationBands,
) -> UtilizationReport {
    if !limit.is_finite() || limit <= 0.0 {
        return UtilizationReport {
            percentage: 0.0,
            label: UtilizationLabel::NoActiveCard,
        };
    }
    let used = if used.is_finite() { used.max(0.0) } else { 0.0 };
    let percentage = used / limit * 100.0;
    let label = if percentage <= bands.excellent_max {
        UtilizationLabel::Excellent
    } else if percentage <= bands.good_max {
        UtilizationLabel::Good
    } else if percentage <= bands.high_usage_max {
        UtilizationLabel::HighUsage
    } else {
        UtilizationLabel::Critical
    };
    UtilizationReport { percentage, label }
}
