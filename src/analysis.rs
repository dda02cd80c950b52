use serde::Serialize;

use crate::pricing::UnitResult;

/// Headline statistics over one pricing run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub units: usize,
    pub zero_premium: usize,
    pub nonzero_premium: usize,
    /// Share of units with zero premium, in percent. Zero when there are no units.
    pub pct_zero: f64,
    /// Min/median/max premium over units with a non-zero premium; `None` if there are none.
    pub min: Option<f64>,
    pub median: Option<f64>,
    pub max: Option<f64>,
}

pub fn summarise(results: &[UnitResult]) -> Summary {
    let mut premiums: Vec<f64> =
        results.iter().map(|r| r.premium).filter(|p| *p > 0.0).collect();
    premiums.sort_by(f64::total_cmp);

    let units = results.len();
    let nonzero_premium = premiums.len();
    let zero_premium = units - nonzero_premium;
    let pct_zero = if units == 0 { 0.0 } else { zero_premium as f64 / units as f64 * 100.0 };

    Summary {
        units,
        zero_premium,
        nonzero_premium,
        pct_zero,
        min: premiums.first().copied(),
        median: percentile(&premiums, 0.5),
        max: premiums.last().copied(),
    }
}

/// Linearly interpolated percentile of an already sorted slice.
fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let h = p * (n - 1) as f64;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = h - lo as f64;
    Some(sorted[lo] * (1.0 - frac) + sorted[hi] * frac)
}
