use serde::{Deserialize, Serialize};

use crate::sim::WindowResult;

///Interpolated percentile of `values`, `p` is clamped into `[0, 100]`. Returns `NaN` for an
///empty sample.
///
///The rank is `(n - 1) * p / 100`. An integral rank returns that element of the sorted sample,
///otherwise the result is interpolated linearly between the elements either side of the rank.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let clamped = p.clamp(0.0, 100.0);
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    if sorted.len() == 1 {
        return sorted[0];
    }

    let rank = (sorted.len() - 1) as f64 * clamped / 100.0;
    let lower_index = rank.floor() as usize;
    let upper_index = rank.ceil() as usize;
    if lower_index == upper_index {
        return sorted[lower_index];
    }
    let lower = sorted[lower_index];
    let upper = sorted[upper_index];
    lower + (upper - lower) * (rank - lower_index as f64)
}

///Percentage PnL statistics over the windows of one simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub windows: usize,
    pub mean_pct: f64,
    pub min_pct: f64,
    pub fifth_pct: f64,
}

impl PerformanceSummary {
    ///Windows with a non-finite PnL are ignored. Returns `None` if nothing is left.
    pub fn from_windows(windows: &[WindowResult], start_capital: f64) -> Option<Self> {
        //Guards against dividing by a nonsense capital, results are still reported
        let denominator = if start_capital > 0.0 {
            start_capital
        } else {
            1.0
        };
        let pnl_pct: Vec<f64> = windows
            .iter()
            .map(|window| window.pnl / denominator * 100.0)
            .filter(|value| value.is_finite())
            .collect();
        if pnl_pct.is_empty() {
            return None;
        }

        let mean_pct = pnl_pct.iter().sum::<f64>() / pnl_pct.len() as f64;
        let min_pct = pnl_pct.iter().copied().fold(f64::INFINITY, f64::min);
        Some(Self {
            windows: windows.len(),
            mean_pct,
            min_pct,
            fifth_pct: percentile(&pnl_pct, 5.0),
        })
    }
}
