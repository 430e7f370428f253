//! Window simulation and the rolling driver.
//!
//! [simulate_window] buys a portfolio on one day and marks it to market on every day up to, and
//! including, the end of the window. [rolling_simulate] slides a fixed-length window forward one
//! day at a time across a range of start days and summarises each window.
//!
//! The two functions fail differently. A window is strict: bad indices, bad capital, or a missing
//! price anywhere inside it is an error and no partial trajectory is returned. The rolling driver
//! is lenient about the range it is given: bounds that are out of range, or a zero holding period,
//! return no windows rather than an error. Errors from inside a window still propagate out of the
//! rolling driver. [BoundsPolicy::Strict] turns the bounds check into an error as well.
//!
//! The last start day is `upper - holding_days - 1`, so the last window ends on `upper - 1`. The
//! day passed as `upper` is never the end of a window.

mod builder;

pub use builder::{RollingSimulation, RollingSimulationBuilder};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::input::{PriceTable, Problem};
use crate::portfolio::Portfolio;
use crate::types::PortfolioAllocation;

///Value of a portfolio on every day of a window.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub day_indexes: Vec<usize>,
    pub days: Vec<String>,
    pub values: Vec<f64>,
}

impl Trajectory {
    pub fn end_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    pub fn min_value(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }
}

///Summary of one window, keyed by the index of its start day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowResult {
    pub day_index: usize,
    pub day: String,
    pub day_indexes: Vec<usize>,
    pub days: Vec<String>,
    pub values: Vec<f64>,
    pub min_value: f64,
    pub end_value: f64,
    pub pnl: f64,
}

impl WindowResult {
    //Trajectories always contain at least the start day.
    fn from_trajectory(day_index: usize, trajectory: Trajectory, start_capital: f64) -> Self {
        let end_value = trajectory.end_value().unwrap_or(f64::NAN);
        let min_value = trajectory.min_value().unwrap_or(f64::NAN);
        let day = trajectory.days.first().cloned().unwrap_or_default();
        Self {
            day_index,
            day,
            day_indexes: trajectory.day_indexes,
            days: trajectory.days,
            values: trajectory.values,
            min_value,
            end_value,
            pnl: end_value - start_capital,
        }
    }
}

///What the rolling driver does when it is given bounds it can't use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundsPolicy {
    ///Return no windows.
    #[default]
    Lenient,
    ///Return a [ValidationError].
    Strict,
}

pub fn simulate_window(
    problem: &Problem,
    start_index: usize,
    end_index: usize,
    start_capital: f64,
    weights: &PortfolioAllocation,
    prices: &PriceTable,
) -> Result<Trajectory> {
    let length = problem.len();
    if end_index >= length {
        return Err(ValidationError::IndexOutOfBounds {
            index: end_index,
            length,
        }
        .into());
    }
    if end_index < start_index {
        return Err(ValidationError::InvertedRange {
            start: start_index,
            end: end_index,
        }
        .into());
    }

    let portfolio = Portfolio::purchase(start_capital, weights, prices, start_index)?;

    let mut trajectory = Trajectory::default();
    for (index, day) in problem
        .days()
        .iter()
        .enumerate()
        .take(end_index + 1)
        .skip(start_index)
    {
        let value = portfolio.value_of(prices, index)?;
        trajectory.day_indexes.push(index);
        trajectory.days.push(day.clone());
        trajectory.values.push(value);
    }
    Ok(trajectory)
}

pub fn rolling_simulate(
    problem: &Problem,
    start_capital: f64,
    weights: &PortfolioAllocation,
    lower_index: usize,
    upper_index: usize,
    holding_days: usize,
    prices: &PriceTable,
) -> Result<Vec<WindowResult>> {
    rolling_simulate_with_policy(
        BoundsPolicy::Lenient,
        problem,
        start_capital,
        weights,
        lower_index,
        upper_index,
        holding_days,
        prices,
    )
}

#[allow(clippy::too_many_arguments)]
pub fn rolling_simulate_with_policy(
    policy: BoundsPolicy,
    problem: &Problem,
    start_capital: f64,
    weights: &PortfolioAllocation,
    lower_index: usize,
    upper_index: usize,
    holding_days: usize,
    prices: &PriceTable,
) -> Result<Vec<WindowResult>> {
    if let Err(err) = check_bounds(problem.len(), lower_index, upper_index, holding_days) {
        return match policy {
            BoundsPolicy::Lenient => {
                debug!("SIM: Skipping rolling simulation, {}", err);
                Ok(Vec::new())
            }
            BoundsPolicy::Strict => Err(err.into()),
        };
    }

    //Upper bound is exclusive, see module docs.
    let last_start = upper_index.saturating_sub(holding_days);
    let mut results = Vec::with_capacity(last_start.saturating_sub(lower_index));
    for day in lower_index..last_start {
        let trajectory = simulate_window(
            problem,
            day,
            day + holding_days,
            start_capital,
            weights,
            prices,
        )?;
        results.push(WindowResult::from_trajectory(
            day,
            trajectory,
            start_capital,
        ));
    }
    info!(
        "SIM: Simulated {:?} windows of {:?} days between {:?} and {:?}",
        results.len(),
        holding_days,
        lower_index,
        upper_index
    );
    Ok(results)
}

fn check_bounds(
    length: usize,
    lower_index: usize,
    upper_index: usize,
    holding_days: usize,
) -> std::result::Result<(), ValidationError> {
    if holding_days == 0 {
        return Err(ValidationError::InvalidHoldingPeriod { holding_days });
    }
    for index in [lower_index, upper_index] {
        if index >= length {
            return Err(ValidationError::IndexOutOfBounds { index, length });
        }
    }
    Ok(())
}
