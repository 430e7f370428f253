use crate::error::{Result, ValidationError};
use crate::input::{PriceTable, Problem};
use crate::types::PortfolioAllocation;

use super::{rolling_simulate_with_policy, BoundsPolicy, WindowResult};

///A fully specified rolling simulation. Borrows the dataset and price table so that many runs can
///share them.
#[derive(Clone, Debug)]
pub struct RollingSimulation<'a> {
    problem: &'a Problem,
    prices: &'a PriceTable,
    weights: PortfolioAllocation,
    start_capital: f64,
    lower_index: usize,
    upper_index: usize,
    holding_days: usize,
    policy: BoundsPolicy,
}

impl<'a> RollingSimulation<'a> {
    pub fn run(&self) -> Result<Vec<WindowResult>> {
        rolling_simulate_with_policy(
            self.policy,
            self.problem,
            self.start_capital,
            &self.weights,
            self.lower_index,
            self.upper_index,
            self.holding_days,
            self.prices,
        )
    }

    pub fn start_capital(&self) -> f64 {
        self.start_capital
    }
}

pub struct RollingSimulationBuilder<'a> {
    problem: Option<&'a Problem>,
    prices: Option<&'a PriceTable>,
    weights: Option<PortfolioAllocation>,
    start_capital: Option<f64>,
    bounds: Option<(usize, usize)>,
    holding_days: Option<usize>,
    policy: BoundsPolicy,
}

impl<'a> RollingSimulationBuilder<'a> {
    pub fn build(&mut self) -> Result<RollingSimulation<'a>> {
        let problem = self
            .problem
            .ok_or(ValidationError::IncompleteConfiguration { field: "problem" })?;
        let prices = self
            .prices
            .ok_or(ValidationError::IncompleteConfiguration { field: "prices" })?;
        let weights = self
            .weights
            .take()
            .ok_or(ValidationError::IncompleteConfiguration { field: "weights" })?;
        let start_capital = self
            .start_capital
            .ok_or(ValidationError::IncompleteConfiguration {
                field: "start capital",
            })?;
        let (lower_index, upper_index) = self
            .bounds
            .ok_or(ValidationError::IncompleteConfiguration { field: "bounds" })?;
        let holding_days = self
            .holding_days
            .ok_or(ValidationError::IncompleteConfiguration {
                field: "holding period",
            })?;

        Ok(RollingSimulation {
            problem,
            prices,
            weights,
            start_capital,
            lower_index,
            upper_index,
            holding_days,
            policy: self.policy,
        })
    }

    pub fn with_problem(&mut self, problem: &'a Problem) -> &mut Self {
        self.problem = Some(problem);
        self
    }

    pub fn with_prices(&mut self, prices: &'a PriceTable) -> &mut Self {
        self.prices = Some(prices);
        self
    }

    pub fn with_weights(&mut self, weights: PortfolioAllocation) -> &mut Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_capital(&mut self, start_capital: f64) -> &mut Self {
        self.start_capital = Some(start_capital);
        self
    }

    pub fn with_bounds(&mut self, lower_index: usize, upper_index: usize) -> &mut Self {
        self.bounds = Some((lower_index, upper_index));
        self
    }

    pub fn with_holding_days(&mut self, holding_days: usize) -> &mut Self {
        self.holding_days = Some(holding_days);
        self
    }

    pub fn with_policy(&mut self, policy: BoundsPolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    pub fn new() -> Self {
        Self {
            problem: None,
            prices: None,
            weights: None,
            start_capital: None,
            bounds: None,
            holding_days: None,
            policy: BoundsPolicy::Lenient,
        }
    }
}

impl<'a> Default for RollingSimulationBuilder<'a> {
    fn default() -> Self {
        Self::new()
    }
}
