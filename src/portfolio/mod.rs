//! Buy-and-hold portfolio construction and valuation.
//!
//! A [Portfolio] is bought once, at the prices of a single day, and is never rebalanced. Later days
//! only re-price the quantities that were bought.

use std::collections::BTreeMap;

use log::debug;

use crate::error::{DataError, Result, StateError, ValidationError};
use crate::input::PriceTable;
use crate::types::{PortfolioAllocation, PortfolioQty, Ticker};

#[derive(Clone, Debug, PartialEq)]
pub struct Portfolio {
    holdings: BTreeMap<Ticker, PortfolioQty>,
}

impl Portfolio {
    ///Converts `start_capital` into share quantities using the prices on `start_index`. Every
    ///ticker with a positive weight must have a finite, positive price on that day.
    pub fn purchase(
        start_capital: f64,
        weights: &PortfolioAllocation,
        prices: &PriceTable,
        start_index: usize,
    ) -> Result<Self> {
        if !start_capital.is_finite() || start_capital <= 0.0 {
            return Err(ValidationError::InvalidCapital {
                capital: start_capital,
            }
            .into());
        }

        let mut holdings = BTreeMap::new();
        for (ticker, weight) in weights.iter() {
            let weight = **weight;
            if !weight.is_finite() || weight <= 0.0 {
                continue;
            }
            let series = prices
                .series(ticker)
                .ok_or_else(|| DataError::MissingSeries {
                    ticker: ticker.clone(),
                })?;
            let price = series
                .get(start_index)
                .copied()
                .filter(|price| price.is_finite() && *price > 0.0)
                .ok_or_else(|| DataError::InvalidPrice {
                    ticker: ticker.clone(),
                    index: start_index,
                })?;
            holdings.insert(
                ticker.clone(),
                PortfolioQty::from(start_capital * weight / price),
            );
        }

        if holdings.is_empty() {
            return Err(StateError::EmptyPortfolio.into());
        }
        debug!(
            "PORTFOLIO: Purchased {:?} positions with {:?} on index {:?}",
            holdings.len(),
            start_capital,
            start_index
        );
        Ok(Self { holdings })
    }

    ///Builds a portfolio from quantities directly, without buying anything. Quantities are not
    ///checked here, [value_of](Portfolio::value_of) rejects any that are negative or non-finite.
    pub fn from_holdings(holdings: impl IntoIterator<Item = (Ticker, f64)>) -> Self {
        Self {
            holdings: holdings
                .into_iter()
                .map(|(ticker, qty)| (ticker, PortfolioQty::from(qty)))
                .collect(),
        }
    }

    ///Marks every position to the prices on `day_index`. A missing or non-finite price is an error,
    ///no price is ever substituted.
    pub fn value_of(&self, prices: &PriceTable, day_index: usize) -> Result<f64> {
        let mut total_value = 0.0;
        for (ticker, qty) in &self.holdings {
            let qty = **qty;
            if !qty.is_finite() || qty < 0.0 {
                return Err(ValidationError::InvalidQuantity {
                    ticker: ticker.clone(),
                }
                .into());
            }
            let series = prices
                .series(ticker)
                .ok_or_else(|| DataError::MissingSeries {
                    ticker: ticker.clone(),
                })?;
            let price = series
                .get(day_index)
                .copied()
                .filter(|price| price.is_finite())
                .ok_or_else(|| DataError::InvalidPrice {
                    ticker: ticker.clone(),
                    index: day_index,
                })?;
            total_value += qty * price;
        }
        Ok(total_value)
    }

    pub fn get(&self, ticker: impl AsRef<str>) -> Option<PortfolioQty> {
        self.holdings.get(ticker.as_ref()).copied()
    }

    pub fn tickers(&self) -> impl Iterator<Item = &Ticker> {
        self.holdings.keys()
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}
