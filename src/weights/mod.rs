//! Validation and rescaling of target allocations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DataError;
use crate::input::PriceTable;
use crate::types::{PortfolioAllocation, Ticker};

pub const NORMALIZATION_TOLERANCE: f64 = 1e-6;

///Weights as supplied by a caller, before any validation of the values. Entries that can't be
///read as a number are dropped when parsing from JSON, entries that are negative or non-finite
///are kept here and dropped by [normalize_weights].
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct RawWeights(BTreeMap<Ticker, f64>);

impl RawWeights {
    pub fn from_json(map: &Map<String, Value>) -> Result<Self, DataError> {
        let mut weights = BTreeMap::new();
        for (symbol, value) in map {
            let ticker = Ticker::new(symbol.as_str())?;
            if let Some(weight) = coerce_weight(value) {
                weights.insert(ticker, weight);
            }
        }
        Ok(Self(weights))
    }

    pub fn get(&self, ticker: impl AsRef<str>) -> Option<f64> {
        self.0.get(ticker.as_ref()).copied()
    }

    pub fn insert(&mut self, ticker: Ticker, weight: f64) {
        self.0.insert(ticker, weight);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ticker, f64)> {
        self.0.iter().map(|(ticker, weight)| (ticker, *weight))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    ///Fails on the first ticker that has no series in `prices`.
    pub fn reject_unknown(&self, prices: &PriceTable) -> Result<(), DataError> {
        match self.0.keys().find(|ticker| !prices.contains(ticker)) {
            Some(ticker) => Err(DataError::UnknownTicker {
                ticker: ticker.to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn new() -> Self {
        Self(BTreeMap::new())
    }
}

impl TryFrom<Map<String, Value>> for RawWeights {
    type Error = DataError;

    fn try_from(value: Map<String, Value>) -> Result<Self, Self::Error> {
        RawWeights::from_json(&value)
    }
}

impl From<&PortfolioAllocation> for RawWeights {
    fn from(value: &PortfolioAllocation) -> Self {
        Self(
            value
                .iter()
                .map(|(ticker, weight)| (ticker.clone(), **weight))
                .collect(),
        )
    }
}

impl FromIterator<(Ticker, f64)> for RawWeights {
    fn from_iter<T: IntoIterator<Item = (Ticker, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

//Numbers and numeric strings are accepted, everything else is treated as non-numeric.
fn coerce_weight(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedWeights {
    pub valid: bool,
    pub weights: PortfolioAllocation,
}

impl NormalizedWeights {
    fn invalid() -> Self {
        Self {
            valid: false,
            weights: PortfolioAllocation::new(),
        }
    }
}

///Drops negative and non-finite entries then rescales the rest to sum to one. A non-positive total
///is the only failure and is reported with `valid = false` and no weights.
pub fn normalize_weights(raw: &RawWeights) -> NormalizedWeights {
    let sanitized: Vec<(&Ticker, f64)> = raw
        .iter()
        .filter(|(_, weight)| weight.is_finite() && *weight >= 0.0)
        .collect();

    let total: f64 = sanitized.iter().map(|(_, weight)| weight).sum();
    if total <= 0.0 {
        return NormalizedWeights::invalid();
    }

    let weights: PortfolioAllocation = sanitized
        .into_iter()
        .map(|(ticker, weight)| (ticker.clone(), weight / total))
        .collect();
    let valid = (weights.total() - 1.0).abs() < NORMALIZATION_TOLERANCE;
    NormalizedWeights { valid, weights }
}

pub fn equal_weights(tickers: &[Ticker]) -> PortfolioAllocation {
    if tickers.is_empty() {
        return PortfolioAllocation::new();
    }
    let weight = 1.0 / tickers.len() as f64;
    tickers
        .iter()
        .map(|ticker| (ticker.clone(), weight))
        .collect()
}

///Restricts `raw` to `tickers`, anything missing or not strictly positive becomes zero.
pub fn sanitize_weights(raw: &RawWeights, tickers: &[Ticker]) -> RawWeights {
    tickers
        .iter()
        .map(|ticker| {
            let weight = raw
                .get(ticker)
                .filter(|weight| weight.is_finite() && *weight > 0.0)
                .unwrap_or(0.0);
            (ticker.clone(), weight)
        })
        .collect()
}

///Named target allocation over the tickers of a dataset.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Allocation {
    pub name: String,
    pub weights: PortfolioAllocation,
}

impl Allocation {
    ///Sanitizes and normalizes `raw`. If nothing valid is left, the allocation falls back to equal
    ///weights across `tickers`.
    pub fn create(name: impl Into<String>, raw: &RawWeights, tickers: &[Ticker]) -> Self {
        let normalized = normalize_weights(&sanitize_weights(raw, tickers));
        let weights = if normalized.valid {
            normalized.weights
        } else {
            normalize_weights(&RawWeights::from(&equal_weights(tickers))).weights
        };
        Self {
            name: name.into(),
            weights,
        }
    }

    pub fn equal(name: impl Into<String>, tickers: &[Ticker]) -> Self {
        Self {
            name: name.into(),
            weights: equal_weights(tickers),
        }
    }
}
