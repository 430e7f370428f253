//! Generic types used across package

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::ops::Deref;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::DataError;

///Validated ticker symbol. Every mapping keyed by ticker in this crate uses this type so that
///malformed symbols are rejected when data enters the system rather than deep inside a run.
#[derive(Clone, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(pub(crate) String);

impl Ticker {
    pub fn new(symbol: impl Into<String>) -> Result<Self, DataError> {
        let symbol = symbol.into();
        if symbol.is_empty() || symbol.chars().any(char::is_whitespace) {
            return Err(DataError::InvalidTicker { ticker: symbol });
        }
        Ok(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Ticker {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Ticker {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Ticker {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ticker::new(value)
    }
}

impl TryFrom<&str> for Ticker {
    type Error = DataError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Ticker::new(value)
    }
}

impl From<Ticker> for String {
    fn from(v: Ticker) -> Self {
        v.0
    }
}

///Number of shares held of a single ticker.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortfolioQty(f64);

impl Deref for PortfolioQty {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<f64> for PortfolioQty {
    fn from(v: f64) -> Self {
        Self(v)
    }
}

impl From<PortfolioQty> for f64 {
    fn from(v: PortfolioQty) -> Self {
        v.0
    }
}

impl Default for PortfolioQty {
    fn default() -> Self {
        Self(0.0)
    }
}

///Size of a position in a portfolio in percentage terms.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortfolioWeight(f64);

impl Deref for PortfolioWeight {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<PortfolioWeight> for f64 {
    fn from(v: PortfolioWeight) -> Self {
        v.0
    }
}

impl From<f64> for PortfolioWeight {
    fn from(v: f64) -> Self {
        PortfolioWeight(v)
    }
}

///Target allocation in terms of percentage weight per ticker. Ordered so that iteration, and
///therefore floating-point summation, is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortfolioAllocation(BTreeMap<Ticker, PortfolioWeight>);

impl PortfolioAllocation {
    pub fn get(&self, ticker: impl AsRef<str>) -> Option<&PortfolioWeight> {
        self.0.get(ticker.as_ref())
    }

    pub fn insert(&mut self, ticker: Ticker, value: impl Into<PortfolioWeight>) {
        self.0.insert(ticker, value.into());
    }

    pub fn keys(&self) -> impl Iterator<Item = &Ticker> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ticker, &PortfolioWeight)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.0.values().map(|weight| **weight).sum()
    }

    pub fn new() -> Self {
        Self(BTreeMap::new())
    }
}

impl FromIterator<(Ticker, f64)> for PortfolioAllocation {
    fn from_iter<T: IntoIterator<Item = (Ticker, f64)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(ticker, weight)| (ticker, PortfolioWeight::from(weight)))
                .collect(),
        )
    }
}
