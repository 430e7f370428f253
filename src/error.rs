//! Error taxonomy for the simulation engine.
//!
//! Single-window operations are strict and return these errors. The rolling driver is lenient
//! about its overall bounds (see [BoundsPolicy](crate::sim::BoundsPolicy)) but any error raised
//! by an individual window still propagates out of the whole run.

use derive_more::{Display, Error, From};

use crate::types::Ticker;

pub type Result<T> = std::result::Result<T, SimError>;

///Caller-supplied scalar parameters that are out of contract.
#[derive(Clone, Debug, Display, Error, PartialEq)]
pub enum ValidationError {
    #[display("start capital must be a positive number, got {capital}")]
    InvalidCapital { capital: f64 },
    #[display("invalid quantity held for {ticker}")]
    InvalidQuantity { ticker: Ticker },
    #[display("index {index} out of bounds for dataset with {length} days")]
    IndexOutOfBounds { index: usize, length: usize },
    #[display("end index {end} must be >= start index {start}")]
    InvertedRange { start: usize, end: usize },
    #[display("holding period must be a positive number of days, got {holding_days}")]
    InvalidHoldingPeriod { holding_days: usize },
    #[display("simulation must have {field}")]
    IncompleteConfiguration { field: &'static str },
}

///Problems with the shape of the dataset. The engine never substitutes a default price.
#[derive(Clone, Debug, Display, Error, PartialEq)]
pub enum DataError {
    #[display("missing price series for {ticker}")]
    MissingSeries { ticker: Ticker },
    #[display("invalid price for {ticker} on index {index}")]
    InvalidPrice { ticker: Ticker, index: usize },
    #[display("unknown ticker {ticker}")]
    UnknownTicker { ticker: String },
    #[display("invalid ticker symbol {ticker:?}")]
    InvalidTicker { ticker: String },
}

///Violations of derived state.
#[derive(Clone, Debug, Display, Error, PartialEq)]
pub enum StateError {
    #[display("no positions created from weights")]
    EmptyPortfolio,
}

#[derive(Clone, Debug, Display, Error, From, PartialEq)]
pub enum SimError {
    #[display("{_0}")]
    Validation(ValidationError),
    #[display("{_0}")]
    Data(DataError),
    #[display("{_0}")]
    State(StateError),
}
