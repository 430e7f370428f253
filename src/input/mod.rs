//! Dataset consumed by the simulation engine.
//!
//! A [Problem] is a set of day labels with one price series per ticker. Prices are stored in
//! constant USD and may be converted into constant EUR with a per-day factor. Day labels are
//! opaque: they are only used as keys for lookups and as labels in results, no calendar arithmetic
//! is performed on them.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use derive_more::Display;
use log::debug;
use rand::thread_rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::types::Ticker;

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Currency {
    #[serde(rename = "USD")]
    #[display("USD")]
    Usd,
    #[serde(rename = "EUR")]
    #[display("EUR")]
    Eur,
}

impl Currency {
    pub fn label(&self) -> &'static str {
        match self {
            Currency::Usd => "constant USD",
            Currency::Eur => "constant EUR",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::Usd
    }
}

///Prices for every ticker in a single currency. Positions in each series align with the days of
///the [Problem] the table was derived from, missing prices are stored as `NaN`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceTable(BTreeMap<Ticker, Vec<f64>>);

impl PriceTable {
    pub fn series(&self, ticker: impl AsRef<str>) -> Option<&[f64]> {
        self.0.get(ticker.as_ref()).map(|series| series.as_slice())
    }

    ///Returns `None` when the ticker has no series or the series is shorter than `index`. The
    ///price itself is returned as stored and may be non-finite.
    pub fn price(&self, ticker: impl AsRef<str>, index: usize) -> Option<f64> {
        self.series(ticker)?.get(index).copied()
    }

    pub fn insert(&mut self, ticker: Ticker, series: Vec<f64>) {
        self.0.insert(ticker, series);
    }

    pub fn tickers(&self) -> impl Iterator<Item = &Ticker> {
        self.0.keys()
    }

    pub fn contains(&self, ticker: impl AsRef<str>) -> bool {
        self.0.contains_key(ticker.as_ref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn new() -> Self {
        Self(BTreeMap::new())
    }
}

#[derive(Debug, Deserialize)]
struct ProblemFile {
    days: Vec<String>,
    #[serde(default)]
    price_in_constant_usd: BTreeMap<Ticker, Vec<Option<f64>>>,
    #[serde(default)]
    constant_usd_to_constant_eur: Option<Vec<Option<f64>>>,
    #[serde(default)]
    symbol_descriptions: BTreeMap<String, String>,
    #[serde(default)]
    constant_usd_day: Option<String>,
    #[serde(default)]
    constant_eur_day: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(from = "ProblemFile")]
pub struct Problem {
    days: Vec<String>,
    usd: BTreeMap<Ticker, Vec<Option<f64>>>,
    usd_to_eur: Option<Vec<Option<f64>>>,
    descriptions: BTreeMap<String, String>,
    constant_usd_day: Option<String>,
    constant_eur_day: Option<String>,
    lookup: HashMap<String, usize>,
}

impl From<ProblemFile> for Problem {
    fn from(file: ProblemFile) -> Self {
        let lookup = build_day_index(&file.days);
        Self {
            days: file.days,
            usd: file.price_in_constant_usd,
            usd_to_eur: file.constant_usd_to_constant_eur,
            descriptions: file.symbol_descriptions,
            constant_usd_day: file.constant_usd_day,
            constant_eur_day: file.constant_eur_day,
            lookup,
        }
    }
}

//Later duplicates win, matching a plain map insert over the labels in order.
fn build_day_index(days: &[String]) -> HashMap<String, usize> {
    days.iter()
        .enumerate()
        .map(|(index, day)| (day.clone(), index))
        .collect()
}

impl Problem {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let problem: Problem =
            serde_json::from_str(json).context("could not parse problem data")?;
        debug!(
            "INPUT: Loaded problem with {:?} days and {:?} tickers",
            problem.len(),
            problem.usd.len()
        );
        Ok(problem)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("could not read problem file {}", path.display()))?;
        Self::from_json_str(&contents)
    }

    pub fn days(&self) -> &[String] {
        &self.days
    }

    pub fn day(&self, index: usize) -> Option<&str> {
        self.days.get(index).map(|day| day.as_str())
    }

    pub fn day_index(&self, label: &str) -> Option<usize> {
        self.lookup.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn tickers(&self) -> Vec<Ticker> {
        self.usd.keys().cloned().collect()
    }

    pub fn descriptions(&self) -> &BTreeMap<String, String> {
        &self.descriptions
    }

    ///Trimmed description for a ticker, `None` if missing or blank.
    pub fn description(&self, ticker: &str) -> Option<&str> {
        self.descriptions
            .get(ticker)
            .map(|desc| desc.trim())
            .filter(|desc| !desc.is_empty())
    }

    pub fn constant_usd_day(&self) -> Option<&str> {
        self.constant_usd_day.as_deref()
    }

    pub fn constant_eur_day(&self) -> Option<&str> {
        self.constant_eur_day.as_deref()
    }

    pub fn price_table(&self, currency: Currency) -> Option<PriceTable> {
        match currency {
            Currency::Usd => Some(self.usd_prices()),
            Currency::Eur => self.eur_prices(),
        }
    }

    pub fn currencies(&self) -> Vec<Currency> {
        [Currency::Usd, Currency::Eur]
            .into_iter()
            .filter(|currency| self.price_table(*currency).is_some())
            .collect()
    }

    fn usd_prices(&self) -> PriceTable {
        let mut table = PriceTable::new();
        for (ticker, series) in &self.usd {
            table.insert(
                ticker.clone(),
                series.iter().map(|price| price.unwrap_or(f64::NAN)).collect(),
            );
        }
        table
    }

    //The EUR table only exists when there is one conversion factor per day. Any series that
    //doesn't line up with the days is left out, so a simulation over that ticker fails when
    //the portfolio is built.
    fn eur_prices(&self) -> Option<PriceTable> {
        let conversion = self.usd_to_eur.as_ref()?;
        if conversion.len() != self.days.len() || self.days.is_empty() {
            return None;
        }

        let mut table = PriceTable::new();
        for (ticker, series) in &self.usd {
            if series.len() != self.days.len() {
                continue;
            }
            let converted = series
                .iter()
                .zip(conversion.iter())
                .map(|(price, factor)| match (price, factor) {
                    (Some(price), Some(factor)) if price.is_finite() && factor.is_finite() => {
                        price * factor
                    }
                    _ => f64::NAN,
                })
                .collect();
            table.insert(ticker.clone(), converted);
        }
        Some(table)
    }
}

pub struct ProblemBuilder {
    days: Vec<String>,
    usd: BTreeMap<Ticker, Vec<Option<f64>>>,
    usd_to_eur: Option<Vec<Option<f64>>>,
    descriptions: BTreeMap<String, String>,
}

impl ProblemBuilder {
    pub fn build(&mut self) -> Problem {
        let days = std::mem::take(&mut self.days);
        Problem {
            lookup: build_day_index(&days),
            days,
            usd: std::mem::take(&mut self.usd),
            usd_to_eur: self.usd_to_eur.take(),
            descriptions: std::mem::take(&mut self.descriptions),
            constant_usd_day: None,
            constant_eur_day: None,
        }
    }

    pub fn with_days(&mut self, days: Vec<impl Into<String>>) -> &mut Self {
        self.days = days.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_series(&mut self, ticker: Ticker, series: Vec<Option<f64>>) -> &mut Self {
        self.usd.insert(ticker, series);
        self
    }

    pub fn with_eur_conversion(&mut self, factors: Vec<Option<f64>>) -> &mut Self {
        self.usd_to_eur = Some(factors);
        self
    }

    pub fn with_description(
        &mut self,
        ticker: impl Into<String>,
        description: impl Into<String>,
    ) -> &mut Self {
        self.descriptions.insert(ticker.into(), description.into());
        self
    }

    pub fn new() -> Self {
        Self {
            days: Vec::new(),
            usd: BTreeMap::new(),
            usd_to_eur: None,
            descriptions: BTreeMap::new(),
        }
    }
}

impl Default for ProblemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates a random two-ticker [Problem] for use in tests and benchmarks that don't depend on
/// specific prices. Both tickers always have a price so any window over it can be simulated.
pub fn random_problem(length: usize) -> Problem {
    let price_dist = Uniform::new(90.0, 100.0);
    let factor_dist = Uniform::new(0.8, 1.0);
    let mut rng = thread_rng();

    let mut abc = Vec::with_capacity(length);
    let mut bcd = Vec::with_capacity(length);
    let mut factors = Vec::with_capacity(length);
    let mut days = Vec::with_capacity(length);
    for date in 100..length + 100 {
        days.push(format!("{:06}", date));
        abc.push(Some(price_dist.sample(&mut rng)));
        bcd.push(Some(price_dist.sample(&mut rng)));
        factors.push(Some(factor_dist.sample(&mut rng)));
    }

    ProblemBuilder::new()
        .with_days(days)
        .with_series(Ticker(String::from("ABC")), abc)
        .with_series(Ticker(String::from("BCD")), bcd)
        .with_eur_conversion(factors)
        .build()
}

#[cfg(test)]
mod tests {
    use super::{random_problem, Currency, Problem};

    const PROBLEM: &str = r#"{
        "days": ["2020-01-01", "2020-01-02", "2020-01-03"],
        "price_in_constant_usd": {
            "ABC": [100.0, null, 110.0],
            "BCD": [10.0, 11.0]
        },
        "constant_usd_to_constant_eur": [0.5, 0.5, null],
        "symbol_descriptions": {"ABC": "  Alpha  ", "BCD": " "},
        "constant_usd_day": "2020-01-03"
    }"#;

    #[test]
    fn test_that_problem_parses_and_indexes_days() {
        let problem = Problem::from_json_str(PROBLEM).unwrap();
        assert_eq!(problem.len(), 3);
        assert_eq!(problem.day_index("2020-01-02"), Some(1));
        assert_eq!(problem.day_index("2021-01-01"), None);
        assert_eq!(problem.constant_usd_day(), Some("2020-01-03"));
        assert_eq!(problem.constant_eur_day(), None);
        assert_eq!(problem.description("ABC"), Some("Alpha"));
        assert_eq!(problem.description("BCD"), None);
        let tickers: Vec<String> = problem.tickers().into_iter().map(String::from).collect();
        assert_eq!(tickers, vec!["ABC", "BCD"]);
    }

    #[test]
    fn test_that_null_prices_become_nan() {
        let problem = Problem::from_json_str(PROBLEM).unwrap();
        let usd = problem.price_table(Currency::Usd).unwrap();
        assert_eq!(usd.price("ABC", 0), Some(100.0));
        assert!(usd.price("ABC", 1).unwrap().is_nan());
        assert_eq!(usd.price("BCD", 2), None);
        assert_eq!(usd.series("XYZ"), None);
    }

    #[test]
    fn test_that_eur_table_converts_and_skips_short_series() {
        let problem = Problem::from_json_str(PROBLEM).unwrap();
        let eur = problem.price_table(Currency::Eur).unwrap();
        assert_eq!(eur.price("ABC", 0), Some(50.0));
        assert!(eur.price("ABC", 1).unwrap().is_nan());
        //Factor is missing on the last day
        assert!(eur.price("ABC", 2).unwrap().is_nan());
        assert!(!eur.contains("BCD"));
    }

    #[test]
    fn test_that_eur_table_is_unavailable_with_mismatched_factors() {
        let json = r#"{
            "days": ["a", "b"],
            "price_in_constant_usd": {"ABC": [1.0, 2.0]},
            "constant_usd_to_constant_eur": [0.9]
        }"#;
        let problem = Problem::from_json_str(json).unwrap();
        assert!(problem.price_table(Currency::Eur).is_none());
        assert_eq!(problem.currencies(), vec![Currency::Usd]);
    }

    #[test]
    fn test_that_invalid_ticker_fails_to_load() {
        let json = r#"{"days": ["a"], "price_in_constant_usd": {"A B": [1.0]}}"#;
        assert!(Problem::from_json_str(json).is_err());
    }

    #[test]
    fn test_that_random_problem_has_full_series() {
        let problem = random_problem(50);
        assert_eq!(problem.len(), 50);
        let usd = problem.price_table(Currency::Usd).unwrap();
        assert_eq!(usd.series("ABC").unwrap().len(), 50);
        assert!(usd.series("BCD").unwrap().iter().all(|p| p.is_finite()));
        assert!(problem.price_table(Currency::Eur).is_some());
    }
}
