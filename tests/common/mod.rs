use rand::distributions::{Distribution, Uniform};
use rand::thread_rng;

use tiree::input::{Problem, ProblemBuilder};
use tiree::types::Ticker;
use tiree::weights::RawWeights;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn ticker(symbol: &str) -> Ticker {
    Ticker::new(symbol).unwrap()
}

///Single ticker growing 10% a day over six days.
pub fn constant_growth_problem() -> Problem {
    ProblemBuilder::new()
        .with_days(vec!["D0", "D1", "D2", "D3", "D4", "D5"])
        .with_series(
            ticker("AAA"),
            vec![
                Some(100.0),
                Some(110.0),
                Some(121.0),
                Some(133.1),
                Some(146.41),
                Some(161.051),
            ],
        )
        .build()
}

pub fn random_weights(tickers: &[Ticker]) -> RawWeights {
    let dist = Uniform::new(0.01, 10.0);
    let mut rng = thread_rng();
    tickers
        .iter()
        .map(|ticker| (ticker.clone(), dist.sample(&mut rng)))
        .collect()
}
