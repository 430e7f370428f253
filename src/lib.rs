//! # How does Tiree work?
//!
//! Tiree answers one question about a static allocation: if you had bought this portfolio on any
//! day in a range and held it for a fixed number of days, what would have happened?
//!
//! A simulation is composed of three pieces: a [Problem](input::Problem), which holds the day
//! labels and the price series for every ticker, an allocation of target weights, and a holding
//! period. A portfolio is bought once at the start of a window using the allocation and is never
//! rebalanced, it is marked to market on every day of the window. The rolling driver repeats this
//! for every start day in the range and reports the trajectory, the minimum value, and the PnL of
//! each window. [perf] turns those windows into summary statistics.
//!
//! Prices are held in constant USD. If the dataset includes a daily conversion factor then the
//! same simulation can be run in constant EUR, see [Currency](input::Currency).
//!
//! ## Missing data
//!
//! Real price histories have gaps. Tiree does not fill them: a window that needs a price that isn't
//! there fails with an error naming the ticker and the day index. The rolling driver stops at the
//! first failing window rather than silently skipping it, the caller decides what to do.
//!
//! ## Server
//!
//! [http] wraps the library in a JSON server built on actix-web. The server loads one dataset at
//! startup and is otherwise stateless: every request brings its own weights, bounds, and capital.

pub mod error;
pub mod http;
pub mod input;
pub mod perf;
pub mod portfolio;
pub mod schedule;
pub mod sim;
pub mod types;
pub mod weights;

pub use perf::percentile;
pub use sim::{rolling_simulate, simulate_window};
pub use weights::normalize_weights;
