//! JSON server over the simulation engine.
//!
//! The server loads one dataset at startup and never mutates it, so [AppState] is shared between
//! workers without a lock. Every request builds its own portfolios and results. Day bounds are
//! given as day labels and resolved to indices against the dataset.

use std::collections::HashMap;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use derive_more::{Display, Error, From};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::input::{Currency, PriceTable, Problem};
use crate::perf::PerformanceSummary;
use crate::sim::{rolling_simulate, simulate_window, Trajectory, WindowResult};
use crate::weights::{normalize_weights, Allocation, NormalizedWeights, RawWeights};

#[derive(Debug, Display, Error, From)]
pub enum ServerError {
    #[display("{_0}")]
    Simulation(SimError),
    #[from(ignore)]
    #[display("Day {day} not found in problem data")]
    UnknownDay { day: String },
    #[from(ignore)]
    #[display("Problem data missing {} price series", currency.label())]
    MissingCurrency { currency: Currency },
    #[from(ignore)]
    #[display("{reason}")]
    InvalidRequest { reason: String },
}

impl ServerError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: format!("Unable to run simulation: {}", self),
        })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TickerInfo {
    pub ticker: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub days: usize,
    pub first_day: Option<String>,
    pub last_day: Option<String>,
    pub constant_usd_day: Option<String>,
    pub constant_eur_day: Option<String>,
    pub tickers: Vec<TickerInfo>,
    pub currencies: Vec<Currency>,
}

#[derive(Debug, Deserialize)]
pub struct NormalizeRequest {
    pub weights: RawWeights,
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    pub start_day: String,
    pub end_day: String,
    pub capital: f64,
    pub weights: RawWeights,
    #[serde(default)]
    pub currency: Currency,
}

#[derive(Debug, Deserialize)]
pub struct AllocationRequest {
    pub name: Option<String>,
    ///Missing weights mean an equal weight across every ticker in the dataset.
    pub weights: Option<RawWeights>,
}

#[derive(Debug, Deserialize)]
pub struct RollingRequest {
    pub allocations: Vec<AllocationRequest>,
    pub lower_day: String,
    pub upper_day: String,
    pub holding_days: i64,
    pub capital: f64,
    #[serde(default)]
    pub currency: Currency,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AllocationResult {
    pub name: String,
    pub windows: Vec<WindowResult>,
    pub summary: Option<PerformanceSummary>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RollingResponse {
    pub currency: Currency,
    pub allocations: Vec<AllocationResult>,
}

pub struct AppState {
    problem: Problem,
    prices: HashMap<Currency, PriceTable>,
}

impl AppState {
    pub fn new(problem: Problem) -> Self {
        let prices = problem
            .currencies()
            .into_iter()
            .filter_map(|currency| Some((currency, problem.price_table(currency)?)))
            .collect();
        Self { problem, prices }
    }

    pub fn info(&self) -> InfoResponse {
        let tickers = self
            .problem
            .tickers()
            .into_iter()
            .map(|ticker| TickerInfo {
                description: self.problem.description(&ticker).map(String::from),
                ticker: ticker.into(),
            })
            .collect();
        let mut currencies: Vec<Currency> = self.prices.keys().copied().collect();
        currencies.sort_by_key(|currency| currency.to_string());

        InfoResponse {
            version: env!("CARGO_PKG_VERSION").to_string(),
            days: self.problem.len(),
            first_day: self.problem.days().first().cloned(),
            last_day: self.problem.days().last().cloned(),
            constant_usd_day: self.problem.constant_usd_day().map(String::from),
            constant_eur_day: self.problem.constant_eur_day().map(String::from),
            tickers,
            currencies,
        }
    }

    pub fn simulate(&self, req: &SimulateRequest) -> Result<Trajectory, ServerError> {
        let prices = self.prices_for(req.currency)?;
        req.weights.reject_unknown(prices).map_err(SimError::from)?;
        let normalized = normalize_weights(&req.weights);
        if !normalized.valid {
            return Err(ServerError::invalid(
                "Weights must contain at least one positive entry",
            ));
        }
        let start_index = self.parse_day(&req.start_day)?;
        let end_index = self.parse_day(&req.end_day)?;

        Ok(simulate_window(
            &self.problem,
            start_index,
            end_index,
            req.capital,
            &normalized.weights,
            prices,
        )?)
    }

    pub fn rolling(&self, req: &RollingRequest) -> Result<RollingResponse, ServerError> {
        if !req.capital.is_finite() || req.capital <= 0.0 {
            return Err(ServerError::invalid(
                "Initial capital must be a positive number",
            ));
        }
        if req.holding_days <= 0 {
            return Err(ServerError::invalid(
                "Holding time must be a positive integer",
            ));
        }
        let holding_days = usize::try_from(req.holding_days)
            .map_err(|_| ServerError::invalid("Holding time is too large"))?;
        let lower_index = self.parse_day(&req.lower_day)?;
        let upper_index = self.parse_day(&req.upper_day)?;
        if lower_index >= upper_index {
            return Err(ServerError::invalid("Start day must come before end day"));
        }
        let prices = self.prices_for(req.currency)?;

        let tickers = self.problem.tickers();
        let mut allocations = Vec::new();
        for (pos, requested) in req.allocations.iter().enumerate() {
            let name = requested
                .name
                .clone()
                .unwrap_or_else(|| format!("Allocation {}", pos + 1));
            let weights = match &requested.weights {
                Some(raw) => {
                    raw.reject_unknown(prices).map_err(SimError::from)?;
                    let normalized = normalize_weights(raw);
                    if !normalized.valid {
                        debug!("SERVER: Skipping allocation {:?} with invalid weights", name);
                        continue;
                    }
                    normalized.weights
                }
                None => Allocation::equal(name.as_str(), &tickers).weights,
            };

            let windows = rolling_simulate(
                &self.problem,
                req.capital,
                &weights,
                lower_index,
                upper_index,
                holding_days,
                prices,
            )?;
            if windows.is_empty() {
                continue;
            }
            let summary = PerformanceSummary::from_windows(&windows, req.capital);
            allocations.push(AllocationResult {
                name,
                windows,
                summary,
            });
        }

        info!(
            "SERVER: Ran {:?} allocations in {}",
            allocations.len(),
            req.currency.label()
        );
        Ok(RollingResponse {
            currency: req.currency,
            allocations,
        })
    }

    fn prices_for(&self, currency: Currency) -> Result<&PriceTable, ServerError> {
        self.prices
            .get(&currency)
            .filter(|table| !table.is_empty())
            .ok_or(ServerError::MissingCurrency { currency })
    }

    fn parse_day(&self, day: &str) -> Result<usize, ServerError> {
        if day.is_empty() {
            return Err(ServerError::invalid("Missing day"));
        }
        self.problem
            .day_index(day)
            .ok_or_else(|| ServerError::UnknownDay {
                day: day.to_string(),
            })
    }
}

pub fn normalize(req: &NormalizeRequest) -> NormalizedWeights {
    normalize_weights(&req.weights)
}

pub mod server {
    use actix_web::{get, post, web};

    use super::{
        AppState, InfoResponse, NormalizeRequest, RollingRequest, RollingResponse, ServerError,
        SimulateRequest,
    };
    use crate::sim::Trajectory;
    use crate::weights::NormalizedWeights;

    #[get("/info")]
    pub async fn info(app: web::Data<AppState>) -> web::Json<InfoResponse> {
        web::Json(app.info())
    }

    #[post("/normalize")]
    pub async fn normalize(req: web::Json<NormalizeRequest>) -> web::Json<NormalizedWeights> {
        web::Json(super::normalize(&req))
    }

    #[post("/simulate")]
    pub async fn simulate(
        app: web::Data<AppState>,
        req: web::Json<SimulateRequest>,
    ) -> Result<web::Json<Trajectory>, ServerError> {
        Ok(web::Json(app.simulate(&req)?))
    }

    #[post("/rolling")]
    pub async fn rolling(
        app: web::Data<AppState>,
        req: web::Json<RollingRequest>,
    ) -> Result<web::Json<RollingResponse>, ServerError> {
        Ok(web::Json(app.rolling(&req)?))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{test, web, App};
    use serde_json::json;

    use super::server::*;
    use super::{AppState, ErrorResponse, InfoResponse, RollingResponse};
    use crate::input::{random_problem, Problem};
    use crate::sim::Trajectory;
    use crate::weights::NormalizedWeights;

    const PROBLEM: &str = r#"{
        "days": ["D0", "D1", "D2", "D3", "D4", "D5"],
        "price_in_constant_usd": {
            "AAA": [100.0, 110.0, 121.0, 133.1, 146.41, 161.051],
            "BBB": [50.0, null, 50.0, 50.0, 50.0, 50.0]
        },
        "constant_usd_to_constant_eur": [0.5, 0.5, 0.5, 0.5, 0.5, 0.5],
        "symbol_descriptions": {"AAA": "Growth"}
    }"#;

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState::new(Problem::from_json_str(PROBLEM).unwrap()))
    }

    #[actix_web::test]
    async fn test_info_lists_tickers_and_currencies() {
        let app = test::init_service(App::new().app_data(state()).service(info)).await;
        let req = test::TestRequest::get().uri("/info").to_request();
        let resp: InfoResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.days, 6);
        assert_eq!(resp.first_day.as_deref(), Some("D0"));
        assert_eq!(resp.tickers.len(), 2);
        assert_eq!(resp.tickers[0].description.as_deref(), Some("Growth"));
        assert_eq!(resp.currencies.len(), 2);
    }

    #[actix_web::test]
    async fn test_normalize_endpoint() {
        let app = test::init_service(App::new().service(normalize)).await;
        let req = test::TestRequest::post()
            .uri("/normalize")
            .set_json(json!({"weights": {"AAA": 1, "BBB": "3"}}))
            .to_request();
        let resp: NormalizedWeights = test::call_and_read_body_json(&app, req).await;
        assert!(resp.valid);
        assert_eq!(**resp.weights.get("BBB").unwrap(), 0.75);
    }

    #[actix_web::test]
    async fn test_simulate_and_rolling_loop() {
        let app = test::init_service(
            App::new()
                .app_data(state())
                .service(simulate)
                .service(rolling),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/simulate")
            .set_json(json!({
                "start_day": "D0",
                "end_day": "D2",
                "capital": 1000.0,
                "weights": {"AAA": 1.0},
                "currency": "EUR"
            }))
            .to_request();
        let resp: Trajectory = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.day_indexes, vec![0, 1, 2]);
        assert!((resp.values[2] - 1210.0).abs() < 1e-6);

        let req = test::TestRequest::post()
            .uri("/rolling")
            .set_json(json!({
                "allocations": [
                    {"name": "growth", "weights": {"AAA": 1.0}},
                    {"name": "nothing", "weights": {"AAA": 0.0}}
                ],
                "lower_day": "D0",
                "upper_day": "D5",
                "holding_days": 2,
                "capital": 1000.0
            }))
            .to_request();
        let resp: RollingResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.allocations.len(), 1);
        let growth = &resp.allocations[0];
        assert_eq!(growth.name, "growth");
        assert_eq!(growth.windows.len(), 3);
        let summary = growth.summary.as_ref().unwrap();
        assert!((summary.mean_pct - 21.0).abs() < 1e-6);
    }

    #[actix_web::test]
    async fn test_rolling_reports_data_errors() {
        let app = test::init_service(App::new().app_data(state()).service(rolling)).await;
        let req = test::TestRequest::post()
            .uri("/rolling")
            .set_json(json!({
                "allocations": [{"weights": {"BBB": 1.0}}],
                "lower_day": "D0",
                "upper_day": "D5",
                "holding_days": 2,
                "capital": 1000.0
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(
            body.error,
            "Unable to run simulation: invalid price for BBB on index 1"
        );
    }

    #[actix_web::test]
    async fn test_rolling_rejects_bad_requests() {
        let app = test::init_service(App::new().app_data(state()).service(rolling)).await;
        for (body, message) in [
            (
                json!({"allocations": [], "lower_day": "D0", "upper_day": "D5", "holding_days": 2, "capital": 0.0}),
                "Initial capital must be a positive number",
            ),
            (
                json!({"allocations": [], "lower_day": "D0", "upper_day": "D5", "holding_days": 0, "capital": 1.0}),
                "Holding time must be a positive integer",
            ),
            (
                json!({"allocations": [], "lower_day": "D9", "upper_day": "D5", "holding_days": 1, "capital": 1.0}),
                "Day D9 not found in problem data",
            ),
            (
                json!({"allocations": [], "lower_day": "D3", "upper_day": "D3", "holding_days": 1, "capital": 1.0}),
                "Start day must come before end day",
            ),
            (
                json!({"allocations": [{"weights": {"ZZZ": 1.0}}], "lower_day": "D0", "upper_day": "D5", "holding_days": 1, "capital": 1.0}),
                "unknown ticker ZZZ",
            ),
        ] {
            let req = test::TestRequest::post()
                .uri("/rolling")
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 400);
            let body: ErrorResponse = test::read_body_json(resp).await;
            assert_eq!(body.error, format!("Unable to run simulation: {message}"));
        }
    }

    #[actix_web::test]
    async fn test_rolling_defaults_to_equal_weights() {
        let problem = random_problem(40);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(problem)))
                .service(rolling),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/rolling")
            .set_json(json!({
                "allocations": [{}],
                "lower_day": "000100",
                "upper_day": "000139",
                "holding_days": 10,
                "capital": 100000.0,
                "currency": "EUR"
            }))
            .to_request();
        let resp: RollingResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.allocations[0].name, "Allocation 1");
        assert_eq!(resp.allocations[0].windows.len(), 29);
    }
}
