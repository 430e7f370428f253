use std::env;
use std::path::Path;

use actix_web::{web, App, HttpServer};
use anyhow::{bail, Context};
use tiree::http::server::{info, normalize, rolling, simulate};
use tiree::http::AppState;
use tiree::input::Problem;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        bail!("usage: tiree_server <address> <port> <problem.json>");
    }

    let address: String = args[1].clone();
    let port: u16 = args[2]
        .parse()
        .with_context(|| format!("invalid port {}", args[2]))?;

    let problem = Problem::from_file(Path::new(&args[3]))?;
    log::info!(
        "SERVER: Loaded {:?} days and {:?} tickers from {}",
        problem.len(),
        problem.tickers().len(),
        args[3]
    );
    let app_state = web::Data::new(AppState::new(problem));

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .service(info)
            .service(normalize)
            .service(simulate)
            .service(rolling)
    })
    .bind((address, port))?
    .run()
    .await?;
    Ok(())
}
