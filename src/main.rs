use std::{io, sync::Mutex};
use actix_web::{web::Data, App, HttpServer, middleware::Logger};
use log::{error, info};

use auth::Auth;
use config::Config;
use db::DB;
use github::GithubClient;

mod auth;
mod config;
mod data;
mod db;
mod error;
mod github;
mod routes;
mod validation;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| {
        error!("{}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;
    let store = DB::connect(&config.store.path).map_err(|e| {
        error!("{}", e);
        io::Error::new(io::ErrorKind::Other, e.to_string())
    })?;

    let auth = Data::new(Auth::init(&config.auth));
    let db = Data::new(Mutex::new(store));
    let github = Data::new(GithubClient::new(&config.github));

    info!("listening on {}:{}", config.server.host, config.server.port);
    let server_db = db.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(auth.clone())
            .app_data(server_db.clone())
            .app_data(github.clone())
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    if let Ok(mut db) = db.lock() {
        db.close();
    }
    Ok(())
}
