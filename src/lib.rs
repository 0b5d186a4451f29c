#![forbid(unsafe_code)]

pub mod alert;
pub mod api;
pub mod blobs;
pub mod config;
pub mod form;
pub mod image;
pub mod models;
pub mod routes;

use std::{collections::HashMap, sync::Arc};

use log::info;
use rocket::{catchers, figment::Figment, fs::FileServer, routes, Build, Rocket};
use rocket_dyn_templates::{
    tera::{Result as TeraResult, Value},
    Template,
};

use crate::{
    api::{FishApi, HttpFishApi},
    blobs::ObjectUrls,
    config::Config,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not read configuration")]
    Config(#[from] rocket::figment::Error),

    #[error("Could not build http client")]
    HttpClient(#[source] reqwest::Error),

    #[error("Could not set up api client")]
    Api(#[from] api::Error),
}

/// Formats numbers without a trailing `.0`, so `30.0` shows as `30`.
fn number(value: &Value, _args: &HashMap<String, Value>) -> TeraResult<Value> {
    match value {
        Value::Number(n) => Ok(Value::String(
            n.as_f64().map(|x| x.to_string()).unwrap_or_else(|| n.to_string()),
        )),
        _ => Ok(value.clone()),
    }
}

/// The application talking to the api configured in [`config::figment`].
pub fn rocket() -> Result<Rocket<Build>, Error> {
    let figment = config::figment();
    let config: Config = figment.extract()?;

    let client = reqwest::Client::builder()
        .build()
        .map_err(Error::HttpClient)?;
    let api = HttpFishApi::new(client, &config.api_url)?;

    build(figment, Arc::new(api))
}

/// The application talking to `api`.
pub fn build(figment: Figment, api: Arc<dyn FishApi>) -> Result<Rocket<Build>, Error> {
    let config: Config = figment.extract()?;
    info!("Using fish api at {}", config.api_url);

    let rocket = rocket::custom(figment)
        .manage(api)
        .manage(ObjectUrls::new(config.blob_budget))
        .attach(Template::custom(|engines| {
            engines.tera.register_filter("number", number);
        }))
        .register(
            "/",
            catchers![routes::not_found, routes::internal_server_error],
        )
        .mount(
            "/",
            routes![
                routes::index,
                routes::list,
                routes::detail,
                routes::edit,
                routes::update,
                routes::blob
            ],
        )
        .mount("/", FileServer::from(&config.static_dir))
        .manage(config);

    Ok(rocket)
}
