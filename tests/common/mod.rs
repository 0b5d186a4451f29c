#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use halak_web::{
    api::{Error, FishApi, Updated},
    config,
    models::{FishRecord, Kep},
};
use reqwest::StatusCode;
use rocket::{figment::Figment, http::ContentType, local::asynchronous::Client};
use serde_json::{json, Map, Value};

/// Id for which the fake answers with a server error.
pub const BROKEN_ID: i64 = 500;

pub const BOUNDARY: &str = "halak-test-boundary";

/// In-memory stand-in for the remote api.
#[derive(Debug, Default)]
pub struct FakeApi {
    pub fishes: Vec<FishRecord>,
    pub list_fails: bool,
    pub reject_update: Option<(StatusCode, String)>,
    pub updates: Mutex<Vec<(i64, Value)>>,
}

impl FakeApi {
    pub fn with(fishes: Vec<FishRecord>) -> Self {
        Self {
            fishes,
            ..Default::default()
        }
    }

    pub fn last_update(&self) -> Option<(i64, Value)> {
        self.updates.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl FishApi for FakeApi {
    async fn list(&self) -> Result<Vec<FishRecord>, Error> {
        if self.list_fails {
            return Err(Error::Status(StatusCode::SERVICE_UNAVAILABLE));
        }
        Ok(self.fishes.clone())
    }

    async fn get(&self, id: i64) -> Result<FishRecord, Error> {
        if id == BROKEN_ID {
            return Err(Error::Status(StatusCode::INTERNAL_SERVER_ERROR));
        }
        self.fishes
            .iter()
            .find(|fish| fish.id == id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    async fn update(&self, id: i64, record: &FishRecord) -> Result<Updated, Error> {
        self.updates
            .lock()
            .unwrap()
            .push((id, serde_json::to_value(record).unwrap()));

        match &self.reject_update {
            Some((status, body)) => Err(Error::Rejected {
                status: *status,
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                body: body.clone(),
            }),
            None => Ok(Updated::Json(json!({ "id": id }))),
        }
    }
}

pub fn fish(id: i64, nev: &str, faj: &str, meret_cm: f64, kep: Option<Kep>) -> FishRecord {
    FishRecord {
        id,
        nev: nev.to_string(),
        faj: faj.to_string(),
        meret_cm,
        to_id: 1,
        kep,
        extra: Map::new(),
    }
}

pub async fn client(api: Arc<FakeApi>) -> Client {
    client_with(api, config::figment()).await
}

pub async fn client_with(api: Arc<FakeApi>, figment: Figment) -> Client {
    let rocket = halak_web::build(figment, api).expect("valid configuration");
    Client::tracked(rocket).await.expect("valid rocket instance")
}

/// Every `/blob/` url linked from `body`.
pub fn blob_urls(body: &str) -> Vec<String> {
    body.split("src=\"")
        .skip(1)
        .map(|rest| rest.chars().take_while(|c| *c != '"').collect::<String>())
        .filter(|src| src.starts_with("/blob/"))
        .collect()
}

/// The body a browser sends for the edit form.
pub fn multipart(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> (ContentType, Vec<u8>) {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }

    let (filename, content_type, bytes) = match file {
        Some((content_type, bytes)) => ("hal.jpg", content_type, bytes),
        None => ("", "application/octet-stream", &[][..]),
    };
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"kep\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let content_type =
        ContentType::new("multipart", "form-data").with_params(("boundary", BOUNDARY));
    (content_type, body)
}

/// Undoes the html escaping of `/` so urls can be searched for.
pub fn unescape(body: &str) -> String {
    body.replace("&#x2F;", "/")
}
