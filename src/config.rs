use rocket::{
    data::{Limits, ToByteUnit},
    figment::{
        providers::{Env, Serialized},
        Figment,
    },
};
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_API_URL;

const TEMPLATE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates");
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/static");

/// Settings of this crate, read from the same figment as Rocket's own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    /// Seconds an alert stays on screen.
    pub alert_timeout: u64,
    /// Largest accepted image upload in bytes.
    pub max_image_size: u64,
    /// Bytes of decoded images kept around for `/blob/<key>`.
    pub blob_budget: usize,
    pub static_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            alert_timeout: 5,
            max_image_size: 5 * 1024 * 1024,
            blob_budget: 64 * 1024 * 1024,
            static_dir: STATIC_DIR.to_string(),
        }
    }
}

/// Rocket's default figment with our defaults joined in and `HALAK_`
/// environment variables merged on top.
pub fn figment() -> Figment {
    // uploads above the image limit must still be read whole to be rejected
    let limits = Limits::default()
        .limit("data-form", 16.mebibytes())
        .limit("file", 16.mebibytes());

    rocket::Config::figment()
        .merge(("limits", limits))
        .join(("template_dir", TEMPLATE_DIR))
        .join(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("HALAK_").global())
}
