// Configuration module: all settings are supplied through prefix-scoped
// environment variables and read once at startup. The resulting `Config`
// is immutable afterwards, except for the access token which is filled in
// by the authentication step before any query runs.

use anyhow::{anyhow, Result};
use std::env;

/// Prefix for every environment variable the tool reads.
pub const ENV_PREFIX: &str = "POCKETDUMP";

const DEFAULT_API_URL: &str = "https://getpocket.com";
const DEFAULT_RENDERER: &str = "w3m";

/// Runtime settings. `consumer_key` is the only required field;
/// `output_dir` is validated lazily because only `dump` needs it.
#[derive(Debug, Clone)]
pub struct Config {
    pub consumer_key: String,
    pub access_token: String,
    pub output_dir: String,
    pub api_url: String,
    pub renderer: String,
}

impl Config {
    /// Build a `Config` from `POCKETDUMP_*` environment variables.
    /// A missing (or empty) `POCKETDUMP_CONSUMER_KEY` is an error; it is
    /// reported before any network activity happens.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get_nonempty = |field: &str| get(&var_name(field)).filter(|v| !v.is_empty());

        let consumer_key = get_nonempty("CONSUMER_KEY").ok_or_else(|| {
            anyhow!(
                "missing required environment variable {}",
                var_name("CONSUMER_KEY")
            )
        })?;

        Ok(Config {
            consumer_key,
            access_token: String::new(),
            output_dir: get_nonempty("OUTPUT_DIR").unwrap_or_default(),
            api_url: get_nonempty("API_URL").unwrap_or_else(|| DEFAULT_API_URL.into()),
            renderer: get_nonempty("RENDERER").unwrap_or_else(|| DEFAULT_RENDERER.into()),
        })
    }
}

/// `<PREFIX>_<FIELDNAME>` naming convention for environment variables.
pub fn var_name(field: &str) -> String {
    format!("{}_{}", ENV_PREFIX, field)
}
