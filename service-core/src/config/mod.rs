use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

/// Base settings every service in the workspace shares. Service crates
/// flatten this into their own config struct and layer their settings on
/// top of it.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Load from an optional `configuration` file, then from `APP__`-prefixed
    /// environment variables, which take precedence over the file.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let settings = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
