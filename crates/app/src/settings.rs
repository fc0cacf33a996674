//! Application settings, read from `settings.toml` and the environment.
//!
//! Environment variables use the `TESSERA` prefix with `__` as separator,
//! e.g. `TESSERA__SERVER__PORT=8080`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level filter (trace, debug, info, warn, error).
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("server.port", 3000)?
            .set_default("server.database.sqlite", "./tessera.db")?
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("TESSERA").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
