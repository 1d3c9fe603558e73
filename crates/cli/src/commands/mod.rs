pub mod catalog;
pub mod config;
pub mod doctor;
pub mod price;
pub mod quote;

use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use mspquote_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use mspquote_core::errors::ApplicationError;
use mspquote_core::store::{CatalogLocations, CatalogStore, LiveCatalog};
use serde::Serialize;
use serde_json::Value;

/// Inputs shared by every command: where config comes from and the clock reading.
#[derive(Clone, Debug)]
pub struct CommandContext {
    pub config_path: Option<PathBuf>,
    pub now: NaiveDateTime,
}

impl CommandContext {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path, now: Local::now().naive_local() }
    }

    pub fn load_options(&self, overrides: ConfigOverrides) -> LoadOptions {
        LoadOptions {
            config_path: self.config_path.clone(),
            require_file: self.config_path.is_some(),
            overrides,
        }
    }

    pub fn load_config(&self, overrides: ConfigOverrides) -> Result<AppConfig, ApplicationError> {
        Ok(AppConfig::load(self.load_options(overrides))?)
    }
}

pub fn open_catalog(config: &AppConfig) -> Result<LiveCatalog, ApplicationError> {
    let store = CatalogStore::new(CatalogLocations::from(&config.catalog));
    Ok(LiveCatalog::open(store)?)
}

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_details(command, message, None)
    }

    pub fn success_with_details(
        command: &str,
        message: impl Into<String>,
        details: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            details,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            details: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_error(command: &str, error: &ApplicationError) -> Self {
        Self::failure(command, error.error_class(), error.to_string(), error.exit_code())
    }

    /// Plain-text output for commands whose success is meant to be read, not parsed.
    pub fn text(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
