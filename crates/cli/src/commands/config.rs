use std::env;
use std::fs;
use std::path::Path;

use mspquote_core::config::{resolve_config_path, AppConfig, ConfigOverrides};
use toml::Value;

use crate::commands::CommandContext;

pub fn run(context: &CommandContext) -> String {
    let config = match AppConfig::load(context.load_options(ConfigOverrides::default())) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(context.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "catalog.override_path",
        &config.catalog.override_path.display().to_string(),
        source("catalog.override_path", &["MSPQUOTE_CATALOG_OVERRIDE_PATH"]),
    ));
    let default_path = config
        .catalog
        .default_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<embedded>".to_string());
    lines.push(render_line(
        "catalog.default_path",
        &default_path,
        source("catalog.default_path", &["MSPQUOTE_CATALOG_DEFAULT_PATH"]),
    ));

    lines.push(render_line(
        "document.currency_symbol",
        &format!("{:?}", config.document.currency_symbol),
        source("document.currency_symbol", &["MSPQUOTE_CURRENCY_SYMBOL"]),
    ));
    lines.push(render_line(
        "document.output_path",
        &config.document.output_path.display().to_string(),
        source("document.output_path", &["MSPQUOTE_OUTPUT_PATH"]),
    ));

    lines.push(render_line(
        "branding.company_name",
        or_unset(&config.branding.company_name),
        source("branding.company_name", &["MSPQUOTE_COMPANY_NAME"]),
    ));
    lines.push(render_line(
        "branding.company_address",
        or_unset(&config.branding.company_address.replace('\n', ", ")),
        source("branding.company_address", &["MSPQUOTE_COMPANY_ADDRESS"]),
    ));
    let logo_path = config
        .branding
        .logo_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unset>".to_string());
    lines.push(render_line(
        "branding.logo_path",
        &logo_path,
        source("branding.logo_path", &["MSPQUOTE_LOGO_PATH"]),
    ));

    lines.push(render_line(
        "quote.tax_rate",
        &config.quote.tax_rate.to_string(),
        source("quote.tax_rate", &["MSPQUOTE_TAX_RATE"]),
    ));
    lines.push(render_line(
        "quote.terms",
        or_unset(&config.quote.terms.replace('\n', " ")),
        source("quote.terms", &[]),
    ));
    lines.push(render_line(
        "quote.due_in_days",
        &config.quote.due_in_days.to_string(),
        source("quote.due_in_days", &["MSPQUOTE_DUE_IN_DAYS"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["MSPQUOTE_LOGGING_LEVEL", "MSPQUOTE_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        config.logging.format.as_str(),
        source("logging.format", &["MSPQUOTE_LOGGING_FORMAT", "MSPQUOTE_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let set_env_key = env_keys
        .iter()
        .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = set_env_key {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn or_unset(value: &str) -> &str {
    if value.trim().is_empty() {
        "<unset>"
    } else {
        value
    }
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
