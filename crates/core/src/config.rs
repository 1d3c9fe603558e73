use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::quote::QuoteState;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["mspquote.toml", "config/mspquote.toml"];

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub document: DocumentConfig,
    pub branding: BrandingConfig,
    pub quote: QuoteDefaults,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogConfig {
    pub override_path: PathBuf,
    /// When unset the catalog embedded in the binary is the fallback.
    pub default_path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentConfig {
    pub currency_symbol: String,
    pub output_path: PathBuf,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BrandingConfig {
    pub company_name: String,
    pub company_address: String,
    pub logo_path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteDefaults {
    pub tax_rate: Decimal,
    pub terms: String,
    pub due_in_days: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_override_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub logo_path: Option<PathBuf>,
    pub currency_symbol: Option<String>,
    pub tax_rate: Option<Decimal>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig {
                override_path: PathBuf::from("pricing.json"),
                default_path: None,
            },
            document: DocumentConfig {
                currency_symbol: "$".to_string(),
                output_path: PathBuf::from("quote.pdf"),
            },
            branding: BrandingConfig::default(),
            quote: QuoteDefaults { tax_rate: Decimal::ZERO, terms: String::new(), due_in_days: 30 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Starting quote for a new session: configured branding, terms, and tax rate, dated
    /// `today` and due `due_in_days` later.
    pub fn quote_template(&self, today: NaiveDate) -> QuoteState {
        let mut state = QuoteState::default();
        state.branding.company_name = self.branding.company_name.clone();
        state.branding.company_address = self.branding.company_address.clone();
        state.metadata.tax_rate = self.quote.tax_rate;
        state.metadata.issue_date = Some(today);
        state.metadata.due_date =
            today.checked_add_days(Days::new(u64::from(self.quote.due_in_days)));
        state.terms = self.quote.terms.clone();
        state
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(override_path) = catalog.override_path {
                self.catalog.override_path = override_path;
            }
            if let Some(default_path) = catalog.default_path {
                self.catalog.default_path = Some(default_path);
            }
        }

        if let Some(document) = patch.document {
            if let Some(currency_symbol) = document.currency_symbol {
                self.document.currency_symbol = currency_symbol;
            }
            if let Some(output_path) = document.output_path {
                self.document.output_path = output_path;
            }
        }

        if let Some(branding) = patch.branding {
            if let Some(company_name) = branding.company_name {
                self.branding.company_name = company_name;
            }
            if let Some(company_address) = branding.company_address {
                self.branding.company_address = company_address;
            }
            if let Some(logo_path) = branding.logo_path {
                self.branding.logo_path = Some(logo_path);
            }
        }

        if let Some(quote) = patch.quote {
            if let Some(tax_rate) = quote.tax_rate {
                self.quote.tax_rate = tax_rate;
            }
            if let Some(terms) = quote.terms {
                self.quote.terms = terms;
            }
            if let Some(due_in_days) = quote.due_in_days {
                self.quote.due_in_days = due_in_days;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("MSPQUOTE_CATALOG_OVERRIDE_PATH") {
            self.catalog.override_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("MSPQUOTE_CATALOG_DEFAULT_PATH") {
            self.catalog.default_path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("MSPQUOTE_CURRENCY_SYMBOL") {
            self.document.currency_symbol = value;
        }
        if let Some(value) = read_env("MSPQUOTE_OUTPUT_PATH") {
            self.document.output_path = PathBuf::from(value);
        }

        if let Some(value) = read_env("MSPQUOTE_COMPANY_NAME") {
            self.branding.company_name = value;
        }
        if let Some(value) = read_env("MSPQUOTE_COMPANY_ADDRESS") {
            self.branding.company_address = value;
        }
        if let Some(value) = read_env("MSPQUOTE_LOGO_PATH") {
            self.branding.logo_path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("MSPQUOTE_TAX_RATE") {
            self.quote.tax_rate = parse_decimal("MSPQUOTE_TAX_RATE", &value)?;
        }
        if let Some(value) = read_env("MSPQUOTE_DUE_IN_DAYS") {
            self.quote.due_in_days = parse_u32("MSPQUOTE_DUE_IN_DAYS", &value)?;
        }

        let log_level =
            read_env("MSPQUOTE_LOGGING_LEVEL").or_else(|| read_env("MSPQUOTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("MSPQUOTE_LOGGING_FORMAT").or_else(|| read_env("MSPQUOTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(override_path) = overrides.catalog_override_path {
            self.catalog.override_path = override_path;
        }
        if let Some(output_path) = overrides.output_path {
            self.document.output_path = output_path;
        }
        if let Some(logo_path) = overrides.logo_path {
            self.branding.logo_path = Some(logo_path);
        }
        if let Some(currency_symbol) = overrides.currency_symbol {
            self.document.currency_symbol = currency_symbol;
        }
        if let Some(tax_rate) = overrides.tax_rate {
            self.quote.tax_rate = tax_rate;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_document(&self.document)?;
        validate_quote(&self.quote)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Config file that `AppConfig::load` would read, if any.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.override_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "catalog.override_path must not be empty".to_string(),
        ));
    }

    if catalog.default_path.as_ref().is_some_and(|path| path.as_os_str().is_empty()) {
        return Err(ConfigError::Validation(
            "catalog.default_path must not be empty when set (omit it to use the embedded catalog)"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_document(document: &DocumentConfig) -> Result<(), ConfigError> {
    if document.output_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "document.output_path must not be empty".to_string(),
        ));
    }

    // Type1 base fonts only carry WinAnsi glyphs.
    if document.currency_symbol.chars().count() > 4 {
        return Err(ConfigError::Validation(
            "document.currency_symbol must be at most 4 characters".to_string(),
        ));
    }

    Ok(())
}

fn validate_quote(quote: &QuoteDefaults) -> Result<(), ConfigError> {
    if quote.tax_rate < Decimal::ZERO || quote.tax_rate > Decimal::ONE {
        return Err(ConfigError::Validation(format!(
            "quote.tax_rate must be a fraction in range 0..=1 (got {}; use 0.0825 for 8.25%)",
            quote.tax_rate
        )));
    }

    if quote.due_in_days > 3650 {
        return Err(ConfigError::Validation(
            "quote.due_in_days must be in range 0..=3650".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value.trim().parse::<Decimal>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    document: Option<DocumentPatch>,
    branding: Option<BrandingPatch>,
    quote: Option<QuotePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    override_path: Option<PathBuf>,
    default_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentPatch {
    currency_symbol: Option<String>,
    output_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct BrandingPatch {
    company_name: Option<String>,
    company_address: Option<String>,
    logo_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct QuotePatch {
    #[serde(default, deserialize_with = "crate::decimal::option_number::deserialize")]
    tax_rate: Option<Decimal>,
    terms: Option<String>,
    due_in_days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
