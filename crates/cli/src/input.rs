//! Quote input files.
//!
//! A quote file is TOML shaped like `QuoteState` (`[devices]`, `[add_ons]`, `nvr_tier`,
//! ...). Whatever it leaves out comes from the configured template, so a file holding only
//! device counts still carries the configured branding, tax rate, and terms.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use mspquote_core::config::AppConfig;
use mspquote_core::domain::quote::{tax_rate_from_percent, NvrTier, QuoteState};
use mspquote_core::errors::{ApplicationError, DomainError};
use mspquote_core::session::QuoteSession;
use rust_decimal::Decimal;
use toml::Value;
use tracing::warn;

/// Edits the operator can apply on top of the quote file.
#[derive(Clone, Debug, Default)]
pub struct QuoteAdjustments {
    pub tax_percent: Option<Decimal>,
    pub nvr_tier: Option<NvrTier>,
    pub logo_path: Option<PathBuf>,
}

/// Builds a validated session from `path` layered over the configured template.
pub fn load_session(
    config: &AppConfig,
    path: &Path,
    today: NaiveDate,
    adjustments: &QuoteAdjustments,
) -> Result<QuoteSession, ApplicationError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        ApplicationError::Persistence(format!(
            "could not read quote input `{}`: {error}",
            path.display()
        ))
    })?;
    let mut overlay = raw.parse::<Value>().map_err(|error| invalid_input(path, error))?;
    let file_logo = take_logo_path(&mut overlay).map(|logo| relative_to(path, &logo));
    dates_to_strings(&mut overlay);

    let template = config.quote_template(today);
    let mut merged = Value::try_from(&template).map_err(|error| invalid_input(path, error))?;
    merge(&mut merged, overlay);
    let state: QuoteState = merged.try_into().map_err(|error| invalid_input(path, error))?;

    let mut session = QuoteSession::new(template)?;
    session.replace(state)?;

    let logo_path = adjustments
        .logo_path
        .clone()
        .or(file_logo)
        .or_else(|| config.branding.logo_path.clone());
    let logo = logo_path.as_deref().and_then(read_logo);
    let tax_rate = adjustments.tax_percent.map(tax_rate_from_percent);
    let nvr_tier = adjustments.nvr_tier;

    session.update(|state| {
        if let Some(tax_rate) = tax_rate {
            state.metadata.tax_rate = tax_rate;
        }
        if let Some(nvr_tier) = nvr_tier {
            state.nvr_tier = nvr_tier;
        }
        if logo.is_some() {
            state.branding.logo = logo;
        }
    })?;

    Ok(session)
}

fn invalid_input(path: &Path, error: impl std::fmt::Display) -> ApplicationError {
    ApplicationError::Domain(DomainError::InvariantViolation(format!(
        "quote input `{}` is invalid: {error}",
        path.display()
    )))
}

fn take_logo_path(overlay: &mut Value) -> Option<PathBuf> {
    let branding = overlay.get_mut("branding")?.as_table_mut()?;
    match branding.remove("logo_path")? {
        Value::String(path) => Some(PathBuf::from(path)),
        _ => None,
    }
}

fn relative_to(input: &Path, logo: &Path) -> PathBuf {
    if logo.is_absolute() {
        return logo.to_path_buf();
    }
    input.parent().map(|dir| dir.join(logo)).unwrap_or_else(|| logo.to_path_buf())
}

fn read_logo(path: &Path) -> Option<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(error) => {
            warn!(
                event_name = "quote.logo.unreadable",
                path = %path.display(),
                error = %error,
                "logo file could not be read, continuing without it"
            );
            None
        }
    }
}

// Bare TOML dates (`issue_date = 2025-05-01`) deserialize as strings only.
fn dates_to_strings(value: &mut Value) {
    match value {
        Value::Datetime(datetime) => *value = Value::String(datetime.to_string()),
        Value::Table(table) => table.iter_mut().for_each(|(_, value)| dates_to_strings(value)),
        Value::Array(items) => items.iter_mut().for_each(dates_to_strings),
        _ => {}
    }
}

/// Overlays `patch` onto `base`: tables merge key by key, anything else replaces.
fn merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Table(base), Value::Table(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, patch) => *base = patch,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::NaiveDate;
    use mspquote_core::config::AppConfig;
    use mspquote_core::domain::quote::NvrTier;
    use mspquote_core::errors::ApplicationError;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{dates_to_strings, load_session, QuoteAdjustments};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 1).expect("valid date")
    }

    fn configured() -> AppConfig {
        let mut config = AppConfig::default();
        config.branding.company_name = "Northwind IT".to_owned();
        config.quote.tax_rate = Decimal::new(6, 2);
        config.quote.terms = "Net 30".to_owned();
        config
    }

    #[test]
    fn file_values_override_template_and_gaps_are_filled() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("quote.toml");
        fs::write(
            &path,
            r#"
nvr_tier = "16-port"

[customer]
name = "Contoso Dental"

[devices]
workstations = 9

[metadata]
tax_rate = 0.0825
due_date = 2025-05-31
"#,
        )
        .expect("write input");

        let adjustments = QuoteAdjustments::default();
        let session = load_session(&configured(), &path, today(), &adjustments).expect("load");
        let state = session.state();

        assert_eq!(state.customer.name, "Contoso Dental");
        assert_eq!(state.devices.workstations, 9);
        assert_eq!(state.nvr_tier, NvrTier::Port16);
        assert_eq!(state.metadata.tax_rate, Decimal::new(825, 4));
        assert_eq!(state.branding.company_name, "Northwind IT");
        assert_eq!(state.terms, "Net 30");
        assert_eq!(state.metadata.issue_date, Some(today()));
        assert_eq!(state.metadata.due_date, NaiveDate::from_ymd_opt(2025, 5, 31));
    }

    #[test]
    fn adjustments_apply_after_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("quote.toml");
        fs::write(&path, "[devices]\nservers = 1\n").expect("write input");
        let adjustments = QuoteAdjustments {
            tax_percent: Some(Decimal::new(825, 2)),
            nvr_tier: Some(NvrTier::Port8),
            logo_path: None,
        };

        let session = load_session(&configured(), &path, today(), &adjustments).expect("load");

        assert_eq!(session.state().metadata.tax_rate, Decimal::new(825, 4));
        assert_eq!(session.state().nvr_tier, NvrTier::Port8);
    }

    #[test]
    fn logo_path_in_file_is_resolved_next_to_input() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join("logo.png"), b"opaque").expect("write logo");
        let path = dir.path().join("quote.toml");
        fs::write(&path, "[branding]\nlogo_path = \"logo.png\"\n").expect("write input");

        let adjustments = QuoteAdjustments::default();
        let session = load_session(&configured(), &path, today(), &adjustments).expect("load");

        assert_eq!(session.state().branding.logo.as_deref(), Some(&b"opaque"[..]));
    }

    #[test]
    fn out_of_range_tax_is_a_domain_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("quote.toml");
        fs::write(&path, "[metadata]\ntax_rate = 8.25\n").expect("write input");

        let error = load_session(&configured(), &path, today(), &QuoteAdjustments::default())
            .expect_err("tax above one");

        assert_eq!(error.error_class(), "domain_validation");
    }

    #[test]
    fn missing_input_is_a_persistence_error() {
        let dir = TempDir::new().expect("temp dir");
        let error = load_session(
            &configured(),
            &dir.path().join("absent.toml"),
            today(),
            &QuoteAdjustments::default(),
        )
        .expect_err("missing file");

        assert!(matches!(error, ApplicationError::Persistence(_)));
    }

    #[test]
    fn nested_bare_dates_become_strings() {
        let mut value: toml::Value =
            "[metadata]\nissue_date = 2025-05-01\n\n[[notes]]\nsent = 2025-05-02\n"
                .parse()
                .expect("parse toml");

        dates_to_strings(&mut value);

        assert_eq!(value["metadata"]["issue_date"].as_str(), Some("2025-05-01"));
        assert_eq!(value["notes"][0]["sent"].as_str(), Some("2025-05-02"));
    }
}
