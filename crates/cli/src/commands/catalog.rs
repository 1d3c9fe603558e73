use std::fs;
use std::path::{Path, PathBuf};

use mspquote_core::config::ConfigOverrides;
use mspquote_core::errors::ApplicationError;
use mspquote_core::store::LiveCatalog;
use mspquote_document::money::format_money;
use rust_decimal::Decimal;
use serde_json::json;

use crate::commands::{open_catalog, CommandContext, CommandResult};

const COMMAND: &str = "catalog";

#[derive(Clone, Debug)]
pub enum CatalogAction {
    Show,
    SetPrice { code: String, price: Decimal },
    Import { file: PathBuf },
    Path,
}

pub fn run(context: &CommandContext, action: CatalogAction) -> CommandResult {
    let result = context
        .load_config(ConfigOverrides::default())
        .and_then(|config| Ok((open_catalog(&config)?, config.document.currency_symbol)))
        .and_then(|(catalog, symbol)| match action {
            CatalogAction::Show => Ok(CommandResult::text(catalog.pretty_json())),
            CatalogAction::SetPrice { code, price } => set_price(catalog, &code, price, &symbol),
            CatalogAction::Import { file } => import(catalog, &file),
            CatalogAction::Path => Ok(describe_path(&catalog)),
        });

    match result {
        Ok(result) => result,
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}

fn set_price(
    mut catalog: LiveCatalog,
    code: &str,
    price: Decimal,
    symbol: &str,
) -> Result<CommandResult, ApplicationError> {
    let persisted = catalog.set_price(code, price)?;
    if !persisted {
        return Ok(not_persisted(&catalog));
    }

    Ok(CommandResult::success(
        COMMAND,
        format!(
            "set `{code}` to {} in {}",
            format_money(price, symbol),
            catalog.store().override_path().display()
        ),
    ))
}

fn import(mut catalog: LiveCatalog, file: &Path) -> Result<CommandResult, ApplicationError> {
    let raw = fs::read_to_string(file).map_err(|error| {
        ApplicationError::Persistence(format!(
            "could not read catalog file `{}`: {error}",
            file.display()
        ))
    })?;
    let persisted = catalog.replace_from_json(&raw)?;
    if !persisted {
        return Ok(not_persisted(&catalog));
    }

    let missing = catalog.catalog().missing_codes();
    let details = json!({
        "entries": catalog.catalog().services().len(),
        "missing_codes": missing,
    });
    Ok(CommandResult::success_with_details(
        COMMAND,
        format!(
            "imported {} entries into {}",
            catalog.catalog().services().len(),
            catalog.store().override_path().display()
        ),
        Some(details),
    ))
}

fn describe_path(catalog: &LiveCatalog) -> CommandResult {
    let override_path = catalog.store().override_path();
    let details = json!({
        "override_path": override_path.display().to_string(),
        "override_exists": override_path.exists(),
        "loaded_from": catalog.source().to_string(),
    });
    CommandResult::success_with_details(
        COMMAND,
        format!("catalog override path: {}", override_path.display()),
        Some(details),
    )
}

// The edit only lived in memory and is gone once the command exits.
fn not_persisted(catalog: &LiveCatalog) -> CommandResult {
    CommandResult::failure(
        COMMAND,
        "persistence",
        format!(
            "catalog change could not be saved to {}",
            catalog.store().override_path().display()
        ),
        4,
    )
}
