use std::path::PathBuf;

use mspquote_core::config::ConfigOverrides;
use mspquote_core::cpq::pricing::RuleTablePricingEngine;
use mspquote_core::errors::ApplicationError;
use mspquote_document::money::{format_money, round_to_cents};
use mspquote_document::DocumentRenderer;
use serde_json::json;
use tracing::info;

use crate::commands::{open_catalog, CommandContext, CommandResult};
use crate::input::{load_session, QuoteAdjustments};

const COMMAND: &str = "quote";

#[derive(Clone, Debug)]
pub struct QuoteArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub adjustments: QuoteAdjustments,
}

pub fn run(context: &CommandContext, args: QuoteArgs) -> CommandResult {
    match generate(context, args) {
        Ok(result) => result,
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}

fn generate(context: &CommandContext, args: QuoteArgs) -> Result<CommandResult, ApplicationError> {
    let overrides = ConfigOverrides {
        output_path: args.output,
        logo_path: args.adjustments.logo_path.clone(),
        ..ConfigOverrides::default()
    };
    let config = context.load_config(overrides)?;
    let catalog = open_catalog(&config)?;
    let session = load_session(&config, &args.input, context.now.date(), &args.adjustments)?;
    let quote = session.compute(&RuleTablePricingEngine, catalog.catalog());

    let output_path = &config.document.output_path;
    let renderer = DocumentRenderer::new(config.document.currency_symbol.as_str());
    renderer.write_to(output_path, session.state(), &quote, context.now)?;

    info!(
        event_name = "quote.document.generated",
        output = %output_path.display(),
        catalog_source = %catalog.source(),
        lines = quote.billable_lines().count(),
        grand_total = %round_to_cents(quote.grand_total),
        "quote document generated"
    );

    let details = json!({
        "output": output_path.display().to_string(),
        "catalog_source": catalog.source().to_string(),
        "lines": quote.billable_lines().count(),
        "subtotal": round_to_cents(quote.subtotal),
        "tax": round_to_cents(quote.tax),
        "grand_total": round_to_cents(quote.grand_total),
    });
    let message = format!(
        "wrote {} (total {})",
        output_path.display(),
        format_money(quote.grand_total, renderer.currency_symbol())
    );
    Ok(CommandResult::success_with_details(COMMAND, message, Some(details)))
}
