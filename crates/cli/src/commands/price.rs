use std::path::PathBuf;

use mspquote_core::config::ConfigOverrides;
use mspquote_core::cpq::pricing::{ComputedQuote, PricingEngine, RuleTablePricingEngine};
use mspquote_core::errors::ApplicationError;
use mspquote_document::money::{format_money, format_percent, round_to_cents};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::commands::{open_catalog, CommandContext, CommandResult};
use crate::input::{load_session, QuoteAdjustments};

const COMMAND: &str = "price";

#[derive(Clone, Debug)]
pub struct PriceArgs {
    pub input: PathBuf,
    pub json: bool,
    pub adjustments: QuoteAdjustments,
}

#[derive(Debug, Serialize)]
struct PriceReport {
    catalog_source: String,
    missing_codes: Vec<&'static str>,
    lines: Vec<PricedLine>,
    subtotal: Decimal,
    tax_rate: String,
    tax: Decimal,
    grand_total: Decimal,
}

#[derive(Debug, Serialize)]
struct PricedLine {
    label: String,
    code: String,
    quantity: u32,
    unit_price: Decimal,
    extended_price: Decimal,
}

pub fn run(context: &CommandContext, args: PriceArgs) -> CommandResult {
    match build_report(context, &args) {
        Ok((report, _)) if args.json => match serde_json::to_string_pretty(&report) {
            Ok(output) => CommandResult::text(output),
            Err(error) => CommandResult::failure(
                COMMAND,
                "serialization",
                format!("could not serialize price report: {error}"),
                1,
            ),
        },
        Ok((report, symbol)) => CommandResult::text(render_human(&report, &symbol)),
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}

fn build_report(
    context: &CommandContext,
    args: &PriceArgs,
) -> Result<(PriceReport, String), ApplicationError> {
    let config = context.load_config(ConfigOverrides::default())?;
    let catalog = open_catalog(&config)?;
    let session = load_session(&config, &args.input, context.now.date(), &args.adjustments)?;
    let quote = RuleTablePricingEngine.compute(catalog.catalog(), session.state());

    let report = PriceReport {
        catalog_source: catalog.source().to_string(),
        missing_codes: catalog.catalog().missing_codes(),
        lines: priced_lines(&quote),
        subtotal: round_to_cents(quote.subtotal),
        tax_rate: format_percent(quote.tax_rate),
        tax: round_to_cents(quote.tax),
        grand_total: round_to_cents(quote.grand_total),
    };
    Ok((report, config.document.currency_symbol))
}

fn priced_lines(quote: &ComputedQuote) -> Vec<PricedLine> {
    quote
        .billable_lines()
        .map(|line| PricedLine {
            label: line.label.clone(),
            code: line.code.clone(),
            quantity: line.quantity,
            unit_price: round_to_cents(line.unit_price),
            extended_price: round_to_cents(line.extended_price),
        })
        .collect()
}

fn render_human(report: &PriceReport, symbol: &str) -> String {
    let money = |amount: Decimal| format_money(amount, symbol);

    let mut lines = vec![format!("catalog: {}", report.catalog_source)];
    if !report.missing_codes.is_empty() {
        lines.push(format!("unpriced codes (priced at 0): {}", report.missing_codes.join(", ")));
    }
    for line in &report.lines {
        lines.push(format!(
            "- {:<26} {:>5} @ {:>12} = {:>12}",
            line.label,
            line.quantity,
            money(line.unit_price),
            money(line.extended_price)
        ));
    }
    lines.push(format!("subtotal: {}", money(report.subtotal)));
    lines.push(format!("tax ({}): {}", report.tax_rate, money(report.tax)));
    lines.push(format!("total: {}", money(report.grand_total)));
    lines.join("\n")
}
