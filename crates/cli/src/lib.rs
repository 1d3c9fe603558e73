pub mod commands;
pub mod input;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use mspquote_core::config::{AppConfig, ConfigOverrides, LogFormat, LoggingConfig};
use mspquote_core::domain::quote::NvrTier;
use rust_decimal::Decimal;

use crate::commands::catalog::CatalogAction;
use crate::commands::price::PriceArgs;
use crate::commands::quote::QuoteArgs;
use crate::commands::{CommandContext, CommandResult};
use crate::input::QuoteAdjustments;

#[derive(Debug, Parser)]
#[command(
    name = "mspquote",
    about = "Managed-services quote builder",
    long_about = "Price managed-services quotes against the service catalog, render them to PDF, \
                  and maintain the persisted price list.",
    after_help = "Examples:\n  mspquote quote --input acme.toml --output acme.pdf\n  \
                  mspquote price --input acme.toml --json\n  \
                  mspquote catalog set-price huntress 9.50\n  mspquote doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Explicit config file; it must exist when given")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Price a quote input file and write the PDF document")]
    Quote {
        #[arg(long, help = "Quote input file (TOML)")]
        input: PathBuf,
        #[arg(long, help = "Document path; defaults to document.output_path")]
        output: Option<PathBuf>,
        #[arg(long, help = "Logo image (PNG or JPEG) for the document header")]
        logo: Option<PathBuf>,
        #[command(flatten)]
        adjust: AdjustArgs,
    },
    #[command(about = "Print the priced lines and totals without writing a document")]
    Price {
        #[arg(long, help = "Quote input file (TOML)")]
        input: PathBuf,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
        #[command(flatten)]
        adjust: AdjustArgs,
    },
    #[command(about = "Inspect or edit the persisted service catalog")]
    Catalog {
        #[command(subcommand)]
        action: CatalogCommand,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, catalog coverage, and logo readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

#[derive(Debug, Default, clap::Args)]
pub struct AdjustArgs {
    #[arg(long, help = "Tax rate as a percentage, e.g. 8.25")]
    pub tax_percent: Option<Decimal>,
    #[arg(long, help = "NVR tier: none, 8, 16, 32, or 64")]
    pub nvr: Option<NvrTier>,
}

#[derive(Debug, Subcommand)]
pub enum CatalogCommand {
    #[command(about = "Print the active catalog as JSON")]
    Show,
    #[command(about = "Set one unit price and save the catalog")]
    SetPrice { code: String, price: Decimal },
    #[command(about = "Replace the catalog with a JSON price list and save it")]
    Import { file: PathBuf },
    #[command(about = "Show where the catalog is saved and loaded from")]
    Path,
}

impl AdjustArgs {
    fn into_adjustments(self, logo_path: Option<PathBuf>) -> QuoteAdjustments {
        QuoteAdjustments { tax_percent: self.tax_percent, nvr_tier: self.nvr, logo_path }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let context = CommandContext::new(cli.config);

    if let Err(error) = init_logging(&logging_config(&context)) {
        eprintln!("logging disabled: {error}");
    }

    let result = execute(&context, cli.command);
    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

pub fn execute(context: &CommandContext, command: Command) -> CommandResult {
    match command {
        Command::Quote { input, output, logo, adjust } => commands::quote::run(
            context,
            QuoteArgs { input, output, adjustments: adjust.into_adjustments(logo) },
        ),
        Command::Price { input, json, adjust } => commands::price::run(
            context,
            PriceArgs { input, json, adjustments: adjust.into_adjustments(None) },
        ),
        Command::Catalog { action } => {
            let action = match action {
                CatalogCommand::Show => CatalogAction::Show,
                CatalogCommand::SetPrice { code, price } => CatalogAction::SetPrice { code, price },
                CatalogCommand::Import { file } => CatalogAction::Import { file },
                CatalogCommand::Path => CatalogAction::Path,
            };
            commands::catalog::run(context, action)
        }
        Command::Config => CommandResult::text(commands::config::run(context)),
        Command::Doctor { json } => CommandResult::text(commands::doctor::run(context, json)),
    }
}

// A broken config is reported by the command itself; logging falls back to defaults.
fn logging_config(context: &CommandContext) -> LoggingConfig {
    context
        .load_config(ConfigOverrides::default())
        .map(|config| config.logging)
        .unwrap_or_else(|_| AppConfig::default().logging)
}

fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    use tracing::Level;

    let log_level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow!(error))
}
