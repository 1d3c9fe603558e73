use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::catalog::Catalog;
use crate::domain::quote::QuoteState;
use crate::domain::service::codes;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCategory {
    BaseHardware,
    AddOn,
    Surveillance,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub category: LineCategory,
    pub label: String,
    pub code: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub extended_price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedQuote {
    pub lines: Vec<LineItem>,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax: Decimal,
    pub grand_total: Decimal,
}

impl ComputedQuote {
    /// Lines worth showing on a document; zero-quantity lines still count toward the subtotal.
    pub fn billable_lines(&self) -> impl Iterator<Item = &LineItem> {
        self.lines.iter().filter(|line| line.quantity > 0)
    }

    pub fn line(&self, code: &str) -> Option<&LineItem> {
        self.lines.iter().find(|line| line.code == code)
    }
}

pub trait PricingEngine: Send + Sync {
    fn compute(&self, catalog: &Catalog, state: &QuoteState) -> ComputedQuote;
}

#[derive(Default)]
pub struct RuleTablePricingEngine;

impl PricingEngine for RuleTablePricingEngine {
    fn compute(&self, catalog: &Catalog, state: &QuoteState) -> ComputedQuote {
        compute(catalog, state)
    }
}

/// One priced row: where its code, quantity and inclusion come from.
struct LineRule {
    category: LineCategory,
    label: fn(&QuoteState) -> &'static str,
    code: fn(&QuoteState) -> Option<&'static str>,
    quantity: fn(&QuoteState) -> u32,
    included: fn(&QuoteState) -> bool,
}

// Table order is document order: base hardware, add-ons, then cameras and NVR.
fn line_rules() -> [LineRule; 9] {
    [
        LineRule {
            category: LineCategory::BaseHardware,
            label: |_| "Servers",
            code: |_| Some(codes::BASE_SERVER),
            quantity: |state| state.devices.servers,
            included: |_| true,
        },
        LineRule {
            category: LineCategory::BaseHardware,
            label: |_| "Workstations",
            code: |_| Some(codes::BASE_WORKSTATION),
            quantity: |state| state.devices.workstations,
            included: |_| true,
        },
        LineRule {
            category: LineCategory::AddOn,
            label: |_| "Server Backup",
            code: |_| Some(codes::SERVER_BACKUP),
            quantity: |state| state.devices.servers,
            included: |state| state.add_ons.server_backup,
        },
        LineRule {
            category: LineCategory::AddOn,
            label: |_| "Workstation Backup",
            code: |_| Some(codes::WORKSTATION_BACKUP),
            quantity: |state| state.devices.workstations,
            included: |state| state.add_ons.workstation_backup,
        },
        LineRule {
            category: LineCategory::AddOn,
            label: |_| "Advanced Email Security",
            code: |_| Some(codes::EMAIL_SECURITY),
            quantity: |state| state.devices.email_accounts,
            included: |state| state.add_ons.email_security,
        },
        LineRule {
            category: LineCategory::AddOn,
            label: |_| "Huntress Cybersecurity",
            code: |_| Some(codes::HUNTRESS),
            quantity: |state| state.devices.endpoints(),
            included: |state| state.add_ons.huntress,
        },
        LineRule {
            category: LineCategory::AddOn,
            label: |_| "Webroot Cybersecurity",
            code: |_| Some(codes::WEBROOT),
            quantity: |state| state.devices.endpoints(),
            included: |state| state.add_ons.webroot,
        },
        LineRule {
            category: LineCategory::Surveillance,
            label: |_| "Cameras",
            code: |_| Some(codes::CAMERA),
            quantity: |state| state.devices.cameras,
            included: |_| true,
        },
        LineRule {
            category: LineCategory::Surveillance,
            label: |state| state.nvr_tier.line_label(),
            code: |state| state.nvr_tier.price_code(),
            quantity: |_| 1,
            included: |state| state.nvr_tier.is_selected(),
        },
    ]
}

/// Prices `state` against `catalog`. Deterministic and free of I/O.
///
/// Amounts stay unrounded; rounding to cents happens only where money is displayed.
pub fn compute(catalog: &Catalog, state: &QuoteState) -> ComputedQuote {
    let lines: Vec<LineItem> = line_rules()
        .iter()
        .filter(|rule| (rule.included)(state))
        .filter_map(|rule| {
            let code = (rule.code)(state)?;
            let quantity = (rule.quantity)(state);
            let unit_price = catalog.price_of(code);
            Some(LineItem {
                category: rule.category,
                label: (rule.label)(state).to_owned(),
                code: code.to_owned(),
                quantity,
                unit_price,
                extended_price: unit_price.saturating_mul(Decimal::from(quantity)),
            })
        })
        .collect();

    let subtotal =
        lines.iter().fold(Decimal::ZERO, |sum, line| sum.saturating_add(line.extended_price));
    let tax_rate = state.metadata.tax_rate;
    let tax = subtotal.saturating_mul(tax_rate);
    let grand_total = subtotal.saturating_add(tax);

    ComputedQuote { lines, subtotal, tax_rate, tax, grand_total }
}
