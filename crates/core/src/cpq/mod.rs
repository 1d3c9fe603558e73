//! Catalog lookup and quote pricing.

pub mod catalog;
pub mod pricing;

pub use catalog::{price_of, Catalog, CatalogFormatError};
pub use pricing::{ComputedQuote, LineCategory, LineItem, PricingEngine, RuleTablePricingEngine};
