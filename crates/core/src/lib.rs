pub mod config;
pub mod cpq;
pub mod decimal;
pub mod domain;
pub mod errors;
pub mod persist;
pub mod session;
pub mod store;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use cpq::catalog::{Catalog, CatalogFormatError};
pub use cpq::pricing::{
    ComputedQuote, LineCategory, LineItem, PricingEngine, RuleTablePricingEngine,
};
pub use domain::quote::{
    AddOns, Branding, Customer, DeviceCounts, NvrTier, QuoteMetadata, QuoteState,
};
pub use domain::service::{ServiceCode, ServiceEntry};
pub use errors::{ApplicationError, DomainError};
pub use session::{QuoteSession, SubscriptionId};
pub use store::{CatalogError, CatalogLocations, CatalogSource, CatalogStore, LiveCatalog};
