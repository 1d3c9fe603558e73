use rust_decimal::Decimal;
use thiserror::Error;

use crate::{config::ConfigError, cpq::catalog::CatalogFormatError, store::CatalogError};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("tax rate {0} is outside the range 0..=1")]
    TaxRateOutOfRange(Decimal),
    #[error("service `{code}` has a negative unit price ({price})")]
    NegativeUnitPrice { code: String, price: Decimal },
    #[error("service `{code}` unit price {price} exceeds the maximum of {max}")]
    UnitPriceTooLarge { code: String, price: Decimal, max: Decimal },
    #[error("service `{code}` unit price {price} has more precision than a catalog file keeps")]
    UnitPriceTooPrecise { code: String, price: Decimal },
    #[error("service entry at position {index} has an empty code")]
    EmptyServiceCode { index: usize },
    #[error("no catalog entry has code `{0}`")]
    UnknownServiceCode(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error("document generation failure: {0}")]
    Rendering(String),
}

impl ApplicationError {
    /// Stable machine-readable class used in command outcomes.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(_) => "domain_validation",
            Self::Persistence(_) => "persistence",
            Self::Configuration(_) => "config_validation",
            Self::Rendering(_) => "document_generation",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::Domain(_) => 3,
            Self::Persistence(_) => 4,
            Self::Rendering(_) => 5,
        }
    }
}

impl From<ConfigError> for ApplicationError {
    fn from(value: ConfigError) -> Self {
        Self::Configuration(value.to_string())
    }
}

impl From<CatalogFormatError> for ApplicationError {
    fn from(value: CatalogFormatError) -> Self {
        match value {
            CatalogFormatError::Invalid(error) => Self::Domain(error),
            json @ CatalogFormatError::Json(_) => {
                Self::Domain(DomainError::InvariantViolation(json.to_string()))
            }
        }
    }
}

impl From<CatalogError> for ApplicationError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::Format { source: CatalogFormatError::Invalid(error), .. } => {
                Self::Domain(error)
            }
            unavailable @ CatalogError::Unavailable { .. } => {
                Self::Configuration(unavailable.to_string())
            }
            other => Self::Persistence(other.to_string()),
        }
    }
}
