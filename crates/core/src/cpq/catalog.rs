use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::service::{codes, ServiceEntry};
use crate::errors::DomainError;

#[derive(Debug, Error)]
pub enum CatalogFormatError {
    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] DomainError),
}

/// Ordered price list. Codes are expected to be unique but lookups are first-match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    services: Vec<ServiceEntry>,
}

impl Catalog {
    pub fn new(services: Vec<ServiceEntry>) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &[ServiceEntry] {
        &self.services
    }

    pub fn into_services(self) -> Vec<ServiceEntry> {
        self.services
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn find(&self, code: &str) -> Option<&ServiceEntry> {
        self.services.iter().find(|entry| entry.code == *code)
    }

    /// Unit price of the first entry with `code`, or zero when the code is absent.
    pub fn price_of(&self, code: &str) -> Decimal {
        self.find(code).map(|entry| entry.unit_price).unwrap_or(Decimal::ZERO)
    }

    /// Updates the first entry with `code`; later duplicates are left untouched.
    pub fn set_price(&mut self, code: &str, unit_price: Decimal) -> Result<(), DomainError> {
        let index = self
            .services
            .iter()
            .position(|entry| entry.code == *code)
            .ok_or_else(|| DomainError::UnknownServiceCode(code.to_owned()))?;

        let mut updated = self.services[index].clone();
        updated.unit_price = unit_price;
        updated.validate(index)?;
        self.services[index] = updated;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.services.iter().enumerate().try_for_each(|(index, entry)| entry.validate(index))
    }

    /// Recognized price codes with no entry in this catalog. Those lines price at zero.
    pub fn missing_codes(&self) -> Vec<&'static str> {
        codes::RECOGNIZED.into_iter().filter(|code| self.find(code).is_none()).collect()
    }

    /// Codes that appear more than once, in first-seen order.
    pub fn duplicate_codes(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        self.services
            .iter()
            .map(|entry| entry.code.as_str())
            .filter(|code| !seen.insert(*code) && reported.insert(*code))
            .collect()
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogFormatError> {
        let catalog: Self = serde_json::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn to_json(&self) -> Result<String, CatalogFormatError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Pretty-printed JSON with keys sorted, for display and hand editing.
    pub fn pretty_json(&self) -> String {
        serde_json::to_value(self)
            .and_then(|value| serde_json::to_string_pretty(&value))
            .unwrap_or_else(|_| "{}".to_owned())
    }
}

pub fn price_of(catalog: &Catalog, code: &str) -> Decimal {
    catalog.price_of(code)
}
