use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal;
use crate::errors::DomainError;

/// Price codes the pricing rules look up. A catalog may omit any of them.
pub mod codes {
    pub const BASE_SERVER: &str = "base_server";
    pub const BASE_WORKSTATION: &str = "base_ws";
    pub const SERVER_BACKUP: &str = "bkup_server";
    pub const WORKSTATION_BACKUP: &str = "bkup_ws";
    pub const EMAIL_SECURITY: &str = "email_sec";
    pub const HUNTRESS: &str = "huntress";
    pub const WEBROOT: &str = "webroot";
    pub const CAMERA: &str = "camera";
    pub const NVR_8: &str = "nvr_8";
    pub const NVR_16: &str = "nvr_16";
    pub const NVR_32: &str = "nvr_32";
    pub const NVR_64: &str = "nvr_64";

    pub const RECOGNIZED: [&str; 12] = [
        BASE_SERVER,
        BASE_WORKSTATION,
        SERVER_BACKUP,
        WORKSTATION_BACKUP,
        EMAIL_SECURITY,
        HUNTRESS,
        WEBROOT,
        CAMERA,
        NVR_8,
        NVR_16,
        NVR_32,
        NVR_64,
    ];
}

/// Largest accepted unit price. Keeps every `u32` quantity times every rule line well
/// inside `Decimal` range, so totals never saturate.
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceCode(pub String);

impl ServiceCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServiceCode {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl PartialEq<str> for ServiceCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    pub code: ServiceCode,
    pub name: String,
    #[serde(with = "crate::decimal::number")]
    pub unit_price: Decimal,
}

impl ServiceEntry {
    pub fn new(code: impl Into<String>, name: impl Into<String>, unit_price: Decimal) -> Self {
        Self { code: ServiceCode(code.into()), name: name.into(), unit_price }
    }

    pub fn validate(&self, index: usize) -> Result<(), DomainError> {
        if self.code.as_str().trim().is_empty() {
            return Err(DomainError::EmptyServiceCode { index });
        }
        if self.unit_price < Decimal::ZERO {
            return Err(DomainError::NegativeUnitPrice {
                code: self.code.0.clone(),
                price: self.unit_price,
            });
        }
        if self.unit_price > MAX_UNIT_PRICE {
            return Err(DomainError::UnitPriceTooLarge {
                code: self.code.0.clone(),
                price: self.unit_price,
                max: MAX_UNIT_PRICE,
            });
        }
        if !decimal::survives_number_round_trip(self.unit_price) {
            return Err(DomainError::UnitPriceTooPrecise {
                code: self.code.0.clone(),
                price: self.unit_price,
            });
        }
        Ok(())
    }
}
