use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::service::codes;
use crate::errors::DomainError;

/// Network video recorder size. At most one NVR is priced per quote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NvrTier {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "8-port")]
    Port8,
    #[serde(rename = "16-port")]
    Port16,
    #[serde(rename = "32-port")]
    Port32,
    #[serde(rename = "64-port")]
    Port64,
}

impl NvrTier {
    pub const ALL: [NvrTier; 5] =
        [NvrTier::None, NvrTier::Port8, NvrTier::Port16, NvrTier::Port32, NvrTier::Port64];

    pub fn price_code(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Port8 => Some(codes::NVR_8),
            Self::Port16 => Some(codes::NVR_16),
            Self::Port32 => Some(codes::NVR_32),
            Self::Port64 => Some(codes::NVR_64),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Port8 => "8 Port",
            Self::Port16 => "16 Port",
            Self::Port32 => "32 Port",
            Self::Port64 => "64 Port",
        }
    }

    pub fn line_label(self) -> &'static str {
        match self {
            Self::None => "NVR",
            Self::Port8 => "NVR (8 Port)",
            Self::Port16 => "NVR (16 Port)",
            Self::Port32 => "NVR (32 Port)",
            Self::Port64 => "NVR (64 Port)",
        }
    }

    pub fn is_selected(self) -> bool {
        self != Self::None
    }
}

impl fmt::Display for NvrTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NvrTier {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        match normalized.as_str() {
            "none" | "0" | "" => Ok(Self::None),
            "8" | "8-port" => Ok(Self::Port8),
            "16" | "16-port" => Ok(Self::Port16),
            "32" | "32-port" => Ok(Self::Port32),
            "64" | "64-port" => Ok(Self::Port64),
            other => Err(DomainError::InvariantViolation(format!(
                "unsupported nvr tier `{other}` (expected none|8|16|32|64)"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Branding {
    pub company_name: String,
    pub company_address: String,
    /// Encoded image bytes, resolved by the caller before rendering.
    #[serde(skip)]
    pub logo: Option<Vec<u8>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Customer {
    pub name: String,
    pub address: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteMetadata {
    pub quote_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Fraction in `0..=1`, so 8.25% is `0.0825`.
    #[serde(with = "crate::decimal::number")]
    pub tax_rate: Decimal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceCounts {
    pub servers: u32,
    pub workstations: u32,
    pub email_accounts: u32,
    pub cameras: u32,
}

impl DeviceCounts {
    /// Endpoints covered by the per-device security suites.
    pub fn endpoints(&self) -> u32 {
        self.servers.saturating_add(self.workstations)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddOns {
    pub server_backup: bool,
    pub workstation_backup: bool,
    pub email_security: bool,
    pub huntress: bool,
    pub webroot: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteState {
    pub branding: Branding,
    pub customer: Customer,
    pub metadata: QuoteMetadata,
    pub devices: DeviceCounts,
    pub nvr_tier: NvrTier,
    pub add_ons: AddOns,
    pub terms: String,
}

impl QuoteState {
    pub fn validate(&self) -> Result<(), DomainError> {
        let rate = self.metadata.tax_rate;
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(DomainError::TaxRateOutOfRange(rate));
        }

        if let (Some(issued), Some(due)) = (self.metadata.issue_date, self.metadata.due_date) {
            if due < issued {
                return Err(DomainError::InvariantViolation(format!(
                    "due date {due} is before issue date {issued}"
                )));
            }
        }

        Ok(())
    }
}

/// Converts an operator-entered percentage (`8.25`) into the stored fraction (`0.0825`).
pub fn tax_rate_from_percent(percent: Decimal) -> Decimal {
    percent / Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{tax_rate_from_percent, NvrTier, QuoteState};
    use crate::errors::DomainError;

    #[test]
    fn default_state_is_valid_and_empty() {
        let state = QuoteState::default();

        assert!(state.validate().is_ok());
        assert_eq!(state.nvr_tier, NvrTier::None);
        assert_eq!(state.devices.endpoints(), 0);
        assert!(state.branding.logo.is_none());
    }

    #[test]
    fn tax_rate_above_one_is_rejected() {
        let mut state = QuoteState::default();
        state.metadata.tax_rate = Decimal::new(825, 2);

        assert_eq!(state.validate(), Err(DomainError::TaxRateOutOfRange(Decimal::new(825, 2))));
    }

    #[test]
    fn due_date_before_issue_date_is_rejected() {
        let mut state = QuoteState::default();
        state.metadata.issue_date = NaiveDate::from_ymd_opt(2026, 3, 10);
        state.metadata.due_date = NaiveDate::from_ymd_opt(2026, 3, 1);

        assert!(matches!(state.validate(), Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn nvr_tiers_parse_from_operator_input() {
        assert_eq!("16".parse::<NvrTier>(), Ok(NvrTier::Port16));
        assert_eq!("64 Port".parse::<NvrTier>(), Ok(NvrTier::Port64));
        assert_eq!("none".parse::<NvrTier>(), Ok(NvrTier::None));
        assert!("12".parse::<NvrTier>().is_err());
    }

    #[test]
    fn only_selected_tiers_carry_a_price_code() {
        let priced: Vec<_> = NvrTier::ALL.iter().filter_map(|tier| tier.price_code()).collect();
        assert_eq!(priced, vec!["nvr_8", "nvr_16", "nvr_32", "nvr_64"]);
    }

    #[test]
    fn percent_input_becomes_fraction() {
        assert_eq!(tax_rate_from_percent(Decimal::new(825, 2)), Decimal::new(825, 4));
    }

    #[test]
    fn toml_input_fills_missing_sections_with_defaults() {
        let state: QuoteState = toml::from_str(
            r#"
nvr_tier = "16-port"

[devices]
servers = 2

[metadata]
tax_rate = 0.1
issue_date = "2026-10-16"
"#,
        )
        .expect("parse quote state");

        assert_eq!(state.devices.servers, 2);
        assert_eq!(state.devices.workstations, 0);
        assert_eq!(state.nvr_tier, NvrTier::Port16);
        assert_eq!(state.metadata.tax_rate, Decimal::new(1, 1));
        assert_eq!(state.metadata.issue_date, NaiveDate::from_ymd_opt(2026, 10, 16));
        assert!(!state.add_ons.server_backup);
    }
}
