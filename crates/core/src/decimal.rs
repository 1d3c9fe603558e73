//! Serde adapters that keep `Decimal` values as plain numbers in JSON and TOML.
//!
//! `rust_decimal` serializes to strings by default; the catalog file format and the
//! quote input files carry prices and rates as numbers. Floats are converted through
//! their shortest round-trip text form so `19.99` reads back as exactly `19.99`.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serializer};

pub mod number {
    use super::*;

    pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.fract().is_zero() {
            if let Some(whole) = value.to_i64() {
                return serializer.serialize_i64(whole);
            }
        }

        let float = f64::from_str(&value.normalize().to_string()).map_err(|_| {
            serde::ser::Error::custom(format!("decimal `{value}` is not representable as a number"))
        })?;
        serializer.serialize_f64(float)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DecimalNumberVisitor)
    }
}

pub mod option_number {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapped(#[serde(with = "super::number")] Decimal);

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<Wrapped>::deserialize(deserializer).map(|value| value.map(|Wrapped(inner)| inner))
    }
}

/// Whether `value` reads back unchanged after being written by [`number::serialize`].
pub fn survives_number_round_trip(value: Decimal) -> bool {
    if value.fract().is_zero() && value.to_i64().is_some() {
        return true;
    }
    f64::from_str(&value.normalize().to_string())
        .ok()
        .and_then(from_f64)
        .is_some_and(|restored| restored == value)
}

/// Parses a decimal from float text, rejecting non-finite values.
pub fn from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string()).ok()
}

struct DecimalNumberVisitor;

impl<'de> Visitor<'de> for DecimalNumberVisitor {
    type Value = Decimal;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a decimal number")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Decimal, E> {
        Ok(Decimal::from(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Decimal, E> {
        Ok(Decimal::from(value))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Decimal, E> {
        from_f64(value).ok_or_else(|| E::invalid_value(de::Unexpected::Float(value), &self))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Decimal, E> {
        Decimal::from_str(value.trim())
            .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
    }
}
