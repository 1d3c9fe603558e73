use rust_decimal::{Decimal, RoundingStrategy};

/// Formats `amount` with two decimals, thousands separators, and a leading symbol.
///
/// Half-cent amounts round away from zero. Negative amounts keep the sign ahead of the
/// symbol (`-$4.50`).
pub fn format_money(amount: Decimal, currency_symbol: &str) -> String {
    let mut cents = round_to_cents(amount);
    let negative = cents.is_sign_negative() && !cents.is_zero();
    cents.set_sign_positive(true);

    let text = cents.to_string();
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let sign = if negative { "-" } else { "" };

    format!("{sign}{currency_symbol}{}.{fraction}", group_thousands(whole))
}

/// Renders a fractional rate as a percentage without trailing zeros (`0.0825` is `8.25%`).
pub fn format_percent(rate: Decimal) -> String {
    let percent = (rate * Decimal::ONE_HUNDRED).normalize();
    format!("{percent}%")
}

pub fn round_to_cents(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
