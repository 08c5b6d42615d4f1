//! Currency codes and minor-unit conversion.
//!
//! The gateway represents amounts as integers in the currency's smallest
//! unit (cents for USD, whole yen for JPY). The ledger stores decimal
//! major-unit amounts.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::PlatformError;

/// Currencies the gateway treats as having no minor unit.
const ZERO_DECIMAL_CURRENCIES: [&str; 16] = [
    "BIF", "CLP", "DJF", "GNF", "JPY", "KMF", "KRW", "MGA", "PYG", "RWF", "UGX", "VND", "VUV",
    "XAF", "XOF", "XPF",
];

/// Currencies the gateway settles in thousandths. The ledger keeps two
/// decimal places, so these are refused outright.
const THREE_DECIMAL_CURRENCIES: [&str; 5] = ["BHD", "JOD", "KWD", "OMR", "TND"];

/// Normalizes an ISO-4217 code to upper case.
///
/// # Errors
///
/// Returns [`PlatformError::Validation`] unless `code` is exactly three
/// ASCII letters, or if the currency uses a three-decimal minor unit.
pub fn normalize_currency(code: &str) -> Result<String, PlatformError> {
    let code = code.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(PlatformError::Validation(format!(
            "invalid currency code: {code:?}"
        )));
    }
    let upper = code.to_ascii_uppercase();
    if THREE_DECIMAL_CURRENCIES.contains(&upper.as_str()) {
        return Err(PlatformError::Validation(format!(
            "currency {upper} is not supported"
        )));
    }
    Ok(upper)
}

/// Number of decimal places in the currency's minor unit.
#[must_use]
pub fn minor_unit_exponent(currency: &str) -> u32 {
    let upper = currency.to_ascii_uppercase();
    if ZERO_DECIMAL_CURRENCIES.contains(&upper.as_str()) {
        0
    } else {
        2
    }
}

/// Converts a positive major-unit amount into gateway minor units.
///
/// # Errors
///
/// Returns [`PlatformError::Validation`] if the amount is not strictly
/// positive, carries more precision than the currency allows, or does not
/// fit in an `i64`.
pub fn to_minor_units(amount: Decimal, currency: &str) -> Result<i64, PlatformError> {
    if amount <= Decimal::ZERO {
        return Err(PlatformError::Validation(
            "amount must be greater than 0".to_string(),
        ));
    }
    let exponent = minor_unit_exponent(currency);
    let scaled = amount
        .checked_mul(Decimal::from(10_i64.pow(exponent)))
        .ok_or_else(|| PlatformError::Validation(format!("amount {amount} is too large")))?;
    if !scaled.fract().is_zero() {
        return Err(PlatformError::Validation(format!(
            "amount {amount} has more than {exponent} decimal places for {currency}"
        )));
    }
    scaled
        .to_i64()
        .ok_or_else(|| PlatformError::Validation(format!("amount {amount} is too large")))
}

/// Converts gateway minor units into a major-unit decimal amount.
#[must_use]
pub fn from_minor_units(minor: i64, currency: &str) -> Decimal {
    Decimal::new(minor, minor_unit_exponent(currency))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        let Ok(d) = Decimal::from_str(s) else {
            panic!("bad decimal literal {s}");
        };
        d
    }

    #[test]
    fn usd_amounts_convert_to_cents() {
        assert!(matches!(to_minor_units(dec("25.50"), "usd"), Ok(2550)));
        assert_eq!(from_minor_units(2550, "USD"), dec("25.50"));
    }

    #[test]
    fn zero_decimal_currency_keeps_whole_units() {
        assert!(matches!(to_minor_units(dec("500"), "JPY"), Ok(500)));
        assert_eq!(from_minor_units(500, "jpy"), dec("500"));
        assert!(to_minor_units(dec("500.5"), "JPY").is_err());
    }

    #[test]
    fn sub_cent_precision_is_rejected() {
        let result = to_minor_units(dec("10.005"), "USD");
        assert!(matches!(result, Err(PlatformError::Validation(_))));
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        assert!(to_minor_units(Decimal::ZERO, "USD").is_err());
        assert!(to_minor_units(dec("-1"), "USD").is_err());
    }

    #[test]
    fn currency_codes_are_normalized() {
        assert!(matches!(normalize_currency(" eur ").as_deref(), Ok("EUR")));
        assert!(normalize_currency("euro").is_err());
        assert!(normalize_currency("u$d").is_err());
    }

    #[test]
    fn three_decimal_currencies_are_refused() {
        for code in ["KWD", "bhd", " jod ", "OMR", "TND"] {
            assert!(
                matches!(normalize_currency(code), Err(PlatformError::Validation(_))),
                "{code} should be refused"
            );
        }
        assert!(matches!(normalize_currency("kwx").as_deref(), Ok("KWX")));
    }
}
