//! Money Model
//!
//! All monetary amounts in this system are non-negative integers in minor
//! units (paise; 100 paise = ₹1). `MinorUnits` is the only type allowed to
//! carry a monetary value past the external boundary. It derives neither
//! `Add`/`Sub` nor a naive `Display` that would tempt string concatenation —
//! only the checked operations below exist. Every value from the outside
//! world passes through `parse`; every value going out passes through
//! `format`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount must not be empty")]
    Empty,
    #[error("amount has invalid format: {0}")]
    InvalidFormat(String),
    #[error("amount must be positive")]
    NotPositive,
    #[error("amount exceeds two decimal places of precision")]
    PrecisionOverflow,
    #[error("amount overflows the minor-unit integer range")]
    Overflow,
    #[error("insufficient funds: required {required}, available {available}")]
    Insufficient { required: i64, available: i64 },
}

/// An amount of money in minor units (paise). The inner value is never
/// negative for an `Account` balance, but subtraction can be asked to
/// underflow-check, so the type itself permits zero and relies on callers
/// (via `checked_sub`) to reject negative results where that matters.
///
/// `Serialize`/`Deserialize` are derived transparently over the inner `i64`
/// for internal persistence only (the idempotency cache round-trips a whole
/// `TransferResult` through Redis as JSON) — the HTTP boundary never relies
/// on this derive, it always goes through `format`/`parse` explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinorUnits(i64);

impl MinorUnits {
    pub const ZERO: MinorUnits = MinorUnits(0);

    /// Construct directly from an already-validated integer, e.g. a value
    /// read back from the database. Not for use on user input — use `parse`.
    pub fn from_i64(v: i64) -> Self {
        MinorUnits(v)
    }

    pub fn get(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: MinorUnits) -> Result<MinorUnits, MoneyError> {
        self.0
            .checked_add(other.0)
            .map(MinorUnits)
            .ok_or(MoneyError::Overflow)
    }

    /// Fails on overflow or on a negative result — money never goes negative.
    pub fn checked_sub(self, other: MinorUnits) -> Result<MinorUnits, MoneyError> {
        let result = self.0.checked_sub(other.0).ok_or(MoneyError::Overflow)?;
        if result < 0 {
            return Err(MoneyError::Insufficient {
                required: other.0,
                available: self.0,
            });
        }
        Ok(MinorUnits(result))
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format(*self).fmt(f)
    }
}

/// Format minor units as a rupee-decimal display string, e.g. `50000` →
/// `"500.00"`.
pub fn format(amount: MinorUnits) -> String {
    let v = amount.0;
    let sign = if v < 0 { "-" } else { "" };
    let abs = v.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Parse a rupee-decimal string (e.g. `"500"`, `"500.00"`, `"500.5"`) into
/// minor units. Mirrors the teacher's `parse_amount` discipline: no
/// scientific notation, no leading/trailing dot, at most two fractional
/// digits, strict digit-only grammar, checked arithmetic throughout so a
/// malformed or oversized string can never silently wrap or truncate.
pub fn parse(input: &str) -> Result<MinorUnits, MoneyError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(MoneyError::Empty);
    }
    if s.starts_with('+') || s.starts_with('-') {
        return Err(MoneyError::InvalidFormat(s.to_string()));
    }
    if s.contains(['e', 'E']) {
        return Err(MoneyError::InvalidFormat(s.to_string()));
    }

    let mut parts = s.splitn(2, '.');
    let integer_part = parts.next().unwrap_or("");
    let fractional_part = parts.next();

    if integer_part.is_empty() {
        return Err(MoneyError::InvalidFormat(s.to_string()));
    }
    if !integer_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MoneyError::InvalidFormat(s.to_string()));
    }

    let fractional_digits = match fractional_part {
        None => String::new(),
        Some(frac) => {
            if frac.is_empty() {
                return Err(MoneyError::InvalidFormat(s.to_string()));
            }
            if frac.contains('.') {
                return Err(MoneyError::InvalidFormat(s.to_string()));
            }
            if !frac.bytes().all(|b| b.is_ascii_digit()) {
                return Err(MoneyError::InvalidFormat(s.to_string()));
            }
            if frac.len() > 2 {
                return Err(MoneyError::PrecisionOverflow);
            }
            frac.to_string()
        }
    };

    let padded_fraction = match fractional_digits.len() {
        0 => "00".to_string(),
        1 => format!("{fractional_digits}0"),
        2 => fractional_digits,
        _ => return Err(MoneyError::PrecisionOverflow),
    };

    let rupees: i64 = integer_part.parse().map_err(|_| MoneyError::Overflow)?;
    let paise: i64 = padded_fraction.parse().map_err(|_| MoneyError::Overflow)?;

    let minor = rupees
        .checked_mul(100)
        .and_then(|r| r.checked_add(paise))
        .ok_or(MoneyError::Overflow)?;

    if minor <= 0 {
        return Err(MoneyError::NotPositive);
    }

    Ok(MinorUnits(minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_rupee_amounts() {
        assert_eq!(parse("500").unwrap().get(), 50_000);
        assert_eq!(parse("1").unwrap().get(), 100);
    }

    #[test]
    fn parses_fractional_amounts() {
        assert_eq!(parse("500.00").unwrap().get(), 50_000);
        assert_eq!(parse("500.5").unwrap().get(), 50_050);
        assert_eq!(parse("500.55").unwrap().get(), 50_055);
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse(""), Err(MoneyError::Empty));
        assert!(parse("+500").is_err());
        assert!(parse("-500").is_err());
        assert!(parse(".5").is_err());
        assert!(parse("5.").is_err());
        assert!(parse("5.5.5").is_err());
        assert!(parse("5e10").is_err());
        assert!(parse("abc").is_err());
    }

    #[test]
    fn rejects_precision_overflow() {
        assert_eq!(parse("500.555"), Err(MoneyError::PrecisionOverflow));
    }

    #[test]
    fn rejects_zero_and_negative() {
        assert_eq!(parse("0"), Err(MoneyError::NotPositive));
        assert_eq!(parse("0.00"), Err(MoneyError::NotPositive));
    }

    #[test]
    fn format_roundtrips_through_parse() {
        for s in ["1.00", "500.00", "999999.99", "100.50"] {
            let minor = parse(s).unwrap();
            assert_eq!(format(minor), s);
        }
    }

    #[test]
    fn checked_sub_rejects_negative_result() {
        let a = MinorUnits::from_i64(100);
        let b = MinorUnits::from_i64(200);
        assert!(matches!(
            a.checked_sub(b),
            Err(MoneyError::Insufficient {
                required: 200,
                available: 100
            })
        ));
    }

    #[test]
    fn checked_add_detects_overflow() {
        let a = MinorUnits::from_i64(i64::MAX);
        let b = MinorUnits::from_i64(1);
        assert_eq!(a.checked_add(b), Err(MoneyError::Overflow));
    }

    #[test]
    fn checked_sub_exact_balance_yields_zero() {
        let a = MinorUnits::from_i64(50_000);
        let b = MinorUnits::from_i64(50_000);
        assert_eq!(a.checked_sub(b).unwrap(), MinorUnits::ZERO);
    }

    #[test]
    fn serde_round_trips_as_plain_integer() {
        let a = MinorUnits::from_i64(50_000);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "50000");
        let back: MinorUnits = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
