// ledger-primitives/src/amount.rs

use crate::{PrimitivesError, PrimitivesResult};
use num_bigint::BigUint;
use num_traits::Zero;
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// Decimal places of a whole token (1 token = 10^18 base units)
pub const DEFAULT_DECIMALS: u32 = 18;

/// Basis points in 100%
pub const MAX_BPS: u16 = 10_000;

/// Token amount in base units (using BigUint for arbitrary precision)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(BigUint);

impl Amount {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn from_u64(value: u64) -> Self {
        Self(BigUint::from(value))
    }

    pub fn from_u128(value: u128) -> Self {
        Self(BigUint::from(value))
    }

    /// Whole tokens at the default 18 decimals
    pub fn from_tokens(tokens: u64) -> Self {
        Self(BigUint::from(tokens) * pow10(DEFAULT_DECIMALS))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        if self.0 < other.0 {
            None
        } else {
            Some(Amount(&self.0 - &other.0))
        }
    }

    pub fn saturating_sub(&self, other: &Amount) -> Amount {
        self.checked_sub(other).unwrap_or_else(Amount::zero)
    }

    /// `floor(self * bps / 10_000)`
    ///
    /// Truncates toward zero. A fee computed this way never exceeds the amount as long as
    /// `bps <= MAX_BPS`.
    pub fn bps_share(&self, bps: u16) -> Amount {
        if bps == 0 || self.is_zero() {
            return Amount::zero();
        }
        Amount(&self.0 * BigUint::from(bps) / BigUint::from(MAX_BPS))
    }

    /// Convert a token-denominated value into base units
    ///
    /// Rejects negative values and values with more fractional digits than `decimals`.
    pub fn from_decimal(value: Decimal, decimals: u32) -> PrimitivesResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(PrimitivesError::InvalidAmount(format!("negative amount {}", value)));
        }

        let normalized = value.normalize();
        let scale = normalized.scale();
        if scale > decimals {
            return Err(PrimitivesError::InvalidAmount(format!(
                "{} has more than {} decimal places",
                value, decimals
            )));
        }

        let mantissa = normalized.mantissa().unsigned_abs();
        Ok(Self(BigUint::from(mantissa) * pow10(decimals - scale)))
    }

    /// Parse a token-denominated string such as `"39.96"`
    pub fn parse_tokens(s: &str, decimals: u32) -> PrimitivesResult<Self> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| PrimitivesError::InvalidAmount(format!("{}: {}", s, e)))?;
        Self::from_decimal(value, decimals)
    }

    /// Render as whole tokens without trailing zeros, e.g. `39.96`
    pub fn to_token_string(&self, decimals: u32) -> String {
        let unit = pow10(decimals);
        let whole = &self.0 / &unit;
        let frac = &self.0 % &unit;
        if frac.is_zero() {
            return whole.to_string();
        }

        let digits = frac.to_string();
        let padded = format!("{}{}", "0".repeat(decimals as usize - digits.len()), digits);
        format!("{}.{}", whole, padded.trim_end_matches('0'))
    }
}

fn pow10(exp: u32) -> BigUint {
    BigUint::from(10u64).pow(exp)
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl FromStr for Amount {
    type Err = PrimitivesError;

    /// Parse base units written as decimal digits
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().replace('_', "");
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PrimitivesError::InvalidAmount(s));
        }
        BigUint::from_str(&s)
            .map(Self)
            .map_err(|e| PrimitivesError::InvalidAmount(e.to_string()))
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, other: Amount) -> Amount {
        Amount(self.0 + other.0)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        Amount(iter.fold(BigUint::zero(), |acc, a| acc + &a.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Decimal strings: JSON numbers cannot carry 10^23-sized values.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a u64 integer or a decimal string of base units")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        Amount::from_str(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount::from_u64(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        u64::try_from(v)
            .map(Amount::from_u64)
            .map_err(|_| E::custom(format!("negative amount {}", v)))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
        Ok(Amount::from_u128(v))
    }

    // serde_json hands integers above u64::MAX over as floats
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        Err(E::custom(format!(
            "amount {} is not a u64 integer, write it as a decimal string",
            v
        )))
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(AmountVisitor)
        } else {
            deserializer.deserialize_str(AmountVisitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_amount_arithmetic() {
        let a = Amount::from_u64(100);
        let b = Amount::from_u64(50);

        let sum = a + b.clone();
        assert_eq!(sum, Amount::from_u64(150));

        let diff = sum.checked_sub(&b).unwrap();
        assert_eq!(diff, Amount::from_u64(100));
    }

    #[test]
    fn test_amount_underflow() {
        let a = Amount::from_u64(50);
        let b = Amount::from_u64(100);

        assert!(a.checked_sub(&b).is_none());
        assert_eq!(a.saturating_sub(&b), Amount::zero());
    }

    #[test]
    fn test_bps_share_truncates() {
        // 0.1% of 1000 = 1
        assert_eq!(Amount::from_u64(1000).bps_share(10), Amount::from_u64(1));
        // 0.1% of 999 = 0.999 -> 0
        assert_eq!(Amount::from_u64(999).bps_share(10), Amount::zero());
        assert_eq!(Amount::from_u64(12345).bps_share(MAX_BPS), Amount::from_u64(12345));
        assert_eq!(Amount::from_u64(12345).bps_share(0), Amount::zero());
    }

    #[test]
    fn test_bps_share_large_values() {
        // 0.1% of 40 tokens = 0.04 tokens
        let fee = Amount::from_tokens(40).bps_share(10);
        assert_eq!(fee, Amount::from_u128(40_000_000_000_000_000));
    }

    #[test]
    fn test_from_tokens() {
        assert_eq!(
            Amount::from_tokens(100_000),
            "100000000000000000000000".parse::<Amount>().unwrap()
        );
    }

    #[test]
    fn test_parse_base_units() {
        assert_eq!("1_000".parse::<Amount>().unwrap(), Amount::from_u64(1000));
        assert!("-5".parse::<Amount>().is_err());
        assert!("1.5".parse::<Amount>().is_err());
        assert!("".parse::<Amount>().is_err());
    }

    #[test]
    fn test_token_decimal_conversion() {
        let amount = Amount::parse_tokens("39.96", DEFAULT_DECIMALS).unwrap();
        assert_eq!(amount, Amount::from_u128(39_960_000_000_000_000_000));
        assert_eq!(
            Amount::from_decimal(Decimal::from_str("39.96").unwrap(), DEFAULT_DECIMALS).unwrap(),
            amount
        );
        assert_eq!(amount.to_token_string(DEFAULT_DECIMALS), "39.96");
    }

    #[test]
    fn test_token_string_whole_and_tiny() {
        assert_eq!(Amount::from_tokens(7).to_token_string(DEFAULT_DECIMALS), "7");
        assert_eq!(Amount::from_u64(1).to_token_string(DEFAULT_DECIMALS), "0.000000000000000001");
        assert_eq!(Amount::zero().to_token_string(DEFAULT_DECIMALS), "0");
    }

    #[test]
    fn test_from_decimal_rejects_excess_precision() {
        assert!(Amount::parse_tokens("0.001", 2).is_err());
        assert!(Amount::parse_tokens("-1", DEFAULT_DECIMALS).is_err());
        assert_eq!(Amount::parse_tokens("0.010", 2).unwrap(), Amount::from_u64(1));
    }

    #[test]
    fn test_amount_serde() {
        let amount = Amount::from_tokens(3);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"3000000000000000000\"");

        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);

        let from_number: Amount = serde_json::from_str("1000").unwrap();
        assert_eq!(from_number, Amount::from_u64(1000));
        assert!(serde_json::from_str::<Amount>("-1").is_err());
    }

    #[test]
    fn test_amount_above_u64_needs_string() {
        // 40 tokens at 18 decimals
        let err = serde_json::from_str::<Amount>("40000000000000000000").unwrap_err();
        assert!(err.to_string().contains("decimal string"));

        let amount: Amount = serde_json::from_str("\"40000000000000000000\"").unwrap();
        assert_eq!(amount, Amount::from_tokens(40));
    }

    #[test]
    fn test_amount_sum() {
        let values = vec![Amount::from_u64(1), Amount::from_u64(2), Amount::from_u64(3)];
        let total: Amount = values.iter().sum();
        assert_eq!(total, Amount::from_u64(6));
    }

    proptest! {
        #[test]
        fn prop_bps_share_matches_integer_floor(amount in any::<u64>(), bps in 0u16..=MAX_BPS) {
            let expected = (amount as u128 * bps as u128) / MAX_BPS as u128;
            prop_assert_eq!(Amount::from_u64(amount).bps_share(bps), Amount::from_u128(expected));
        }

        #[test]
        fn prop_bps_share_never_exceeds_amount(amount in any::<u128>(), bps in 0u16..=MAX_BPS) {
            let amount = Amount::from_u128(amount);
            prop_assert!(amount.bps_share(bps) <= amount);
        }
    }
}
