//! Lossless decimal numeric type backed by rust_decimal.
//!
//! Display-scale values (token amounts, prices, ratios) live in [`Decimal`].
//! On-chain integers (wad = 1e18, ray = 1e27) stay in `U256` until they are
//! brought down to display scale with [`Decimal::from_scaled`], and go back up
//! with [`Decimal::to_base_units`], which only ever truncates.

use primitive_types::U256;
use rust_decimal::{Decimal as RustDecimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::ray::{rpow, WorkingPrecision};

/// Largest mantissa representable by rust_decimal (2^96 - 1).
const MAX_MANTISSA: u128 = 79_228_162_514_264_337_593_543_950_335;

/// Largest scale representable by rust_decimal.
const MAX_SCALE: u32 = 28;

/// Arithmetic failures. Never coerced into a default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("negative amount cannot be converted to base units")]
    NegativeAmount,
    #[error("working precision must be between 18 and 38 digits, got {0}")]
    InvalidPrecision(u32),
}

/// Lossless decimal numeric type for financial calculations.
///
/// Backed by rust_decimal to avoid floating-point drift.
/// Serializes to a canonical JSON string (no exponent, no trailing zeros).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(RustDecimal);

impl Decimal {
    /// Create a Decimal from a RustDecimal.
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s.trim()).map(Decimal)
    }

    /// Format the Decimal as a canonical string (no exponent notation).
    pub fn to_canonical_string(&self) -> String {
        let normalized = self.0.normalize();
        format!("{}", normalized)
    }

    /// Format with exactly `dp` fractional digits, rounding half away from zero.
    pub fn to_fixed(&self, dp: u32) -> String {
        let dp = dp.min(MAX_SCALE);
        let mut rounded = self
            .0
            .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(dp);
        format!("{}", rounded)
    }

    /// Round to `dp` fractional digits, half away from zero.
    pub fn round_dp(&self, dp: u32) -> Self {
        Decimal(
            self.0
                .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Get the underlying RustDecimal.
    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    /// The multiplicative identity (1).
    pub fn one() -> Self {
        Decimal(RustDecimal::ONE)
    }

    /// Returns the value 100.
    pub fn hundred() -> Self {
        Decimal(RustDecimal::ONE_HUNDRED)
    }

    /// Returns true if the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the value is > 0.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Returns true if the value is < 0.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    pub fn max(self, other: Decimal) -> Decimal {
        std::cmp::max(self, other)
    }

    pub fn min(self, other: Decimal) -> Decimal {
        std::cmp::min(self, other)
    }

    pub fn checked_add(self, rhs: Decimal) -> Result<Decimal, ArithmeticError> {
        self.0
            .checked_add(rhs.0)
            .map(Decimal)
            .ok_or(ArithmeticError::Overflow)
    }

    pub fn checked_sub(self, rhs: Decimal) -> Result<Decimal, ArithmeticError> {
        self.0
            .checked_sub(rhs.0)
            .map(Decimal)
            .ok_or(ArithmeticError::Overflow)
    }

    pub fn checked_mul(self, rhs: Decimal) -> Result<Decimal, ArithmeticError> {
        self.0
            .checked_mul(rhs.0)
            .map(Decimal)
            .ok_or(ArithmeticError::Overflow)
    }

    /// Divide, failing on a zero divisor instead of panicking.
    pub fn checked_div(self, rhs: Decimal) -> Result<Decimal, ArithmeticError> {
        if rhs.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        self.0
            .checked_div(rhs.0)
            .map(Decimal)
            .ok_or(ArithmeticError::Overflow)
    }

    /// Raise to an integer power.
    ///
    /// Runs in 256-bit fixed point at the given working precision, so exponents in
    /// the tens of millions keep every digit the result is later rendered with.
    pub fn checked_powu(
        self,
        exponent: u64,
        precision: WorkingPrecision,
    ) -> Result<Decimal, ArithmeticError> {
        let digits = precision.digits();
        let base = self.abs().to_base_units(digits)?;
        let raised = rpow(base, exponent, precision.unit())?;
        let magnitude = Decimal::from_scaled(raised, digits)?;
        if self.is_negative() && exponent % 2 == 1 {
            Ok(-magnitude)
        } else {
            Ok(magnitude)
        }
    }

    /// Bring an on-chain integer with `scale` implied decimals down to display scale.
    ///
    /// Digits that do not fit the 96-bit mantissa are truncated from the right.
    pub fn from_scaled(raw: U256, scale: u32) -> Result<Decimal, ArithmeticError> {
        let max_mantissa = U256::from(MAX_MANTISSA);
        let mut mantissa = raw;
        let mut scale = scale;
        while scale > MAX_SCALE || mantissa > max_mantissa {
            if scale == 0 {
                return Err(ArithmeticError::Overflow);
            }
            mantissa = mantissa / U256::from(10u8);
            scale -= 1;
        }
        let mantissa = i128::try_from(mantissa.as_u128()).map_err(|_| ArithmeticError::Overflow)?;
        RustDecimal::try_from_i128_with_scale(mantissa, scale)
            .map(Decimal)
            .map_err(|_| ArithmeticError::Overflow)
    }

    /// Convert to an on-chain integer with `decimals` implied digits, flooring.
    pub fn to_base_units(&self, decimals: u32) -> Result<U256, ArithmeticError> {
        if self.is_negative() {
            return Err(ArithmeticError::NegativeAmount);
        }
        let mantissa = U256::from(self.0.mantissa().unsigned_abs());
        let scaled = mantissa
            .checked_mul(pow10(decimals)?)
            .ok_or(ArithmeticError::Overflow)?;
        Ok(scaled / pow10(self.0.scale())?)
    }
}

/// 10^n as a U256.
pub fn pow10(n: u32) -> Result<U256, ArithmeticError> {
    if n > 77 {
        return Err(ArithmeticError::Overflow);
    }
    Ok(U256::exp10(n as usize))
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<Decimal> for RustDecimal {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Decimal(RustDecimal::from(value))
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical_string())
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Decimal::from_str_canonical(&s).map_err(serde::de::Error::custom)
    }
}

// Only negation is an operator; it cannot overflow. Every other operation
// goes through the checked forms.
impl std::ops::Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}
