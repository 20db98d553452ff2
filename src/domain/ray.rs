//! 256-bit fixed-point helpers for on-chain wad/ray integers.

use primitive_types::U256;

use super::decimal::{pow10, ArithmeticError, Decimal};

/// Implied decimals of a wad (token amounts).
pub const WAD_DECIMALS: u32 = 18;

/// Implied decimals of a ray (rates, prices, ratios).
pub const RAY_DECIMALS: u32 = 27;

/// Fractional digits a compounded rate is rendered with.
pub const RATE_DISPLAY_DECIMALS: u32 = 18;

/// Number of fractional digits carried through integer powers.
///
/// Squaring a value near one at `digits` precision needs `2 * digits` decimal
/// digits of headroom, which caps the setting at 38 for a 256-bit word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingPrecision(u32);

impl WorkingPrecision {
    pub const MIN: u32 = 18;
    pub const MAX: u32 = 38;

    pub fn new(digits: u32) -> Result<Self, ArithmeticError> {
        if !(Self::MIN..=Self::MAX).contains(&digits) {
            return Err(ArithmeticError::InvalidPrecision(digits));
        }
        Ok(Self(digits))
    }

    pub fn digits(&self) -> u32 {
        self.0
    }

    /// The fixed-point one at this precision.
    pub fn unit(&self) -> U256 {
        U256::exp10(self.0 as usize)
    }
}

impl Default for WorkingPrecision {
    fn default() -> Self {
        Self(RAY_DECIMALS)
    }
}

/// `base^exponent` for a fixed-point `base` with one equal to `unit`.
///
/// Exponentiation by squaring with half-up rounding after every product.
pub fn rpow(base: U256, exponent: u64, unit: U256) -> Result<U256, ArithmeticError> {
    if unit.is_zero() {
        return Err(ArithmeticError::DivisionByZero);
    }
    let half = unit / U256::from(2u8);
    let mul = |a: U256, b: U256| -> Result<U256, ArithmeticError> {
        let product = a
            .checked_mul(b)
            .and_then(|p| p.checked_add(half))
            .ok_or(ArithmeticError::Overflow)?;
        Ok(product / unit)
    };

    let mut x = base;
    let mut n = exponent;
    let mut z = if n % 2 == 1 { base } else { unit };
    n /= 2;
    while n != 0 {
        x = mul(x, x)?;
        if n % 2 == 1 {
            z = mul(z, x)?;
        }
        n /= 2;
    }
    Ok(z)
}

/// Rescale a ray integer to `precision` fractional digits, flooring when shrinking.
pub fn ray_to_precision(ray: U256, precision: WorkingPrecision) -> Result<U256, ArithmeticError> {
    let digits = precision.digits();
    if digits >= RAY_DECIMALS {
        ray.checked_mul(pow10(digits - RAY_DECIMALS)?)
            .ok_or(ArithmeticError::Overflow)
    } else {
        Ok(ray / pow10(RAY_DECIMALS - digits)?)
    }
}

/// `(rate_per_period / 1e27)^periods - 1`, rounded to 18 fractional digits.
pub fn compound_rate(
    rate_per_period: U256,
    periods: u64,
    precision: WorkingPrecision,
) -> Result<Decimal, ArithmeticError> {
    let unit = precision.unit();
    let base = ray_to_precision(rate_per_period, precision)?;
    let grown = rpow(base, periods, unit)?;
    let rate = if grown >= unit {
        Decimal::from_scaled(grown - unit, precision.digits())?
    } else {
        -Decimal::from_scaled(unit - grown, precision.digits())?
    };
    Ok(rate.round_dp(RATE_DISPLAY_DECIMALS))
}
