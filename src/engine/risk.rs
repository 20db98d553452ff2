//! Collateralization risk metrics shared by positions and strategy previews.

use crate::domain::{ArithmeticError, Decimal};
use rust_decimal::Decimal as RustDecimal;

/// Status reported when collateral is gone but debt remains.
pub fn max_risk_status() -> Decimal {
    Decimal::new(RustDecimal::new(11, 1))
}

/// True when there is debt and no collateral backing it.
pub fn is_max_risk(collateral: Decimal, debt: Decimal) -> bool {
    collateral.is_zero() && !debt.is_zero()
}

/// Debt over collateral value.
///
/// No exposure (zero collateral and zero debt) reports zero; debt without
/// collateral reports [`max_risk_status`].
pub fn status(collateral: Decimal, debt: Decimal, price: Decimal) -> Result<Decimal, ArithmeticError> {
    if is_max_risk(collateral, debt) {
        return Ok(max_risk_status());
    }
    if collateral.is_zero() {
        return Ok(Decimal::zero());
    }
    debt.checked_div(collateral.checked_mul(price)?)
}

/// Collateral price at which the position becomes liquidatable.
///
/// `liquidation_ratio` is the debt-to-collateral factor (the inverse of the
/// protocol's collateralization ratio).
pub fn liquidation_price(
    collateral: Decimal,
    debt: Decimal,
    liquidation_ratio: Decimal,
    price: Decimal,
) -> Result<Decimal, ArithmeticError> {
    if is_max_risk(collateral, debt) {
        return price.checked_mul(max_risk_status());
    }
    if collateral.is_zero() {
        return Ok(Decimal::zero());
    }
    let per_unit = debt
        .checked_div(collateral)?
        .checked_div(liquidation_ratio)?;
    Ok(per_unit.max(Decimal::zero()))
}
