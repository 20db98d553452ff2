//! Validators and helpers shared by the bundled strategies.

use super::{FieldScope, InputField, ProtocolParams, StrategyField, ValueReading};
use crate::compile::CompileError;
use crate::domain::{ArithmeticError, Decimal, PositionType, Token};
use crate::engine::formatting::{format_usd, format_usd_max};

fn validate_amount(input: &InputField) -> Result<Decimal, String> {
    if input.token.is_none() {
        return Err(format!("{} token is required", input.name));
    }
    match input.amount() {
        None => Err(format!("{} amount is required", input.name)),
        Some(amount) if amount.is_negative() => {
            Err(format!("{} amount cannot be negative", input.name))
        }
        Some(amount) => Ok(amount),
    }
}

/// Token bound, amount present, and covered by the account balance.
pub fn validate_deposit(input: &InputField, scope: &FieldScope<'_>) -> Option<String> {
    let amount = match validate_amount(input) {
        Ok(amount) => amount,
        Err(message) => return Some(message),
    };
    let token = input.token.as_ref()?;
    let balance = scope.context.balance(&token.key);
    if balance < amount {
        return Some(format!(
            "Your amount exceeds your maximum limit of {} {}",
            balance.to_fixed(2),
            token.symbol
        ));
    }
    None
}

/// Token bound and amount present.
pub fn validate_borrow(input: &InputField, _scope: &FieldScope<'_>) -> Option<String> {
    validate_amount(input).err()
}

/// Borrowed amount plus the protocol's borrow fee.
pub fn debt_with_fee(borrow: Decimal, params: &ProtocolParams) -> Result<Decimal, ArithmeticError> {
    borrow.checked_add(borrow.checked_mul(params.borrow_fee)?)
}

pub fn min_debt_message(params: &ProtocolParams, symbol: &str) -> String {
    format!(
        "Minimum total debt requirement is {} {}",
        params.min_debt, symbol
    )
}

/// Whether adding `new_debt` would push the type over its ceiling.
pub fn debt_ceiling_message(
    position_type: &PositionType,
    new_debt: Decimal,
) -> Result<Option<String>, ArithmeticError> {
    let projected = position_type.total_debt.checked_add(new_debt)?;
    if !new_debt.is_zero() && projected > position_type.debt_ceiling {
        return Ok(Some(format!(
            "Debt ceiling reached for {}",
            position_type.type_id
        )));
    }
    Ok(None)
}

/// `"{liquidation price, capped at price} / {price}"`.
pub fn liquidation_reading(liquidation_price: Decimal, price: Decimal) -> ValueReading {
    ValueReading {
        amount: liquidation_price,
        display: format!(
            "{} / {}",
            format_usd_max(liquidation_price, price),
            format_usd(price)
        ),
    }
}

/// Token bound to the input at `index`.
pub fn bound_token(fields: &[StrategyField], index: usize) -> Result<&Token, CompileError> {
    fields
        .get(index)
        .and_then(StrategyField::as_input)
        .and_then(|input| input.token.as_ref())
        .ok_or_else(|| CompileError::MissingToken(format!("no token bound to field {}", index)))
}

/// Display symbol of the token bound to the input at `index`.
pub fn bound_symbol(fields: &[StrategyField], index: usize) -> String {
    bound_token(fields, index)
        .map(|t| t.symbol.clone())
        .unwrap_or_default()
}
