//! Reflexer: deposit ETH into a safe and generate RAI, opening the safe if needed.

use super::common::{
    bound_symbol, bound_token, debt_ceiling_message, liquidation_reading, min_debt_message,
    validate_borrow, validate_deposit,
};
use super::{
    input_amount, FieldScope, InputField, Protocol, StatusField, StatusReading, StrategyContext,
    StrategyDefinition, StrategyField, ValueField, ValueReading,
};
use crate::compile::CompileError;
use crate::datasource::PositionHints;
use crate::domain::{
    ArithmeticError, CollateralType, Decimal, OperationDescriptor, Position, Spell,
    TokenRegistry,
};
use crate::engine::risk;

const COLLATERAL: usize = 0;
const DEBT: usize = 1;

/// Register the freshly opened safe id is stored in.
const SAFE_ID_REGISTER: u32 = 1;
/// Register the generated amount is stored in.
const GENERATED_REGISTER: u32 = 2;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReflexerDepositAndGenerate;

fn projected(scope: &FieldScope<'_>) -> Result<(Decimal, Decimal), ArithmeticError> {
    let position = &scope.context.position;
    Ok((
        position.collateral.checked_add(scope.amount(COLLATERAL))?,
        position.debt.checked_add(scope.amount(DEBT))?,
    ))
}

fn update_status(scope: &FieldScope<'_>) -> Result<Option<StatusReading>, ArithmeticError> {
    let (collateral, debt) = projected(scope)?;
    let position = &scope.context.position;
    Ok(Some(StatusReading {
        status: risk::status(collateral, debt, position.spot_price)?,
        liquidation: position.liquidation_ratio,
    }))
}

/// Liquidation ratio restated against the redemption-adjusted price:
/// `liquidation_ratio * spot_price / price`.
fn redemption_adjusted_ratio(position: &Position) -> Result<Decimal, ArithmeticError> {
    if position.price.is_zero() {
        return Ok(position.liquidation_ratio);
    }
    position
        .liquidation_ratio
        .checked_mul(position.spot_price)?
        .checked_div(position.price)
}

fn update_liquidation_price(scope: &FieldScope<'_>) -> Result<Option<ValueReading>, ArithmeticError> {
    let (collateral, debt) = projected(scope)?;
    let position = &scope.context.position;
    let liquidation_price = risk::liquidation_price(
        collateral,
        debt,
        redemption_adjusted_ratio(position)?,
        position.price,
    )?;
    Ok(Some(liquidation_reading(liquidation_price, position.price)))
}

impl StrategyDefinition for ReflexerDepositAndGenerate {
    fn id(&self) -> &'static str {
        "reflexer-deposit-and-generate"
    }

    fn name(&self) -> &'static str {
        "Deposit & Generate"
    }

    fn description(&self) -> &'static str {
        "Deposit collateral & generate RAI in a single txn."
    }

    fn protocol(&self) -> Protocol {
        Protocol::Reflexer
    }

    fn type_id(&self) -> CollateralType {
        CollateralType::new("ETH-A")
    }

    fn fields(&self, tokens: &TokenRegistry) -> Vec<StrategyField> {
        vec![
            StrategyField::Input(
                InputField::new("Collateral", tokens.by_key("eth").cloned(), "ETH to Deposit")
                    .with_validator(validate_deposit),
            ),
            StrategyField::Input(
                InputField::new("Debt", tokens.by_key("rai").cloned(), "RAI to Generate")
                    .with_validator(validate_borrow),
            ),
            StrategyField::heading("Projected Debt Position"),
            StrategyField::Status(StatusField::new("Status", update_status)),
            StrategyField::Value(ValueField::new(
                "LIQUIDATION PRICE (IN ETH)",
                "-",
                update_liquidation_price,
            )),
        ]
    }

    fn validate(
        &self,
        fields: &[StrategyField],
        context: &StrategyContext,
    ) -> Result<Option<String>, ArithmeticError> {
        let position = &context.position;
        let borrow = input_amount(fields, DEBT);
        let collateral = position.collateral.checked_add(input_amount(fields, COLLATERAL))?;
        let debt = position.debt.checked_add(borrow)?;

        if !debt.is_zero() && debt < context.params.min_debt {
            return Ok(Some(min_debt_message(
                &context.params,
                &bound_symbol(fields, DEBT),
            )));
        }

        if let Some(message) = debt_ceiling_message(&context.position_type, borrow)? {
            return Ok(Some(message));
        }

        let status = risk::status(collateral, debt, position.spot_price)?;
        if status > position.liquidation_ratio {
            return Ok(Some("Position will liquidate".to_string()));
        }
        Ok(None)
    }

    fn spells(
        &self,
        fields: &[StrategyField],
        context: &StrategyContext,
        _hints: Option<&PositionHints>,
    ) -> Result<Spell, CompileError> {
        let collateral_token = bound_token(fields, COLLATERAL)?;
        let debt_token = bound_token(fields, DEBT)?;
        let position = &context.position;

        let deposit = input_amount(fields, COLLATERAL).to_base_units(collateral_token.decimals)?;
        let borrow = input_amount(fields, DEBT).to_base_units(debt_token.decimals)?;

        let mut operations = Vec::with_capacity(4);
        let opening = position.is_new();
        // An unopened safe is addressed through the register its id lands in.
        let safe_arg = if opening {
            operations.push(
                OperationDescriptor::new("REFLEXER-A", "open", vec![position.type_id.to_string()])
                    .storing(0, SAFE_ID_REGISTER),
            );
            "0".to_string()
        } else {
            position.id.to_string()
        };
        let on_safe = |op: OperationDescriptor| {
            if opening {
                op.reading(0, SAFE_ID_REGISTER)
            } else {
                op
            }
        };

        if !deposit.is_zero() {
            operations.push(on_safe(OperationDescriptor::new(
                "REFLEXER-A",
                "deposit",
                vec![safe_arg.clone(), deposit.to_string()],
            )));
        }

        if !borrow.is_zero() {
            operations.push(
                on_safe(OperationDescriptor::new(
                    "REFLEXER-A",
                    "borrow",
                    vec![safe_arg.clone(), borrow.to_string()],
                ))
                .storing(1, GENERATED_REGISTER),
            );
            operations.push(
                OperationDescriptor::new(
                    "BASIC-A",
                    "withdraw",
                    vec![
                        debt_token.address.to_string(),
                        "0".to_string(),
                        position.owner.to_string(),
                    ],
                )
                .reading(1, GENERATED_REGISTER),
            );
        }

        Ok(Spell::new(operations))
    }
}
