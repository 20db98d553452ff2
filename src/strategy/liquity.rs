//! Liquity: deposit ETH into an open trove and borrow LUSD against it.

use super::common::{
    bound_symbol, bound_token, debt_ceiling_message, debt_with_fee, liquidation_reading,
    min_debt_message, validate_borrow, validate_deposit,
};
use super::{
    input_amount, FieldScope, HintRequest, InputField, Protocol, StatusField, StatusReading,
    StrategyContext, StrategyDefinition, StrategyField, ValueField, ValueReading,
};
use crate::compile::CompileError;
use crate::datasource::PositionHints;
use crate::domain::ray::WAD_DECIMALS;
use crate::domain::{
    ArithmeticError, CollateralType, Decimal, OperationDescriptor, Spell, TokenRegistry,
};
use crate::engine::risk;

const COLLATERAL: usize = 0;
const DEBT: usize = 1;

#[derive(Debug, Clone, Copy, Default)]
pub struct LiquityDepositAndBorrow;

// Status and liquidation price look at the amounts being added, priced at
// the position's USD price.
fn update_status(scope: &FieldScope<'_>) -> Result<Option<StatusReading>, ArithmeticError> {
    let position = &scope.context.position;
    Ok(Some(StatusReading {
        status: risk::status(scope.amount(COLLATERAL), scope.amount(DEBT), position.price)?,
        liquidation: position.liquidation_ratio,
    }))
}

fn update_liquidation_price(scope: &FieldScope<'_>) -> Result<Option<ValueReading>, ArithmeticError> {
    let position = &scope.context.position;
    let liquidation_price = risk::liquidation_price(
        scope.amount(COLLATERAL),
        scope.amount(DEBT),
        position.liquidation_ratio,
        position.price,
    )?;
    Ok(Some(liquidation_reading(liquidation_price, position.price)))
}

impl StrategyDefinition for LiquityDepositAndBorrow {
    fn id(&self) -> &'static str {
        "liquity-deposit-and-borrow"
    }

    fn name(&self) -> &'static str {
        "Deposit & Borrow"
    }

    fn description(&self) -> &'static str {
        "Deposit collateral & borrow asset in a single txn."
    }

    fn protocol(&self) -> Protocol {
        Protocol::Liquity
    }

    fn type_id(&self) -> CollateralType {
        CollateralType::new("ETH-TROVE")
    }

    fn fields(&self, tokens: &TokenRegistry) -> Vec<StrategyField> {
        vec![
            StrategyField::Input(
                InputField::new("Collateral", tokens.by_key("eth").cloned(), "ETH to Deposit")
                    .with_validator(validate_deposit),
            ),
            StrategyField::Input(
                InputField::new("Debt", tokens.by_key("lusd").cloned(), "LUSD to Borrow")
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
        if !context.position.is_open() {
            return Ok(Some("You should open new trove first".to_string()));
        }

        let params = &context.params;
        let new_debt = debt_with_fee(input_amount(fields, DEBT), params)?;
        let total_debt = context
            .position
            .debt
            .checked_add(new_debt)?
            .checked_add(params.liquidation_reserve)?;
        if total_debt.is_zero() || total_debt < params.min_debt {
            return Ok(Some(min_debt_message(params, &bound_symbol(fields, DEBT))));
        }

        debt_ceiling_message(&context.position_type, new_debt)
    }

    fn hint_request(
        &self,
        fields: &[StrategyField],
        context: &StrategyContext,
    ) -> Result<Option<HintRequest>, CompileError> {
        let collateral_token = bound_token(fields, COLLATERAL)?;
        let debt_token = bound_token(fields, DEBT)?;

        let collateral = context
            .position
            .collateral
            .checked_add(input_amount(fields, COLLATERAL))?;
        let debt = context
            .position
            .debt
            .checked_add(debt_with_fee(input_amount(fields, DEBT), &context.params)?)?;

        Ok(Some(HintRequest {
            collateral: collateral.to_base_units(collateral_token.decimals)?,
            debt: debt.to_base_units(debt_token.decimals)?,
        }))
    }

    fn spells(
        &self,
        fields: &[StrategyField],
        context: &StrategyContext,
        hints: Option<&PositionHints>,
    ) -> Result<Spell, CompileError> {
        let hints =
            hints.ok_or_else(|| CompileError::HintLookup("no position hints supplied".to_string()))?;
        let collateral_token = bound_token(fields, COLLATERAL)?;
        let debt_token = bound_token(fields, DEBT)?;

        let max_fee_percentage = context
            .params
            .borrow_fee
            .checked_mul(Decimal::hundred())?
            .to_base_units(WAD_DECIMALS)?;
        let deposit = input_amount(fields, COLLATERAL).to_base_units(collateral_token.decimals)?;
        let borrow = input_amount(fields, DEBT).to_base_units(debt_token.decimals)?;

        Ok(Spell::new(vec![OperationDescriptor::new(
            "LIQUITY-A",
            "adjust",
            vec![
                max_fee_percentage.to_string(),
                deposit.to_string(),
                "0".to_string(),
                borrow.to_string(),
                "0".to_string(),
                hints.upper.to_string(),
                hints.lower.to_string(),
            ],
        )]))
    }
}
