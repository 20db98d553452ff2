//! Declarative strategies: field layouts, validation rules and spell recipes.

use crate::compile::CompileError;
use crate::datasource::PositionHints;
use crate::domain::{ArithmeticError, CollateralType, Decimal, Position, PositionType, Spell, TokenKey, TokenRegistry};
use primitive_types::U256;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub mod common;
pub mod field;
pub mod liquity;
pub mod reflexer;

pub use field::{
    input_amount, FieldScope, HeadingField, InputField, StatusField, StatusReading,
    StrategyField, ValueField, ValueReading,
};
pub use liquity::LiquityDepositAndBorrow;
pub use reflexer::ReflexerDepositAndGenerate;

/// Lending protocol a strategy targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Liquity,
    Reflexer,
}

/// Protocol-level borrowing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolParams {
    /// Fraction of borrowed debt charged as a one-off fee.
    pub borrow_fee: Decimal,
    /// Debt reserved at open and counted toward the minimum.
    pub liquidation_reserve: Decimal,
    pub min_debt: Decimal,
}

impl ProtocolParams {
    pub fn new(borrow_fee: Decimal, liquidation_reserve: Decimal, min_debt: Decimal) -> Self {
        Self {
            borrow_fee,
            liquidation_reserve,
            min_debt,
        }
    }

    /// No fee, no reserve, no minimum.
    pub fn none() -> Self {
        Self::new(Decimal::zero(), Decimal::zero(), Decimal::zero())
    }
}

/// Immutable inputs to one evaluation: the selected position and its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyContext {
    pub position: Position,
    pub position_type: PositionType,
    pub params: ProtocolParams,
    /// Account balances by token key, display scale.
    pub balances: BTreeMap<TokenKey, Decimal>,
}

impl StrategyContext {
    /// Balance held for `key`; an unknown token counts as zero.
    pub fn balance(&self, key: &TokenKey) -> Decimal {
        self.balances.get(key).copied().unwrap_or_default()
    }
}

/// Target totals for a sorted-list hint lookup, in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HintRequest {
    pub collateral: U256,
    pub debt: U256,
}

/// A strategy: what the user fills in and what it compiles to.
pub trait StrategyDefinition: Send + Sync + fmt::Debug {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn protocol(&self) -> Protocol;
    /// Collateral class the strategy operates on.
    fn type_id(&self) -> CollateralType;

    /// Fresh field list with tokens bound from `tokens`.
    fn fields(&self, tokens: &TokenRegistry) -> Vec<StrategyField>;

    /// Strategy-wide check, run once all derived fields are current.
    fn validate(
        &self,
        fields: &[StrategyField],
        context: &StrategyContext,
    ) -> Result<Option<String>, ArithmeticError>;

    /// Hint lookup needed before [`StrategyDefinition::spells`], if any.
    fn hint_request(
        &self,
        _fields: &[StrategyField],
        _context: &StrategyContext,
    ) -> Result<Option<HintRequest>, CompileError> {
        Ok(None)
    }

    /// Build the operation list for Ready fields.
    fn spells(
        &self,
        fields: &[StrategyField],
        context: &StrategyContext,
        hints: Option<&PositionHints>,
    ) -> Result<Spell, CompileError>;
}

/// The strategies this service knows about.
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    strategies: Vec<Arc<dyn StrategyDefinition>>,
}

impl StrategyRegistry {
    pub fn new(strategies: Vec<Arc<dyn StrategyDefinition>>) -> Self {
        Self { strategies }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            Arc::new(LiquityDepositAndBorrow),
            Arc::new(ReflexerDepositAndGenerate),
        ])
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn StrategyDefinition>> {
        self.strategies.iter().find(|s| s.id() == id).cloned()
    }

    pub fn all(&self) -> &[Arc<dyn StrategyDefinition>] {
        &self.strategies
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
