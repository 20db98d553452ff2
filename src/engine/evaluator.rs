//! Component evaluator: drives one strategy instance through validation and
//! derived-field updates.
//!
//! Each cycle runs on a scratch copy of the fields and is committed only when
//! it finishes, so an arithmetic failure leaves the last published fields,
//! context and state untouched.

use crate::domain::ArithmeticError;
use crate::strategy::{FieldScope, StrategyContext, StrategyDefinition, StrategyField};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Published outcome of the last completed evaluation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum EvaluationState {
    /// Nothing evaluated yet.
    Idle,
    /// All checks passed. `noop` when there is nothing to do.
    Ready { noop: bool },
    Invalid { message: String },
    /// No context to evaluate against.
    DataUnavailable,
}

impl EvaluationState {
    pub fn is_ready(&self) -> bool {
        matches!(self, EvaluationState::Ready { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("field {0} is not editable")]
    NotEditable(usize),
    #[error("field index {index} out of range (strategy has {len} fields)")]
    OutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

/// Owns the field list of one strategy instance.
#[derive(Debug, Clone)]
pub struct ComponentEvaluator {
    definition: Arc<dyn StrategyDefinition>,
    fields: Vec<StrategyField>,
    context: Option<Arc<StrategyContext>>,
    state: EvaluationState,
}

impl ComponentEvaluator {
    pub fn new(definition: Arc<dyn StrategyDefinition>, fields: Vec<StrategyField>) -> Self {
        Self {
            definition,
            fields,
            context: None,
            state: EvaluationState::Idle,
        }
    }

    pub fn definition(&self) -> &dyn StrategyDefinition {
        self.definition.as_ref()
    }

    pub fn fields(&self) -> &[StrategyField] {
        &self.fields
    }

    pub fn state(&self) -> &EvaluationState {
        &self.state
    }

    pub fn context(&self) -> Option<&StrategyContext> {
        self.context.as_deref()
    }

    /// Replace the raw text of an input and re-evaluate.
    pub fn set_input(
        &mut self,
        index: usize,
        value: impl Into<String>,
    ) -> Result<&EvaluationState, EvaluationError> {
        let len = self.fields.len();
        let mut scratch = self.fields.clone();
        match scratch.get_mut(index) {
            Some(StrategyField::Input(input)) => input.value = value.into(),
            Some(_) => return Err(EvaluationError::NotEditable(index)),
            None => return Err(EvaluationError::OutOfRange { index, len }),
        }
        let context = self.context.clone();
        self.commit(scratch, context)
    }

    /// Swap in a new context snapshot and re-evaluate.
    pub fn replace_context(
        &mut self,
        context: Arc<StrategyContext>,
    ) -> Result<&EvaluationState, EvaluationError> {
        self.commit(self.fields.clone(), Some(context))
    }

    /// Drop the context; the evaluator reports DataUnavailable until a new one arrives.
    pub fn mark_data_unavailable(&mut self) -> &EvaluationState {
        for field in &mut self.fields {
            field.reset();
        }
        self.context = None;
        self.state = EvaluationState::DataUnavailable;
        &self.state
    }

    /// Re-run the current fields against the current context.
    pub fn evaluate(&mut self) -> Result<&EvaluationState, EvaluationError> {
        self.commit(self.fields.clone(), self.context.clone())
    }

    fn commit(
        &mut self,
        mut fields: Vec<StrategyField>,
        context: Option<Arc<StrategyContext>>,
    ) -> Result<&EvaluationState, EvaluationError> {
        let state = run_cycle(self.definition.as_ref(), &mut fields, context.as_deref())?;
        debug!("Strategy {} evaluated to {:?}", self.definition.id(), state);
        self.fields = fields;
        self.context = context;
        self.state = state;
        Ok(&self.state)
    }
}

fn reset_derived(fields: &mut [StrategyField]) {
    for field in fields {
        field.reset();
    }
}

/// The first two editable fields both empty or zero.
fn is_noop(fields: &[StrategyField]) -> bool {
    fields
        .iter()
        .filter_map(StrategyField::as_input)
        .take(2)
        .all(|input| input.is_zero_or_empty())
}

fn run_cycle(
    definition: &dyn StrategyDefinition,
    fields: &mut [StrategyField],
    context: Option<&StrategyContext>,
) -> Result<EvaluationState, ArithmeticError> {
    let Some(context) = context else {
        reset_derived(fields);
        return Ok(EvaluationState::DataUnavailable);
    };

    if is_noop(fields) {
        reset_derived(fields);
        return Ok(EvaluationState::Ready { noop: true });
    }

    let rejection = (0..fields.len()).find_map(|index| {
        let (earlier, rest) = fields.split_at(index);
        let input = rest[0].as_input()?;
        let validate = input.validate?;
        validate(input, &FieldScope::new(earlier, context))
    });
    if let Some(message) = rejection {
        reset_derived(fields);
        return Ok(EvaluationState::Invalid { message });
    }

    for index in 0..fields.len() {
        let (earlier, rest) = fields.split_at_mut(index);
        let scope = FieldScope::new(earlier, context);
        match &mut rest[0] {
            StrategyField::Status(status) => status.reading = (status.update)(&scope)?,
            StrategyField::Value(value) => value.reading = (value.update)(&scope)?,
            StrategyField::Input(_) | StrategyField::Heading(_) => {}
        }
    }

    match definition.validate(fields, context)? {
        Some(message) => Ok(EvaluationState::Invalid { message }),
        None => Ok(EvaluationState::Ready { noop: false }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::CompileError;
    use crate::datasource::PositionHints;
    use crate::domain::{
        Address, CollateralType, Decimal, PositionType, Spell, TokenKey, TokenRegistry,
    };
    use crate::strategy::{
        InputField, Protocol, ProtocolParams, StatusField, StatusReading, ValueField,
        ValueReading,
    };
    use std::collections::BTreeMap;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    /// Status echoes the first input; value echoes the status, so it only
    /// sees a fresh number if the status row was updated first.
    #[derive(Debug)]
    struct Echo;

    fn echo_status(scope: &FieldScope<'_>) -> Result<Option<StatusReading>, ArithmeticError> {
        Ok(Some(StatusReading {
            status: scope.amount(0).checked_div(scope.amount(1))?,
            liquidation: Decimal::one(),
        }))
    }

    fn echo_value(scope: &FieldScope<'_>) -> Result<Option<ValueReading>, ArithmeticError> {
        let status = scope.earlier.iter().find_map(|f| match f {
            StrategyField::Status(s) => s.reading,
            _ => None,
        });
        Ok(status.map(|r| ValueReading {
            amount: r.status,
            display: r.status.to_string(),
        }))
    }

    fn reject_junk(input: &InputField, _scope: &FieldScope<'_>) -> Option<String> {
        input.amount().is_none().then(|| format!("{} amount is required", input.name))
    }

    impl StrategyDefinition for Echo {
        fn id(&self) -> &'static str {
            "echo"
        }
        fn name(&self) -> &'static str {
            "Echo"
        }
        fn description(&self) -> &'static str {
            ""
        }
        fn protocol(&self) -> Protocol {
            Protocol::Reflexer
        }
        fn type_id(&self) -> CollateralType {
            CollateralType::new("ETH-A")
        }
        fn fields(&self, _tokens: &TokenRegistry) -> Vec<StrategyField> {
            vec![
                StrategyField::Input(InputField::new("A", None, "").with_validator(reject_junk)),
                StrategyField::Input(InputField::new("B", None, "").with_validator(reject_junk)),
                StrategyField::Status(StatusField::new("Status", echo_status)),
                StrategyField::Value(ValueField::new("Value", "-", echo_value)),
            ]
        }
        fn validate(
            &self,
            fields: &[StrategyField],
            _context: &StrategyContext,
        ) -> Result<Option<String>, ArithmeticError> {
            let over = crate::strategy::input_amount(fields, 0) > d("100");
            Ok(over.then(|| "too much".to_string()))
        }
        fn spells(
            &self,
            _fields: &[StrategyField],
            _context: &StrategyContext,
            _hints: Option<&PositionHints>,
        ) -> Result<Spell, CompileError> {
            Ok(Spell::empty())
        }
    }

    fn context() -> Arc<StrategyContext> {
        let position_type = PositionType {
            type_id: CollateralType::new("ETH-A"),
            collateral_token: TokenKey::new("eth"),
            debt_token: TokenKey::new("rai"),
            disabled: false,
            rate: Decimal::zero(),
            redemption_price: Decimal::one(),
            spot_price: d("2000"),
            price: d("2000"),
            liquidation_ratio: d("0.5"),
            debt_ceiling: d("1000"),
            total_debt: Decimal::zero(),
        };
        Arc::new(StrategyContext {
            position: position_type.unopened_position(Address::zero()),
            position_type,
            params: ProtocolParams::none(),
            balances: BTreeMap::new(),
        })
    }

    fn evaluator() -> ComponentEvaluator {
        let definition: Arc<dyn StrategyDefinition> = Arc::new(Echo);
        let fields = definition.fields(&TokenRegistry::mainnet());
        ComponentEvaluator::new(definition, fields)
    }

    #[test]
    fn test_starts_idle_and_needs_context() {
        let mut ev = evaluator();
        assert_eq!(ev.state(), &EvaluationState::Idle);
        assert_eq!(ev.set_input(0, "1").unwrap(), &EvaluationState::DataUnavailable);
    }

    #[test]
    fn test_noop_when_first_inputs_zero() {
        let mut ev = evaluator();
        ev.replace_context(context()).unwrap();
        assert_eq!(ev.state(), &EvaluationState::Ready { noop: true });
        ev.set_input(0, "0").unwrap();
        assert_eq!(ev.state(), &EvaluationState::Ready { noop: true });
    }

    #[test]
    fn test_derived_fields_follow_index_order() {
        let mut ev = evaluator();
        ev.replace_context(context()).unwrap();
        ev.set_input(0, "6").unwrap();
        let state = ev.set_input(1, "3").unwrap().clone();
        assert_eq!(state, EvaluationState::Ready { noop: false });

        match &ev.fields()[3] {
            StrategyField::Value(v) => assert_eq!(v.display(), "2"),
            other => panic!("unexpected field {:?}", other),
        }
    }

    #[test]
    fn test_first_failing_validator_wins() {
        let mut ev = evaluator();
        ev.replace_context(context()).unwrap();
        ev.set_input(0, "x").unwrap();
        let state = ev.set_input(1, "y").unwrap();
        assert_eq!(
            state,
            &EvaluationState::Invalid {
                message: "A amount is required".to_string()
            }
        );
    }

    #[test]
    fn test_strategy_validator_runs_last() {
        let mut ev = evaluator();
        ev.replace_context(context()).unwrap();
        ev.set_input(1, "1").unwrap();
        let state = ev.set_input(0, "101").unwrap();
        assert_eq!(
            state,
            &EvaluationState::Invalid {
                message: "too much".to_string()
            }
        );
        // Derived rows were still computed before the strategy check.
        assert!(matches!(&ev.fields()[2], StrategyField::Status(s) if s.reading.is_some()));
    }

    #[test]
    fn test_arithmetic_error_keeps_previous_publication() {
        let mut ev = evaluator();
        ev.replace_context(context()).unwrap();
        ev.set_input(0, "4").unwrap();
        ev.set_input(1, "2").unwrap();
        let before_state = ev.state().clone();

        let err = ev.set_input(1, "0").unwrap_err();
        assert_eq!(err, EvaluationError::Arithmetic(ArithmeticError::DivisionByZero));
        assert_eq!(ev.state(), &before_state);
        assert_eq!(ev.fields()[1].as_input().unwrap().value, "2");
    }

    #[test]
    fn test_bad_edits_are_rejected() {
        let mut ev = evaluator();
        assert_eq!(ev.set_input(2, "1").unwrap_err(), EvaluationError::NotEditable(2));
        assert_eq!(
            ev.set_input(9, "1").unwrap_err(),
            EvaluationError::OutOfRange { index: 9, len: 4 }
        );
    }

    #[test]
    fn test_mark_data_unavailable_clears_readings() {
        let mut ev = evaluator();
        ev.replace_context(context()).unwrap();
        ev.set_input(0, "1").unwrap();
        ev.set_input(1, "1").unwrap();
        assert_eq!(ev.mark_data_unavailable(), &EvaluationState::DataUnavailable);
        assert!(ev.context().is_none());
        assert!(matches!(&ev.fields()[2], StrategyField::Status(s) if s.reading.is_none()));
    }
}
