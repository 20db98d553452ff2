//! Strategy fields: editable amounts and the read-only rows derived from them.
//!
//! Every capability receives a [`FieldScope`] holding only the fields that
//! precede it, so dependencies can only point backwards.

use super::StrategyContext;
use crate::domain::{ArithmeticError, Decimal, Token};
use std::fmt;

/// Validates one input; `Some(message)` rejects it.
pub type InputValidator = fn(&InputField, &FieldScope<'_>) -> Option<String>;

/// Recomputes a status row from the preceding fields.
pub type StatusUpdater = fn(&FieldScope<'_>) -> Result<Option<StatusReading>, ArithmeticError>;

/// Recomputes a value row from the preceding fields.
pub type ValueUpdater = fn(&FieldScope<'_>) -> Result<Option<ValueReading>, ArithmeticError>;

/// What a capability may look at: lower-index fields plus the context.
#[derive(Debug, Clone, Copy)]
pub struct FieldScope<'a> {
    pub earlier: &'a [StrategyField],
    pub context: &'a StrategyContext,
}

impl<'a> FieldScope<'a> {
    pub fn new(earlier: &'a [StrategyField], context: &'a StrategyContext) -> Self {
        Self { earlier, context }
    }

    /// Amount entered in the input at `index`, zero when absent or not yet a number.
    pub fn amount(&self, index: usize) -> Decimal {
        input_amount(self.earlier, index)
    }
}

/// Amount entered in the input at `index` of `fields`, zero when absent or unparseable.
pub fn input_amount(fields: &[StrategyField], index: usize) -> Decimal {
    match fields.get(index) {
        Some(StrategyField::Input(input)) => input.amount().unwrap_or_default(),
        _ => Decimal::zero(),
    }
}

#[derive(Clone)]
pub struct InputField {
    pub name: String,
    pub token: Option<Token>,
    /// Raw user text, kept verbatim.
    pub value: String,
    pub placeholder: String,
    pub validate: Option<InputValidator>,
}

impl InputField {
    pub fn new(name: &str, token: Option<Token>, placeholder: &str) -> Self {
        Self {
            name: name.to_string(),
            token,
            value: String::new(),
            placeholder: placeholder.to_string(),
            validate: None,
        }
    }

    pub fn with_validator(mut self, validate: InputValidator) -> Self {
        self.validate = Some(validate);
        self
    }

    /// Parsed amount; `None` for empty or non-numeric text.
    pub fn amount(&self) -> Option<Decimal> {
        let text = self.value.trim();
        if text.is_empty() {
            return None;
        }
        Decimal::from_str_canonical(text).ok()
    }

    /// Empty text counts as zero here; junk text does not.
    pub fn is_zero_or_empty(&self) -> bool {
        self.value.trim().is_empty() || self.amount().map_or(false, |a| a.is_zero())
    }
}

impl fmt::Debug for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputField")
            .field("name", &self.name)
            .field("token", &self.token.as_ref().map(|t| t.key.as_str()))
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct HeadingField {
    pub name: String,
}

/// Result of a status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReading {
    pub status: Decimal,
    /// Threshold the status is compared against.
    pub liquidation: Decimal,
}

#[derive(Clone)]
pub struct StatusField {
    pub name: String,
    pub reading: Option<StatusReading>,
    pub update: StatusUpdater,
}

impl StatusField {
    pub fn new(name: &str, update: StatusUpdater) -> Self {
        Self {
            name: name.to_string(),
            reading: None,
            update,
        }
    }
}

impl fmt::Debug for StatusField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusField")
            .field("name", &self.name)
            .field("reading", &self.reading)
            .finish_non_exhaustive()
    }
}

/// Result of a value update: the number and how it is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueReading {
    pub amount: Decimal,
    pub display: String,
}

#[derive(Clone)]
pub struct ValueField {
    pub name: String,
    /// Shown while there is no reading.
    pub placeholder: String,
    pub reading: Option<ValueReading>,
    pub update: ValueUpdater,
}

impl ValueField {
    pub fn new(name: &str, placeholder: &str, update: ValueUpdater) -> Self {
        Self {
            name: name.to_string(),
            placeholder: placeholder.to_string(),
            reading: None,
            update,
        }
    }

    pub fn display(&self) -> &str {
        self.reading
            .as_ref()
            .map(|r| r.display.as_str())
            .unwrap_or(&self.placeholder)
    }
}

impl fmt::Debug for ValueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueField")
            .field("name", &self.name)
            .field("reading", &self.reading)
            .finish_non_exhaustive()
    }
}

/// One row of a strategy form.
#[derive(Debug, Clone)]
pub enum StrategyField {
    Input(InputField),
    Heading(HeadingField),
    Status(StatusField),
    Value(ValueField),
}

impl StrategyField {
    pub fn heading(name: &str) -> Self {
        StrategyField::Heading(HeadingField {
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            StrategyField::Input(f) => &f.name,
            StrategyField::Heading(f) => &f.name,
            StrategyField::Status(f) => &f.name,
            StrategyField::Value(f) => &f.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StrategyField::Input(_) => "input",
            StrategyField::Heading(_) => "heading",
            StrategyField::Status(_) => "status",
            StrategyField::Value(_) => "value",
        }
    }

    pub fn as_input(&self) -> Option<&InputField> {
        match self {
            StrategyField::Input(input) => Some(input),
            _ => None,
        }
    }

    /// Drop any derived reading.
    pub fn reset(&mut self) {
        match self {
            StrategyField::Status(status) => status.reading = None,
            StrategyField::Value(value) => value.reading = None,
            StrategyField::Input(_) | StrategyField::Heading(_) => {}
        }
    }
}
