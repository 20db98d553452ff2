//! Spell compilation: Ready strategy fields to an ordered operation list.
//!
//! This module provides:
//! - The `CompileError` taxonomy (nothing is emitted on error)
//! - `SpellCompiler`, which resolves ordering hints and delegates to the
//!   strategy's recipe

use crate::datasource::DataSourceError;
use crate::domain::ArithmeticError;
use thiserror::Error;

pub mod spell_compiler;

pub use spell_compiler::SpellCompiler;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("strategy is not ready: {0}")]
    NotReady(String),
    #[error("no position context to compile against")]
    MissingContext,
    #[error("missing token: {0}")]
    MissingToken(String),
    #[error("position hint lookup failed: {0}")]
    HintLookup(String),
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

impl From<DataSourceError> for CompileError {
    fn from(err: DataSourceError) -> Self {
        CompileError::HintLookup(err.to_string())
    }
}
