pub mod api;
pub mod compile;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod strategy;

pub use compile::{CompileError, SpellCompiler};
pub use config::Config;
pub use datasource::{
    DataSource, DataSourceError, HintSource, HttpDataSource, MockDataSource, MockHintSource,
    PositionHints,
};
pub use domain::{
    Address, ArithmeticError, CollateralRegistry, CollateralType, Decimal, OperationDescriptor,
    Position, PositionType, Spell, TimeMs, TokenKey, TokenRegistry, WorkingPrecision,
};
pub use engine::{ComponentEvaluator, EvaluationError, EvaluationState, PositionComputer};
pub use error::AppError;
pub use orchestration::{ContextRefresher, EvaluationRequest, StrategySession};
pub use strategy::{StrategyContext, StrategyDefinition, StrategyField, StrategyRegistry};
