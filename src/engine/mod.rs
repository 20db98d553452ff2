//! Pure computation engines: position metrics and strategy evaluation.

pub mod evaluator;
pub mod formatting;
pub mod position_computer;
pub mod risk;

pub use evaluator::{ComponentEvaluator, EvaluationError, EvaluationState};
pub use position_computer::{PositionComputer, PERIODS_PER_YEAR};
