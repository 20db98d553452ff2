pub mod refresher;
pub mod session;

pub use refresher::{ContextRefresher, ContextSnapshot};
pub use session::{EvaluationRequest, SessionError, StrategySession};
