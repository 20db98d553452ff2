use crate::compile::{CompileError, SpellCompiler};
use crate::config::Config;
use crate::domain::{Address, ArithmeticError, Decimal, Spell, TokenKey, TokenRegistry};
use crate::engine::{ComponentEvaluator, EvaluationError};
use crate::orchestration::refresher::ContextRefresher;
use crate::strategy::{StrategyContext, StrategyDefinition, StrategyField, StrategyRegistry};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// One user's view of a strategy: who, which position, what they typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRequest {
    pub owner: Address,
    /// Existing position to act on; the first of the strategy's type otherwise.
    pub position_id: Option<u64>,
    /// Raw text for each editable field, in field order.
    pub inputs: Vec<String>,
    pub balances: BTreeMap<TokenKey, Decimal>,
}

/// Builds contexts from the latest snapshot and runs strategies against them.
pub struct StrategySession {
    refresher: Arc<ContextRefresher>,
    registry: StrategyRegistry,
    tokens: TokenRegistry,
    compiler: SpellCompiler,
    config: Config,
}

impl StrategySession {
    pub fn new(
        refresher: Arc<ContextRefresher>,
        registry: StrategyRegistry,
        tokens: TokenRegistry,
        compiler: SpellCompiler,
        config: Config,
    ) -> Self {
        Self {
            refresher,
            registry,
            tokens,
            compiler,
            config,
        }
    }

    pub fn refresher(&self) -> &Arc<ContextRefresher> {
        &self.refresher
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    /// Context for `definition`, or `None` while type or position data is
    /// unavailable.
    ///
    /// Falls back to an unopened position when the owner has none of the
    /// strategy's type.
    pub async fn build_context(
        &self,
        definition: &dyn StrategyDefinition,
        request: &EvaluationRequest,
    ) -> Result<Option<StrategyContext>, SessionError> {
        let snapshot = self.refresher.snapshot().await;
        let Some(position_type) = snapshot.position_type(&definition.type_id()).cloned() else {
            debug!("No type data for {}", definition.type_id());
            return Ok(None);
        };

        // A failed read is not an owner without positions.
        let Some(positions) = self.refresher.positions(&request.owner).await? else {
            debug!("No position data for {}", request.owner);
            return Ok(None);
        };
        let mut positions = positions
            .into_iter()
            .filter(|p| p.type_id == position_type.type_id);
        let position = match request.position_id {
            Some(id) => positions
                .find(|p| p.id == id)
                .ok_or(SessionError::PositionNotFound(id))?,
            None => positions
                .next()
                .unwrap_or_else(|| position_type.unopened_position(request.owner.clone())),
        };

        Ok(Some(StrategyContext {
            position,
            position_type,
            params: self.config.params_for(definition.protocol()),
            balances: request.balances.clone(),
        }))
    }

    /// Evaluate `strategy_id` for `request`.
    pub async fn evaluate(
        &self,
        strategy_id: &str,
        request: &EvaluationRequest,
    ) -> Result<ComponentEvaluator, SessionError> {
        let definition = self
            .registry
            .get(strategy_id)
            .ok_or_else(|| SessionError::UnknownStrategy(strategy_id.to_string()))?;

        let fields = definition.fields(&self.tokens);
        let editable: Vec<usize> = fields
            .iter()
            .enumerate()
            .filter(|(_, f)| matches!(f, StrategyField::Input(_)))
            .map(|(index, _)| index)
            .collect();
        if request.inputs.len() > editable.len() {
            return Err(SessionError::TooManyInputs {
                given: request.inputs.len(),
                accepted: editable.len(),
            });
        }

        let mut evaluator = ComponentEvaluator::new(definition.clone(), fields);
        for (index, value) in editable.iter().zip(&request.inputs) {
            evaluator.set_input(*index, value.clone())?;
        }

        match self.build_context(definition.as_ref(), request).await? {
            Some(context) => {
                evaluator.replace_context(Arc::new(context))?;
            }
            None => {
                evaluator.mark_data_unavailable();
            }
        }
        Ok(evaluator)
    }

    /// Evaluate and, if Ready, compile.
    pub async fn compile(
        &self,
        strategy_id: &str,
        request: &EvaluationRequest,
    ) -> Result<(ComponentEvaluator, Spell), SessionError> {
        let evaluator = self.evaluate(strategy_id, request).await?;
        let spell = self.compiler.compile(&evaluator).await?;
        Ok((evaluator, spell))
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),
    #[error("position {0} not found")]
    PositionNotFound(u64),
    #[error("{given} inputs given, strategy accepts {accepted}")]
    TooManyInputs { given: usize, accepted: usize },
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
    #[error(transparent)]
    Compile(#[from] CompileError),
}
