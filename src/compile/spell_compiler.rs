use super::CompileError;
use crate::datasource::HintSource;
use crate::domain::Spell;
use crate::engine::{ComponentEvaluator, EvaluationState};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Compiles Ready evaluators into spells.
#[derive(Debug, Clone)]
pub struct SpellCompiler {
    hints: Arc<dyn HintSource>,
}

impl SpellCompiler {
    pub fn new(hints: Arc<dyn HintSource>) -> Self {
        Self { hints }
    }

    /// Compile the evaluator's published fields.
    ///
    /// # Errors
    /// Returns an error if the evaluator is not Ready, has no context, or a
    /// hint lookup or base-unit conversion fails. No partial spell is returned.
    pub async fn compile(&self, evaluator: &ComponentEvaluator) -> Result<Spell, CompileError> {
        let definition = evaluator.definition();
        match evaluator.state() {
            EvaluationState::Ready { noop: true } => return Ok(Spell::empty()),
            EvaluationState::Ready { noop: false } => {}
            EvaluationState::Invalid { message } => {
                return Err(CompileError::NotReady(message.clone()))
            }
            EvaluationState::DataUnavailable => return Err(CompileError::MissingContext),
            EvaluationState::Idle => {
                return Err(CompileError::NotReady("not evaluated yet".to_string()))
            }
        }

        let context = evaluator.context().ok_or(CompileError::MissingContext)?;
        let fields = evaluator.fields();

        let hints = match definition.hint_request(fields, context)? {
            Some(request) => {
                debug!(
                    "Requesting hints for collateral={}, debt={}",
                    request.collateral, request.debt
                );
                let hints = self
                    .hints
                    .position_hints(request.collateral, request.debt)
                    .await
                    .map_err(|e| {
                        warn!("Hint lookup for {} failed: {}", definition.id(), e);
                        CompileError::from(e)
                    })?;
                Some(hints)
            }
            None => None,
        };

        let spell = definition.spells(fields, context, hints.as_ref())?;
        info!(
            "Compiled {} into {} operations ({})",
            definition.id(),
            spell.len(),
            spell.fingerprint()
        );
        Ok(spell)
    }
}
