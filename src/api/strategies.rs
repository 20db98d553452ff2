use crate::api::AppState;
use crate::domain::{Address, Decimal, OperationDescriptor, TokenKey};
use crate::engine::{ComponentEvaluator, EvaluationState};
use crate::error::AppError;
use crate::orchestration::EvaluationRequest;
use crate::strategy::{Protocol, StrategyField};
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyRequest {
    pub owner: String,
    pub position_id: Option<u64>,
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Balances keyed by token key, as decimal strings.
    #[serde(default)]
    pub balances: BTreeMap<String, Decimal>,
}

impl StrategyRequest {
    fn into_evaluation_request(self) -> Result<EvaluationRequest, AppError> {
        let owner = Address::from_str(&self.owner)
            .map_err(|_| AppError::BadRequest("Invalid owner address".into()))?;
        Ok(EvaluationRequest {
            owner,
            position_id: self.position_id,
            inputs: self.inputs,
            balances: self
                .balances
                .into_iter()
                .map(|(key, amount)| (TokenKey::new(&key), amount))
                .collect(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDto {
    pub kind: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
}

impl From<&StrategyField> for FieldDto {
    fn from(field: &StrategyField) -> Self {
        let mut dto = FieldDto {
            kind: field.kind(),
            name: field.name().to_string(),
            token: None,
            value: None,
            placeholder: None,
            status: None,
            liquidation: None,
            amount: None,
        };
        match field {
            StrategyField::Input(input) => {
                dto.token = input.token.as_ref().map(|t| t.symbol.clone());
                dto.value = Some(input.value.clone());
                dto.placeholder = Some(input.placeholder.clone());
            }
            StrategyField::Heading(_) => {}
            StrategyField::Status(status) => {
                if let Some(reading) = status.reading {
                    dto.status = Some(reading.status.to_canonical_string());
                    dto.liquidation = Some(reading.liquidation.to_canonical_string());
                }
            }
            StrategyField::Value(value) => {
                dto.value = Some(value.display().to_string());
                dto.amount = value
                    .reading
                    .as_ref()
                    .map(|r| r.amount.to_canonical_string());
            }
        }
        dto
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDto {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub protocol: Protocol,
    pub type_id: String,
    pub fields: Vec<FieldDto>,
}

#[derive(Debug, Serialize)]
pub struct StrategiesResponse {
    pub strategies: Vec<StrategyDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResponse {
    pub strategy: &'static str,
    #[serde(flatten)]
    pub state: EvaluationState,
    pub fields: Vec<FieldDto>,
}

impl From<&ComponentEvaluator> for EvaluationResponse {
    fn from(evaluator: &ComponentEvaluator) -> Self {
        Self {
            strategy: evaluator.definition().id(),
            state: evaluator.state().clone(),
            fields: evaluator.fields().iter().map(FieldDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileResponse {
    pub strategy: &'static str,
    pub spell: Vec<OperationDescriptor>,
    pub fingerprint: String,
}

pub async fn list_strategies(State(state): State<AppState>) -> Json<StrategiesResponse> {
    let tokens = state.session.tokens();
    let strategies = state
        .session
        .registry()
        .all()
        .iter()
        .map(|definition| StrategyDto {
            id: definition.id(),
            name: definition.name(),
            description: definition.description(),
            protocol: definition.protocol(),
            type_id: definition.type_id().to_string(),
            fields: definition.fields(tokens).iter().map(FieldDto::from).collect(),
        })
        .collect();

    Json(StrategiesResponse { strategies })
}

pub async fn evaluate_strategy(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<StrategyRequest>,
) -> Result<Json<EvaluationResponse>, AppError> {
    let request = body.into_evaluation_request()?;
    let evaluator = state.session.evaluate(&id, &request).await?;
    Ok(Json(EvaluationResponse::from(&evaluator)))
}

pub async fn compile_strategy(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<StrategyRequest>,
) -> Result<Json<CompileResponse>, AppError> {
    let request = body.into_evaluation_request()?;
    let (evaluator, spell) = state.session.compile(&id, &request).await?;

    Ok(Json(CompileResponse {
        strategy: evaluator.definition().id(),
        fingerprint: spell.fingerprint(),
        spell: spell.operations().to_vec(),
    }))
}
