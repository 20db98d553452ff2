use crate::api::AppState;
use crate::domain::ray::RATE_DISPLAY_DECIMALS;
use crate::domain::{any_debt_ceiling_reached, Address, Position, PositionType};
use crate::error::AppError;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Deserialize)]
pub struct PositionsQuery {
    pub owner: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionTypesResponse {
    pub types: Vec<PositionTypeDto>,
    pub debt_ceiling_reached: bool,
    pub fetched_at_ms: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionTypeDto {
    pub type_id: String,
    pub collateral_token: String,
    pub debt_token: String,
    pub disabled: bool,
    pub rate: String,
    pub redemption_price: String,
    pub spot_price: String,
    pub price: String,
    pub liquidation_ratio: String,
    pub debt_ceiling: String,
    pub total_debt: String,
    pub debt_ceiling_reached: bool,
}

impl From<&PositionType> for PositionTypeDto {
    fn from(t: &PositionType) -> Self {
        Self {
            type_id: t.type_id.to_string(),
            collateral_token: t.collateral_token.to_string(),
            debt_token: t.debt_token.to_string(),
            disabled: t.disabled,
            rate: t.rate.to_fixed(RATE_DISPLAY_DECIMALS),
            redemption_price: t.redemption_price.to_canonical_string(),
            spot_price: t.spot_price.to_canonical_string(),
            price: t.price.to_canonical_string(),
            liquidation_ratio: t.liquidation_ratio.to_canonical_string(),
            debt_ceiling: t.debt_ceiling.to_canonical_string(),
            total_debt: t.total_debt.to_canonical_string(),
            debt_ceiling_reached: t.debt_ceiling_reached(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsResponse {
    pub positions: Vec<PositionDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionDto {
    pub id: u64,
    pub owner: String,
    pub type_id: String,
    pub collateral_token: String,
    pub debt_token: String,
    pub collateral: String,
    pub debt: String,
    pub liquidated_collateral: String,
    pub rate: String,
    pub price: String,
    pub spot_price: String,
    pub liquidation_ratio: String,
    pub net_value: String,
    pub status: String,
    pub liquidation_price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl From<&Position> for PositionDto {
    fn from(p: &Position) -> Self {
        Self {
            id: p.id,
            owner: p.owner.to_string(),
            type_id: p.type_id.to_string(),
            collateral_token: p.collateral_token.to_string(),
            debt_token: p.debt_token.to_string(),
            collateral: p.collateral.to_canonical_string(),
            debt: p.debt.to_canonical_string(),
            liquidated_collateral: p.liquidated_collateral.to_canonical_string(),
            rate: p.rate.to_fixed(RATE_DISPLAY_DECIMALS),
            price: p.price.to_canonical_string(),
            spot_price: p.spot_price.to_canonical_string(),
            liquidation_ratio: p.liquidation_ratio.to_canonical_string(),
            net_value: p.net_value.to_canonical_string(),
            status: p.status.to_canonical_string(),
            liquidation_price: p.liquidation_price.to_canonical_string(),
            extra: p.extra.as_ref().map(|a| a.to_string()),
        }
    }
}

pub async fn get_position_types(
    State(state): State<AppState>,
) -> Result<Json<PositionTypesResponse>, AppError> {
    let snapshot = state.refresher().snapshot().await;
    if !snapshot.is_available() {
        return Err(AppError::Unavailable("Position type data unavailable".into()));
    }

    Ok(Json(PositionTypesResponse {
        types: snapshot.types.iter().map(PositionTypeDto::from).collect(),
        debt_ceiling_reached: any_debt_ceiling_reached(&snapshot.types),
        fetched_at_ms: snapshot.fetched_at.map(|t| t.as_ms()),
    }))
}

pub async fn get_positions(
    Query(params): Query<PositionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<PositionsResponse>, AppError> {
    let owner = Address::from_str(&params.owner)
        .map_err(|_| AppError::BadRequest("Invalid owner address".into()))?;

    let positions = state
        .refresher()
        .positions(&owner)
        .await?
        .ok_or_else(|| AppError::Unavailable("Position data unavailable".into()))?;

    Ok(Json(PositionsResponse {
        positions: positions.iter().map(PositionDto::from).collect(),
    }))
}
