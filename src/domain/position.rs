//! Raw on-chain tuples and the display-scale records derived from them.

use super::{Address, CollateralType, Decimal, TokenKey};
use primitive_types::U256;
use serde::Serialize;

/// Per-type tuple as read from the resolver: every field is a fixed-scale integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPositionType {
    /// Compounding factor per elementary period (ray).
    pub rate_per_period: U256,
    /// Collateral spot price (ray).
    pub price: U256,
    /// Collateral-to-debt liquidation ratio (ray).
    pub liquidation_ratio: U256,
    /// Debt ceiling (wad).
    pub debt_ceiling: U256,
    /// Aggregate outstanding debt (wad).
    pub total_debt: U256,
}

/// Per-type tuples plus the redemption price they were read against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTypeBatch {
    /// Redemption price (ray).
    pub redemption_price: U256,
    /// One entry per requested collateral type, in request order.
    pub types: Vec<RawPositionType>,
}

/// Per-position tuple as read from the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPosition {
    pub id: u64,
    pub owner: Address,
    pub type_id: CollateralType,
    /// Locked collateral (wad).
    pub collateral: U256,
    /// Drawn debt (wad).
    pub debt: U256,
    /// Collateral already seized by liquidations (wad).
    pub liquidated_collateral: U256,
    pub rate_per_period: U256,
    pub price: U256,
    pub liquidation_ratio: U256,
    /// Protocol-specific handler address attached to the position.
    pub extra: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPositionBatch {
    pub redemption_price: U256,
    pub positions: Vec<RawPosition>,
}

/// Protocol-wide parameters for one collateral class.
///
/// Rebuilt wholesale on every refresh; never patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionType {
    pub type_id: CollateralType,
    pub collateral_token: TokenKey,
    pub debt_token: TokenKey,
    pub disabled: bool,
    /// Annualized compounding rate, 18 fractional digits.
    pub rate: Decimal,
    pub redemption_price: Decimal,
    pub spot_price: Decimal,
    /// Collateral price in USD (spot adjusted by the redemption price).
    pub price: Decimal,
    /// Debt-to-collateral factor, `1 / (collateral-to-debt ratio)`.
    pub liquidation_ratio: Decimal,
    pub debt_ceiling: Decimal,
    /// Aggregate debt with the fixed reporting buffer applied.
    pub total_debt: Decimal,
}

impl PositionType {
    /// True once buffered aggregate debt exceeds the ceiling.
    pub fn debt_ceiling_reached(&self) -> bool {
        self.total_debt > self.debt_ceiling
    }

    /// The empty position a user would open against this type.
    pub fn unopened_position(&self, owner: Address) -> Position {
        Position {
            id: 0,
            owner,
            type_id: self.type_id.clone(),
            collateral_token: self.collateral_token.clone(),
            debt_token: self.debt_token.clone(),
            collateral: Decimal::zero(),
            debt: Decimal::zero(),
            liquidated_collateral: Decimal::zero(),
            rate: self.rate,
            price: self.price,
            spot_price: self.spot_price,
            liquidation_ratio: self.liquidation_ratio,
            extra: None,
            net_value: Decimal::zero(),
            status: Decimal::zero(),
            liquidation_price: Decimal::zero(),
        }
    }
}

/// True if any type in the set has hit its debt ceiling.
pub fn any_debt_ceiling_reached(types: &[PositionType]) -> bool {
    types.iter().any(PositionType::debt_ceiling_reached)
}

/// One user's position against a collateral class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Zero for a position that has not been opened yet.
    pub id: u64,
    pub owner: Address,
    pub type_id: CollateralType,
    pub collateral_token: TokenKey,
    pub debt_token: TokenKey,
    pub collateral: Decimal,
    pub debt: Decimal,
    pub liquidated_collateral: Decimal,
    pub rate: Decimal,
    pub price: Decimal,
    pub spot_price: Decimal,
    pub liquidation_ratio: Decimal,
    pub extra: Option<Address>,
    /// `collateral * price - debt`.
    pub net_value: Decimal,
    /// Collateralization-risk ratio; `1.1` when collateral is gone but debt remains.
    pub status: Decimal,
    pub liquidation_price: Decimal,
}

impl Position {
    /// Opened means both collateral and debt are on the books.
    pub fn is_open(&self) -> bool {
        !self.collateral.is_zero() && !self.debt.is_zero()
    }

    pub fn is_new(&self) -> bool {
        self.id == 0
    }
}
