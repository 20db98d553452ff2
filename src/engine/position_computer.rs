//! Position computation: raw resolver tuples to display-scale records.
//!
//! All arithmetic is exact; prices and ratios arrive as rays, amounts as wads.
//! Feed failures degrade to empty results, arithmetic failures do not.

use crate::datasource::DataSource;
use crate::domain::ray::{compound_rate, RAY_DECIMALS, WAD_DECIMALS};
use crate::domain::{
    Address, ArithmeticError, CollateralRegistry, Decimal, Position, PositionType, RawPosition,
    RawPositionBatch, RawPositionType, RawTypeBatch, WorkingPrecision,
};
use crate::engine::risk;
use primitive_types::U256;
use rust_decimal::Decimal as RustDecimal;
use tracing::{debug, warn};

/// Elementary compounding periods per year.
pub const PERIODS_PER_YEAR: u64 = 31_545_000;

/// Reporting buffer applied to aggregate debt (`1.00002`).
pub fn total_debt_buffer() -> Decimal {
    Decimal::new(RustDecimal::new(100_002, 5))
}

/// Derives [`PositionType`] and [`Position`] records for a collateral registry.
#[derive(Debug, Clone)]
pub struct PositionComputer {
    collaterals: CollateralRegistry,
    precision: WorkingPrecision,
}

impl PositionComputer {
    pub fn new(collaterals: CollateralRegistry, precision: WorkingPrecision) -> Self {
        Self {
            collaterals,
            precision,
        }
    }

    pub fn collaterals(&self) -> &CollateralRegistry {
        &self.collaterals
    }

    /// Compute one [`PositionType`] per registry entry, pairing by index.
    ///
    /// A batch whose length does not match the registry is treated as
    /// unavailable data and yields an empty list.
    pub fn compute_types(&self, batch: &RawTypeBatch) -> Result<Vec<PositionType>, ArithmeticError> {
        let classes = self.collaterals.classes();
        if batch.types.len() != classes.len() {
            warn!(
                "Type batch has {} entries for {} registered types, discarding",
                batch.types.len(),
                classes.len()
            );
            return Ok(Vec::new());
        }

        let redemption_price = from_ray(batch.redemption_price)?;
        classes
            .iter()
            .zip(&batch.types)
            .map(|(class, raw)| {
                let RawPositionType {
                    rate_per_period,
                    price,
                    liquidation_ratio,
                    debt_ceiling,
                    total_debt,
                } = raw;

                Ok::<_, ArithmeticError>(PositionType {
                    type_id: class.type_id.clone(),
                    collateral_token: class.collateral_token.clone(),
                    debt_token: class.debt_token.clone(),
                    disabled: class.disabled,
                    rate: compound_rate(*rate_per_period, PERIODS_PER_YEAR, self.precision)?,
                    redemption_price,
                    spot_price: from_ray(*price)?,
                    price: usd_price(*price, batch.redemption_price)?,
                    liquidation_ratio: debt_factor(*liquidation_ratio)?,
                    debt_ceiling: from_wad(*debt_ceiling)?,
                    total_debt: from_wad(*total_debt)?.checked_mul(total_debt_buffer())?,
                })
            })
            .collect()
    }

    /// Compute every position whose type is registered; others are skipped.
    pub fn compute_positions(
        &self,
        batch: &RawPositionBatch,
    ) -> Result<Vec<Position>, ArithmeticError> {
        let mut positions = Vec::with_capacity(batch.positions.len());
        for raw in &batch.positions {
            match self.compute_position(raw, batch.redemption_price)? {
                Some(position) => positions.push(position),
                None => warn!(
                    "Skipping position {} with unregistered type {}",
                    raw.id, raw.type_id
                ),
            }
        }
        Ok(positions)
    }

    fn compute_position(
        &self,
        raw: &RawPosition,
        redemption_price: U256,
    ) -> Result<Option<Position>, ArithmeticError> {
        let Some(class) = self.collaterals.get(&raw.type_id) else {
            return Ok(None);
        };

        let collateral = from_wad(raw.collateral)?;
        let debt = from_wad(raw.debt)?;
        let spot_price = from_ray(raw.price)?;
        let price = usd_price(raw.price, redemption_price)?;
        let liquidation_ratio = debt_factor(raw.liquidation_ratio)?;

        Ok(Some(Position {
            id: raw.id,
            owner: raw.owner.clone(),
            type_id: raw.type_id.clone(),
            collateral_token: class.collateral_token.clone(),
            debt_token: class.debt_token.clone(),
            collateral,
            debt,
            liquidated_collateral: from_wad(raw.liquidated_collateral)?,
            rate: compound_rate(raw.rate_per_period, PERIODS_PER_YEAR, self.precision)?,
            price,
            spot_price,
            liquidation_ratio,
            extra: raw.extra.clone(),
            net_value: collateral.checked_mul(price)?.checked_sub(debt)?,
            status: risk::status(collateral, debt, spot_price)?,
            liquidation_price: risk::liquidation_price(collateral, debt, liquidation_ratio, price)?,
        }))
    }

    /// Fetch and compute all registered types.
    ///
    /// A feed failure is logged and yields an empty list.
    pub async fn load_types(
        &self,
        source: &dyn DataSource,
    ) -> Result<Vec<PositionType>, ArithmeticError> {
        let type_ids = self.collaterals.type_ids();
        match source.fetch_type_data(&type_ids).await {
            Ok(batch) => {
                let types = self.compute_types(&batch)?;
                debug!("Computed {} position types", types.len());
                Ok(types)
            }
            Err(e) => {
                warn!("Type data unavailable: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Fetch and compute all positions owned by `owner`.
    ///
    /// # Returns
    /// `None` when the feed failed. An owner without positions gets
    /// `Some(vec![])`.
    pub async fn load_positions(
        &self,
        source: &dyn DataSource,
        owner: &Address,
    ) -> Result<Option<Vec<Position>>, ArithmeticError> {
        match source.fetch_positions(owner).await {
            Ok(batch) => self.compute_positions(&batch).map(Some),
            Err(e) => {
                warn!("Positions for {} unavailable: {}", owner, e);
                Ok(None)
            }
        }
    }
}

fn from_ray(raw: U256) -> Result<Decimal, ArithmeticError> {
    Decimal::from_scaled(raw, RAY_DECIMALS)
}

fn from_wad(raw: U256) -> Result<Decimal, ArithmeticError> {
    Decimal::from_scaled(raw, WAD_DECIMALS)
}

/// `price * redemption_price / 1e54`, multiplied before scaling down.
fn usd_price(price: U256, redemption_price: U256) -> Result<Decimal, ArithmeticError> {
    let product = price
        .checked_mul(redemption_price)
        .ok_or(ArithmeticError::Overflow)?;
    Decimal::from_scaled(product, 2 * RAY_DECIMALS)
}

/// `1 / (ratio / 1e27)`.
fn debt_factor(ratio: U256) -> Result<Decimal, ArithmeticError> {
    Decimal::one().checked_div(from_ray(ratio)?)
}
