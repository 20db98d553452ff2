//! Mock data sources for testing without network calls.

use super::{DataSource, DataSourceError, HintSource, PositionHints};
use crate::domain::{
    Address, CollateralType, RawPosition, RawPositionBatch, RawPositionType, RawTypeBatch,
};
use async_trait::async_trait;
use primitive_types::U256;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock feed that returns predefined raw tuples.
#[derive(Debug, Clone)]
pub struct MockDataSource {
    redemption_price: U256,
    types: Vec<(CollateralType, RawPositionType)>,
    positions: Vec<RawPosition>,
    failure: Option<DataSourceError>,
    position_failure: Option<DataSourceError>,
    calls: Arc<AtomicUsize>,
}

impl MockDataSource {
    /// Create a new mock with a redemption price of exactly one (ray).
    pub fn new() -> Self {
        Self {
            redemption_price: U256::exp10(27),
            types: Vec::new(),
            positions: Vec::new(),
            failure: None,
            position_failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the raw redemption price (ray) returned with every batch.
    pub fn with_redemption_price(mut self, redemption_price: U256) -> Self {
        self.redemption_price = redemption_price;
        self
    }

    /// Register raw type data for `type_id`.
    pub fn with_type(mut self, type_id: &str, raw: RawPositionType) -> Self {
        self.types.push((CollateralType::new(type_id), raw));
        self
    }

    /// Add a raw position.
    pub fn with_position(mut self, position: RawPosition) -> Self {
        self.positions.push(position);
        self
    }

    /// Make every call fail with `error`.
    pub fn failing(mut self, error: DataSourceError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Serve type data but fail every position read with `error`.
    pub fn failing_positions(mut self, error: DataSourceError) -> Self {
        self.position_failure = Some(error);
        self
    }

    /// Number of fetch calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) -> Result<(), DataSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl Default for MockDataSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    async fn fetch_type_data(
        &self,
        types: &[CollateralType],
    ) -> Result<RawTypeBatch, DataSourceError> {
        self.record_call()?;
        let mut raw = Vec::with_capacity(types.len());
        for type_id in types {
            let entry = self
                .types
                .iter()
                .find(|(id, _)| id == type_id)
                .map(|(_, data)| data.clone())
                .ok_or_else(|| DataSourceError::Other(format!("unknown type {}", type_id)))?;
            raw.push(entry);
        }
        Ok(RawTypeBatch {
            redemption_price: self.redemption_price,
            types: raw,
        })
    }

    async fn fetch_positions(&self, owner: &Address) -> Result<RawPositionBatch, DataSourceError> {
        self.record_call()?;
        if let Some(err) = &self.position_failure {
            return Err(err.clone());
        }
        Ok(RawPositionBatch {
            redemption_price: self.redemption_price,
            positions: self
                .positions
                .iter()
                .filter(|p| &p.owner == owner)
                .cloned()
                .collect(),
        })
    }
}

/// Mock hint lookup that answers with fixed hints or a fixed error.
#[derive(Debug, Clone)]
pub struct MockHintSource {
    answer: Result<PositionHints, DataSourceError>,
    calls: Arc<AtomicUsize>,
}

impl MockHintSource {
    pub fn new(upper: Address, lower: Address) -> Self {
        Self {
            answer: Ok(PositionHints { upper, lower }),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(error: DataSourceError) -> Self {
        Self {
            answer: Err(error),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockHintSource {
    fn default() -> Self {
        Self::new(Address::zero(), Address::zero())
    }
}

#[async_trait]
impl HintSource for MockHintSource {
    async fn position_hints(
        &self,
        _collateral: U256,
        _debt: U256,
    ) -> Result<PositionHints, DataSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}
