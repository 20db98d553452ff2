//! Data source abstraction for raw resolver reads and ordering-hint lookups.

use crate::domain::{Address, CollateralType, RawPositionBatch, RawTypeBatch};
use async_trait::async_trait;
use primitive_types::U256;
use std::fmt;

pub mod http;
pub mod mock;

pub use http::HttpDataSource;
pub use mock::{MockDataSource, MockHintSource};

/// Raw on-chain feed for collateral types and user positions.
///
/// Must tolerate being called again while an earlier call is still in flight;
/// staleness is handled by the caller.
#[async_trait]
pub trait DataSource: Send + Sync + fmt::Debug {
    /// Fetch per-type tuples for `types`.
    ///
    /// # Returns
    /// One raw tuple per requested type, in request order, plus the redemption price.
    async fn fetch_type_data(
        &self,
        types: &[CollateralType],
    ) -> Result<RawTypeBatch, DataSourceError>;

    /// Fetch every position owned by `owner`.
    async fn fetch_positions(&self, owner: &Address) -> Result<RawPositionBatch, DataSourceError>;
}

/// Two opaque addresses locating a position in the protocol's sorted list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionHints {
    pub upper: Address,
    pub lower: Address,
}

/// Lookup of sorted-list insertion hints for a prospective position.
#[async_trait]
pub trait HintSource: Send + Sync + fmt::Debug {
    /// # Arguments
    /// * `collateral` - Target total collateral in base units
    /// * `debt` - Target total debt in base units
    async fn position_hints(
        &self,
        collateral: U256,
        debt: U256,
    ) -> Result<PositionHints, DataSourceError>;
}

/// Error type for data source operations.
#[derive(Debug, Clone)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded (caller should implement backoff)
    RateLimited,
    /// Other error
    Other(String),
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::RateLimited => write!(f, "Rate limited"),
            DataSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}
