//! HTTP resolver gateway client.
//!
//! The gateway fronts the on-chain resolver contracts and answers with the raw
//! tuples as JSON arrays, integers encoded as decimal strings.

use super::{DataSource, DataSourceError, HintSource, PositionHints};
use crate::domain::{
    Address, CollateralType, RawPosition, RawPositionBatch, RawPositionType, RawTypeBatch,
};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use primitive_types::U256;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Data source backed by the resolver gateway.
#[derive(Debug, Clone)]
pub struct HttpDataSource {
    client: Client,
    base_url: String,
}

impl HttpDataSource {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post(
        &self,
        path: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, DataSourceError> {
        let url = format!("{}{}", self.base_url, path);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .post(&url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| {
                    backoff::Error::transient(DataSourceError::NetworkError(e.to_string()))
                })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(DataSourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(DataSourceError::ParseError(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch_type_data(
        &self,
        types: &[CollateralType],
    ) -> Result<RawTypeBatch, DataSourceError> {
        debug!("Fetching type data for {} types", types.len());

        let payload = serde_json::json!({
            "types": types.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
        });
        let response = self.post("/v1/types", payload).await?;

        let redemption_price = parse_u256(response.get("redemptionPrice"), "redemptionPrice")?;
        let rows = response
            .get("types")
            .and_then(|v| v.as_array())
            .ok_or_else(|| DataSourceError::ParseError("Expected types array".to_string()))?;

        if rows.len() != types.len() {
            return Err(DataSourceError::ParseError(format!(
                "Expected {} type rows, got {}",
                types.len(),
                rows.len()
            )));
        }

        let types = rows
            .iter()
            .map(parse_type_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RawTypeBatch {
            redemption_price,
            types,
        })
    }

    async fn fetch_positions(&self, owner: &Address) -> Result<RawPositionBatch, DataSourceError> {
        debug!("Fetching positions for owner={}", owner);

        let payload = serde_json::json!({ "owner": owner.as_str() });
        let response = self.post("/v1/positions", payload).await?;

        parse_position_batch(&response)
    }
}

#[async_trait]
impl HintSource for HttpDataSource {
    async fn position_hints(
        &self,
        collateral: U256,
        debt: U256,
    ) -> Result<PositionHints, DataSourceError> {
        debug!("Fetching hints for collateral={}, debt={}", collateral, debt);

        let payload = serde_json::json!({
            "collateral": collateral.to_string(),
            "debt": debt.to_string(),
        });
        let response = self.post("/v1/hints", payload).await?;

        Ok(PositionHints {
            upper: parse_address(response.get("upperHint"), "upperHint")?,
            lower: parse_address(response.get("lowerHint"), "lowerHint")?,
        })
    }
}

fn parse_u256(value: Option<&serde_json::Value>, field: &str) -> Result<U256, DataSourceError> {
    let value = value.ok_or_else(|| DataSourceError::ParseError(format!("Missing {} field", field)))?;
    let text = match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) if n.is_u64() => n.to_string(),
        _ => {
            return Err(DataSourceError::ParseError(format!(
                "Field {} is not an unsigned integer",
                field
            )))
        }
    };
    U256::from_dec_str(text.trim())
        .map_err(|e| DataSourceError::ParseError(format!("Invalid {}: {:?}", field, e)))
}

fn parse_address(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<Address, DataSourceError> {
    let text = value
        .and_then(|v| v.as_str())
        .ok_or_else(|| DataSourceError::ParseError(format!("Missing {} field", field)))?;
    text.parse::<Address>().map_err(DataSourceError::ParseError)
}

fn parse_type_row(row: &serde_json::Value) -> Result<RawPositionType, DataSourceError> {
    let cells = row
        .as_array()
        .filter(|cells| cells.len() >= 5)
        .ok_or_else(|| DataSourceError::ParseError("Type row needs 5 cells".to_string()))?;

    Ok(RawPositionType {
        rate_per_period: parse_u256(cells.first(), "rate")?,
        price: parse_u256(cells.get(1), "price")?,
        liquidation_ratio: parse_u256(cells.get(2), "liquidationRatio")?,
        debt_ceiling: parse_u256(cells.get(3), "debtCeiling")?,
        total_debt: parse_u256(cells.get(4), "totalDebt")?,
    })
}

/// One bad row rejects the whole batch; a dropped row would read as a
/// missing position.
fn parse_position_batch(response: &serde_json::Value) -> Result<RawPositionBatch, DataSourceError> {
    let redemption_price = parse_u256(response.get("redemptionPrice"), "redemptionPrice")?;
    let rows = response
        .get("positions")
        .and_then(|v| v.as_array())
        .ok_or_else(|| DataSourceError::ParseError("Expected positions array".to_string()))?;

    let positions = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            parse_position_row(row).map_err(|e| {
                warn!("Rejecting position batch, row {} is malformed: {}", index, e);
                e
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RawPositionBatch {
        redemption_price,
        positions,
    })
}

// Cell 4 carries a value the resolver reports but nothing here consumes.
fn parse_position_row(row: &serde_json::Value) -> Result<RawPosition, DataSourceError> {
    let cells = row
        .as_array()
        .filter(|cells| cells.len() >= 10)
        .ok_or_else(|| DataSourceError::ParseError("Position row needs 10 cells".to_string()))?;

    let id = parse_u256(cells.first(), "id")?;
    if id > U256::from(u64::MAX) {
        return Err(DataSourceError::ParseError("Position id out of range".to_string()));
    }
    let type_id = cells
        .get(2)
        .and_then(|v| v.as_str())
        .ok_or_else(|| DataSourceError::ParseError("Missing type field".to_string()))?;
    let extra = match cells.get(10) {
        Some(serde_json::Value::String(_)) => Some(parse_address(cells.get(10), "extra")?),
        _ => None,
    };

    Ok(RawPosition {
        id: id.as_u64(),
        owner: parse_address(cells.get(1), "owner")?,
        type_id: CollateralType::new(type_id),
        collateral: parse_u256(cells.get(3), "collateral")?,
        debt: parse_u256(cells.get(5), "debt")?,
        liquidated_collateral: parse_u256(cells.get(6), "liquidatedCollateral")?,
        rate_per_period: parse_u256(cells.get(7), "rate")?,
        price: parse_u256(cells.get(8), "price")?,
        liquidation_ratio: parse_u256(cells.get(9), "liquidationRatio")?,
        extra,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_u256_accepts_strings_and_small_numbers() {
        let big = json!("2000000000000000000000000000000");
        assert_eq!(
            parse_u256(Some(&big), "x").unwrap(),
            U256::from(2000u64) * U256::exp10(27)
        );
        assert_eq!(parse_u256(Some(&json!(42)), "x").unwrap(), U256::from(42u64));
        assert!(parse_u256(Some(&json!(-1)), "x").is_err());
        assert!(parse_u256(None, "x").is_err());
    }

    #[test]
    fn test_parse_type_row() {
        let row = json!(["1000000000000000000000000000", "2", "3", "4", "5"]);
        let parsed = parse_type_row(&row).unwrap();
        assert_eq!(parsed.rate_per_period, U256::exp10(27));
        assert_eq!(parsed.total_debt, U256::from(5u64));
        assert!(parse_type_row(&json!(["1", "2"])).is_err());
    }

    #[test]
    fn test_parse_position_row_skips_unused_cell() {
        let row = json!([
            "12",
            "0x0000000000000000000000000000000000000abc",
            "ETH-A",
            "1000000000000000000",
            "999",
            "500000000000000000000",
            "0",
            "1000000000000000000000000000",
            "2000000000000000000000000000000",
            "1500000000000000000000000000",
            "0x0000000000000000000000000000000000000def"
        ]);
        let parsed = parse_position_row(&row).unwrap();
        assert_eq!(parsed.id, 12);
        assert_eq!(parsed.type_id, CollateralType::new("ETH-A"));
        assert_eq!(parsed.debt, U256::from(500u64) * U256::exp10(18));
        assert!(parsed.extra.is_some());
    }

    fn position_row(id: &str) -> serde_json::Value {
        json!([
            id,
            "0x0000000000000000000000000000000000000abc",
            "ETH-A",
            "1000000000000000000",
            "0",
            "500000000000000000000",
            "0",
            "1000000000000000000000000000",
            "2000000000000000000000000000000",
            "1500000000000000000000000000"
        ])
    }

    #[test]
    fn test_parse_position_batch() {
        let response = json!({
            "redemptionPrice": "1000000000000000000000000000",
            "positions": [position_row("1"), position_row("2")]
        });
        let batch = parse_position_batch(&response).unwrap();
        assert_eq!(batch.redemption_price, U256::exp10(27));
        assert_eq!(batch.positions.len(), 2);

        let empty = json!({"redemptionPrice": "1", "positions": []});
        assert!(parse_position_batch(&empty).unwrap().positions.is_empty());
    }

    #[test]
    fn test_bad_position_row_rejects_batch() {
        let response = json!({
            "redemptionPrice": "1000000000000000000000000000",
            "positions": [position_row("1"), position_row("not-a-number")]
        });
        assert!(matches!(
            parse_position_batch(&response),
            Err(DataSourceError::ParseError(_))
        ));

        let truncated = json!({
            "redemptionPrice": "1",
            "positions": [["7", "0x0000000000000000000000000000000000000abc", "ETH-A"]]
        });
        assert!(matches!(
            parse_position_batch(&truncated),
            Err(DataSourceError::ParseError(_))
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let source = HttpDataSource::new("http://localhost:9000/".to_string());
        assert_eq!(source.base_url, "http://localhost:9000");
    }
}
