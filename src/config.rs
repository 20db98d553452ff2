use crate::domain::{Decimal, WorkingPrecision};
use crate::strategy::{Protocol, ProtocolParams};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub feed_url: String,
    pub refresh_interval_ms: u64,
    pub working_precision: WorkingPrecision,
    pub liquity: ProtocolParams,
    pub reflexer: ProtocolParams,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let feed_url = env_map
            .get("FEED_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("FEED_URL".to_string()))?;

        let refresh_interval_ms = env_map
            .get("REFRESH_INTERVAL_MS")
            .map(|s| s.as_str())
            .unwrap_or("15000")
            .parse::<u64>()
            .ok()
            .filter(|ms| *ms > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "REFRESH_INTERVAL_MS".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let working_precision = env_map
            .get("WORKING_PRECISION")
            .map(|s| s.as_str())
            .unwrap_or("27")
            .parse::<u32>()
            .ok()
            .and_then(|digits| WorkingPrecision::new(digits).ok())
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "WORKING_PRECISION".to_string(),
                    format!(
                        "must be between {} and {}",
                        WorkingPrecision::MIN,
                        WorkingPrecision::MAX
                    ),
                )
            })?;

        let liquity = ProtocolParams::new(
            non_negative(&env_map, "BORROW_FEE", "0.005")?,
            non_negative(&env_map, "LIQUIDATION_RESERVE", "0")?,
            non_negative(&env_map, "MIN_DEBT", "699")?,
        );
        let reflexer = ProtocolParams::new(
            Decimal::zero(),
            Decimal::zero(),
            non_negative(&env_map, "REFLEXER_MIN_DEBT", "0")?,
        );

        Ok(Config {
            port,
            feed_url,
            refresh_interval_ms,
            working_precision,
            liquity,
            reflexer,
        })
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn params_for(&self, protocol: Protocol) -> ProtocolParams {
        match protocol {
            Protocol::Liquity => self.liquity,
            Protocol::Reflexer => self.reflexer,
        }
    }
}

fn non_negative(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
) -> Result<Decimal, ConfigError> {
    env_map
        .get(key)
        .map(|s| s.as_str())
        .unwrap_or(default)
        .parse::<Decimal>()
        .ok()
        .filter(|value| !value.is_negative())
        .ok_or_else(|| {
            ConfigError::InvalidValue(key.to_string(), "must be a non-negative decimal".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("FEED_URL".to_string(), "http://localhost:9000".to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.refresh_interval(), Duration::from_millis(15_000));
        assert_eq!(config.working_precision.digits(), 27);
        assert_eq!(config.liquity.borrow_fee.to_string(), "0.005");
        assert_eq!(config.liquity.min_debt.to_string(), "699");
        assert!(config.reflexer.min_debt.is_zero());
        assert_eq!(config.params_for(Protocol::Liquity), config.liquity);
    }

    #[test]
    fn test_missing_feed_url() {
        let result = Config::from_env_map(HashMap::new());
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "FEED_URL"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_working_precision_out_of_range() {
        let mut env_map = setup_required_env();
        env_map.insert("WORKING_PRECISION".to_string(), "40".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "WORKING_PRECISION"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_zero_refresh_interval_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("REFRESH_INTERVAL_MS".to_string(), "0".to_string());
        assert!(matches!(
            Config::from_env_map(env_map),
            Err(ConfigError::InvalidValue(k, _)) if k == "REFRESH_INTERVAL_MS"
        ));
    }

    #[test]
    fn test_negative_borrow_fee_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("BORROW_FEE".to_string(), "-0.01".to_string());
        assert!(matches!(
            Config::from_env_map(env_map),
            Err(ConfigError::InvalidValue(k, _)) if k == "BORROW_FEE"
        ));
    }
}
