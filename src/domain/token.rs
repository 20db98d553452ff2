//! Static token and collateral-class catalogues.

use super::primitives::{Address, CollateralType, TokenKey};
use serde::Serialize;

/// An ERC-20 (or native) token the strategies can reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub key: TokenKey,
    pub symbol: String,
    pub address: Address,
    /// On-chain decimals; amounts are converted with `value * 10^decimals`.
    pub decimals: u32,
}

impl Token {
    fn new(key: &str, symbol: &str, address: &str, decimals: u32) -> Self {
        Self {
            key: TokenKey::new(key),
            symbol: symbol.to_string(),
            address: Address::new(address.to_string()),
            decimals,
        }
    }
}

/// Known tokens, looked up by key.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: Vec<Token>,
}

impl TokenRegistry {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Mainnet tokens used by the bundled strategies.
    pub fn mainnet() -> Self {
        Self::new(vec![
            Token::new("eth", "ETH", "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE", 18),
            Token::new("lusd", "LUSD", "0x5f98805A4E8be255a32880FDeC7F6728C6568bA0", 18),
            Token::new("rai", "RAI", "0x03ab458634910AaD20eF5f1C8ee96F1D6ac54919", 18),
            Token::new("dai", "DAI", "0x6B175474E89094C44Da98b954EedeAC495271d0F", 18),
            Token::new("usdc", "USDC", "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", 6),
        ])
    }

    pub fn get(&self, key: &TokenKey) -> Option<&Token> {
        self.tokens.iter().find(|t| &t.key == key)
    }

    pub fn by_key(&self, key: &str) -> Option<&Token> {
        self.get(&TokenKey::new(key))
    }

    pub fn all(&self) -> &[Token] {
        &self.tokens
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::mainnet()
    }
}

/// A collateral class: which token backs it and which token is drawn against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollateralClass {
    pub type_id: CollateralType,
    pub collateral_token: TokenKey,
    pub debt_token: TokenKey,
    pub disabled: bool,
}

impl CollateralClass {
    pub fn new(type_id: &str, collateral_token: &str, debt_token: &str) -> Self {
        Self {
            type_id: CollateralType::new(type_id),
            collateral_token: TokenKey::new(collateral_token),
            debt_token: TokenKey::new(debt_token),
            disabled: false,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// Ordered list of collateral classes. Raw per-type feed data is returned in this order.
#[derive(Debug, Clone)]
pub struct CollateralRegistry {
    classes: Vec<CollateralClass>,
}

impl CollateralRegistry {
    pub fn new(classes: Vec<CollateralClass>) -> Self {
        Self { classes }
    }

    pub fn mainnet() -> Self {
        Self::new(vec![
            CollateralClass::new("ETH-A", "eth", "rai"),
            CollateralClass::new("ETH-TROVE", "eth", "lusd"),
        ])
    }

    pub fn classes(&self) -> &[CollateralClass] {
        &self.classes
    }

    pub fn type_ids(&self) -> Vec<CollateralType> {
        self.classes.iter().map(|c| c.type_id.clone()).collect()
    }

    pub fn get(&self, type_id: &CollateralType) -> Option<&CollateralClass> {
        self.classes.iter().find(|c| &c.type_id == type_id)
    }
}

impl Default for CollateralRegistry {
    fn default() -> Self {
        Self::mainnet()
    }
}
