//! Domain types for collateralized-debt positions and compiled spells.
//!
//! This module provides:
//! - Lossless numeric handling via the Decimal wrapper and 256-bit ray math
//! - Domain primitives: TimeMs, Address, TokenKey, CollateralType
//! - Token and collateral-class registries
//! - Raw on-chain tuples and the Position / PositionType records derived from them
//! - Operation descriptors and register slots

pub mod decimal;
pub mod position;
pub mod primitives;
pub mod ray;
pub mod spell;
pub mod token;

pub use decimal::{ArithmeticError, Decimal};
pub use position::{
    any_debt_ceiling_reached, Position, PositionType, RawPosition, RawPositionBatch,
    RawPositionType, RawTypeBatch,
};
pub use primitives::{Address, CollateralType, TimeMs, TokenKey};
pub use ray::WorkingPrecision;
pub use spell::{OperationDescriptor, RegisterSlots, Spell};
pub use token::{CollateralClass, CollateralRegistry, Token, TokenRegistry};
