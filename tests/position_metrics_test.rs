//! Position computation against a mock resolver feed.

use primitive_types::U256;
use spellcaster::datasource::{DataSourceError, MockDataSource};
use spellcaster::domain::{
    any_debt_ceiling_reached, Address, CollateralClass, CollateralRegistry, CollateralType,
    Decimal, RawPosition, RawPositionType, WorkingPrecision,
};
use spellcaster::engine::PositionComputer;
use std::str::FromStr;

const OWNER: &str = "0x1111111111111111111111111111111111111111";

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn ray(n: u64) -> U256 {
    U256::from(n) * U256::exp10(27)
}

fn wad(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

fn owner() -> Address {
    Address::from_str(OWNER).unwrap()
}

fn registry() -> CollateralRegistry {
    CollateralRegistry::new(vec![
        CollateralClass::new("ETH-A", "eth", "rai"),
        CollateralClass::new("ETH-B", "eth", "rai").disabled(),
    ])
}

fn reference_type() -> RawPositionType {
    RawPositionType {
        rate_per_period: U256::exp10(27),
        price: ray(2000),
        liquidation_ratio: U256::from(15u64) * U256::exp10(26),
        debt_ceiling: wad(5_000_000),
        total_debt: wad(4_000_000),
    }
}

fn raw_position(id: u64, type_id: &str, collateral: U256, debt: U256) -> RawPosition {
    RawPosition {
        id,
        owner: owner(),
        type_id: CollateralType::new(type_id),
        collateral,
        debt,
        liquidated_collateral: U256::zero(),
        rate_per_period: U256::from_dec_str("1000000000627937192491029810").unwrap(),
        price: ray(2000),
        liquidation_ratio: U256::from(15u64) * U256::exp10(26),
        extra: Some(Address::from_str("0x2222222222222222222222222222222222222222").unwrap()),
    }
}

fn feed() -> MockDataSource {
    MockDataSource::new()
        .with_type("ETH-A", reference_type())
        .with_type(
            "ETH-B",
            RawPositionType {
                debt_ceiling: wad(100),
                total_debt: wad(100),
                ..reference_type()
            },
        )
        .with_position(raw_position(1, "ETH-A", wad(3), wad(1500)))
        .with_position(raw_position(2, "ETH-A", U256::zero(), wad(100)))
        .with_position(raw_position(3, "ETH-A", U256::zero(), U256::zero()))
}

#[tokio::test]
async fn test_reference_type_tuple() {
    let computer = PositionComputer::new(registry(), WorkingPrecision::default());
    let types = computer.load_types(&feed()).await.unwrap();
    assert_eq!(types.len(), 2);

    let eth_a = &types[0];
    assert_eq!(eth_a.type_id, CollateralType::new("ETH-A"));
    assert_eq!(eth_a.rate.to_fixed(18), "0.000000000000000000");
    assert_eq!(eth_a.price, d("2000"));
    assert_eq!(eth_a.liquidation_ratio.to_fixed(18), "0.666666666666666667");
    assert!(!eth_a.disabled);
    assert!(types[1].disabled);
}

#[tokio::test]
async fn test_debt_ceiling_flag_over_type_set() {
    let computer = PositionComputer::new(registry(), WorkingPrecision::default());
    let types = computer.load_types(&feed()).await.unwrap();

    // ETH-B: 100 * 1.00002 > 100
    assert!(!types[0].debt_ceiling_reached());
    assert!(types[1].debt_ceiling_reached());
    assert!(any_debt_ceiling_reached(&types));
}

#[tokio::test]
async fn test_position_metrics() {
    let computer = PositionComputer::new(registry(), WorkingPrecision::default());
    let positions = computer.load_positions(&feed(), &owner()).await.unwrap().unwrap();
    assert_eq!(positions.len(), 3);

    let open = &positions[0];
    assert_eq!(open.collateral, d("3"));
    assert_eq!(open.debt, d("1500"));
    assert_eq!(open.net_value, d("4500"));
    assert_eq!(open.status, d("0.25"));
    assert!(open.rate > d("0.0199") && open.rate < d("0.0201"));
    assert!(open.extra.is_some());

    let drained = &positions[1];
    assert_eq!(drained.status, d("1.1"));
    assert_eq!(drained.liquidation_price, d("2200"));

    let empty = &positions[2];
    assert!(empty.status.is_zero());
    assert!(empty.liquidation_price.is_zero());
}

#[tokio::test]
async fn test_rate_is_deterministic() {
    let computer = PositionComputer::new(registry(), WorkingPrecision::default());
    let first = computer.load_positions(&feed(), &owner()).await.unwrap().unwrap();
    let second = computer.load_positions(&feed(), &owner()).await.unwrap().unwrap();
    assert_eq!(first[0].rate.to_fixed(18), second[0].rate.to_fixed(18));
}

#[tokio::test]
async fn test_other_owner_sees_nothing() {
    let computer = PositionComputer::new(registry(), WorkingPrecision::default());
    let stranger = Address::from_str("0x9999999999999999999999999999999999999999").unwrap();
    assert_eq!(
        computer.load_positions(&feed(), &stranger).await.unwrap(),
        Some(Vec::new())
    );
}

#[tokio::test]
async fn test_failing_feed_is_unavailable() {
    let computer = PositionComputer::new(registry(), WorkingPrecision::default());
    let broken = feed().failing(DataSourceError::HttpError {
        status: 503,
        message: "Server error".to_string(),
    });

    assert!(computer.load_types(&broken).await.unwrap().is_empty());
    assert!(computer.load_positions(&broken, &owner()).await.unwrap().is_none());
}
