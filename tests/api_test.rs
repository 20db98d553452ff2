use axum::http::StatusCode;
use primitive_types::U256;
use spellcaster::api::{self, AppState};
use spellcaster::config::Config;
use spellcaster::datasource::{DataSourceError, MockDataSource, MockHintSource};
use spellcaster::domain::{
    Address, CollateralRegistry, CollateralType, RawPosition, RawPositionType, TokenRegistry,
    WorkingPrecision,
};
use spellcaster::engine::PositionComputer;
use spellcaster::orchestration::{ContextRefresher, StrategySession};
use spellcaster::strategy::{ProtocolParams, StrategyRegistry};
use spellcaster::{Decimal, SpellCompiler};
use std::str::FromStr;
use std::sync::Arc;
use tower::util::ServiceExt;

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

fn raw_type(liquidation_ratio: U256) -> RawPositionType {
    RawPositionType {
        rate_per_period: U256::exp10(27),
        price: ray(2000),
        liquidation_ratio,
        debt_ceiling: wad(1_000_000),
        total_debt: wad(1000),
    }
}

fn feed() -> MockDataSource {
    MockDataSource::new()
        .with_type("ETH-A", raw_type(U256::from(15u64) * U256::exp10(26)))
        .with_type("ETH-TROVE", raw_type(U256::from(11u64) * U256::exp10(26)))
        .with_position(RawPosition {
            id: 5,
            owner: Address::from_str(OWNER).unwrap(),
            type_id: CollateralType::new("ETH-TROVE"),
            collateral: wad(10),
            debt: wad(5000),
            liquidated_collateral: U256::zero(),
            rate_per_period: U256::exp10(27),
            price: ray(2000),
            liquidation_ratio: U256::from(11u64) * U256::exp10(26),
            extra: None,
        })
}

fn config() -> Config {
    Config {
        port: 0,
        feed_url: "http://example.invalid".to_string(),
        refresh_interval_ms: 15_000,
        working_precision: WorkingPrecision::default(),
        liquity: ProtocolParams::new(d("0.005"), d("0"), d("699")),
        reflexer: ProtocolParams::none(),
    }
}

async fn setup_test_app(feed: MockDataSource, refresh: bool) -> axum::Router {
    let config = config();
    let computer = PositionComputer::new(CollateralRegistry::mainnet(), config.working_precision);
    let refresher = Arc::new(ContextRefresher::new(Arc::new(feed), computer));
    if refresh {
        refresher.refresh().await.unwrap();
    }

    let session = Arc::new(StrategySession::new(
        refresher,
        StrategyRegistry::builtin(),
        TokenRegistry::mainnet(),
        SpellCompiler::new(Arc::new(MockHintSource::default())),
        config,
    ));
    api::create_router(AppState::new(session))
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    send(app, request).await
}

async fn post(app: axum::Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let request = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn send(
    app: axum::Router,
    request: axum::http::Request<axum::body::Body>,
) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_test_app(feed(), false).await;
    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ready_after_refresh() {
    let app = setup_test_app(feed(), false).await;
    let (status, body) = get(app, "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "data unavailable");

    let app = setup_test_app(feed(), true).await;
    let (status, body) = get(app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_position_types_endpoint() {
    let app = setup_test_app(feed(), true).await;
    let (status, body) = get(app, "/v1/position-types").await;
    assert_eq!(status, StatusCode::OK);

    let types = body["types"].as_array().unwrap();
    assert_eq!(types.len(), 2);
    assert_eq!(types[0]["typeId"], "ETH-A");
    assert_eq!(types[0]["rate"], "0.000000000000000000");
    assert_eq!(types[0]["price"], "2000");
    assert_eq!(body["debtCeilingReached"], false);
    assert!(body["fetchedAtMs"].is_i64());
}

#[tokio::test]
async fn test_position_types_unavailable() {
    let broken = feed().failing(DataSourceError::RateLimited);
    let app = setup_test_app(broken, true).await;
    let (status, body) = get(app, "/v1/position-types").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("unavailable"));
}

#[tokio::test]
async fn test_positions_endpoint() {
    let app = setup_test_app(feed(), true).await;
    let (status, body) = get(app.clone(), &format!("/v1/positions?owner={}", OWNER)).await;
    assert_eq!(status, StatusCode::OK);

    let positions = body["positions"].as_array().unwrap();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0]["id"], 5);
    assert_eq!(positions[0]["collateral"], "10");
    assert_eq!(positions[0]["debt"], "5000");
    assert_eq!(positions[0]["netValue"], "15000");
    assert_eq!(positions[0]["status"], "0.25");

    let (status, body) = get(app, "/v1/positions?owner=not-an-address").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid owner address");
}

#[tokio::test]
async fn test_positions_unavailable_when_read_fails() {
    let broken = feed().failing_positions(DataSourceError::NetworkError("reset".to_string()));
    let app = setup_test_app(broken, true).await;
    let (status, body) = get(app, &format!("/v1/positions?owner={}", OWNER)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Position data unavailable");
}

#[tokio::test]
async fn test_positions_empty_for_unknown_owner() {
    let app = setup_test_app(feed(), true).await;
    let (status, body) = get(
        app,
        "/v1/positions?owner=0x9999999999999999999999999999999999999999",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["positions"], serde_json::json!([]));
}

#[tokio::test]
async fn test_strategies_listing() {
    let app = setup_test_app(feed(), false).await;
    let (status, body) = get(app, "/v1/strategies").await;
    assert_eq!(status, StatusCode::OK);

    let strategies = body["strategies"].as_array().unwrap();
    let ids: Vec<&str> = strategies
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"liquity-deposit-and-borrow"));
    assert!(ids.contains(&"reflexer-deposit-and-generate"));

    let liquity = strategies
        .iter()
        .find(|s| s["id"] == "liquity-deposit-and-borrow")
        .unwrap();
    assert_eq!(liquity["protocol"], "liquity");
    let fields = liquity["fields"].as_array().unwrap();
    assert_eq!(fields[0]["kind"], "input");
    assert_eq!(fields[0]["token"], "ETH");
    assert_eq!(fields[1]["placeholder"], "LUSD to Borrow");
}

#[tokio::test]
async fn test_evaluate_endpoint() {
    let app = setup_test_app(feed(), true).await;
    let body = serde_json::json!({
        "owner": OWNER,
        "inputs": ["0", "100"],
        "balances": {"eth": "10"}
    });
    let (status, body) = post(app, "/v1/strategies/liquity-deposit-and-borrow/evaluate", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["strategy"], "liquity-deposit-and-borrow");
    assert_eq!(body["state"], "ready");
    assert_eq!(body["noop"], false);

    let fields = body["fields"].as_array().unwrap();
    assert_eq!(fields[3]["status"], "1.1");
    assert_eq!(fields[4]["amount"], "2200");
    assert_eq!(fields[4]["value"], "$2,000.00 / $2,000.00");
}

#[tokio::test]
async fn test_evaluate_invalid_reports_message() {
    let app = setup_test_app(feed(), true).await;
    let body = serde_json::json!({
        "owner": OWNER,
        "inputs": ["50", "100"],
        "balances": {"eth": "10"}
    });
    let (status, body) = post(app, "/v1/strategies/liquity-deposit-and-borrow/evaluate", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "invalid");
    assert_eq!(body["message"], "Your amount exceeds your maximum limit of 10.00 ETH");
}

#[tokio::test]
async fn test_compile_endpoint() {
    let app = setup_test_app(feed(), true).await;
    let body = serde_json::json!({
        "owner": "0x3333333333333333333333333333333333333333",
        "inputs": ["1", "500"],
        "balances": {"eth": "10"}
    });
    let (status, body) = post(app, "/v1/strategies/reflexer-deposit-and-generate/compile", body).await;
    assert_eq!(status, StatusCode::OK);

    let spell = body["spell"].as_array().unwrap();
    assert_eq!(spell.len(), 4);
    assert_eq!(spell[0]["method"], "open");
    assert_eq!(spell[2]["setIds"], serde_json::json!([0, 2, 0, 0]));
    assert_eq!(spell[3]["getIds"], serde_json::json!([0, 2, 0, 0]));
    assert_eq!(body["fingerprint"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn test_compile_rejects_invalid_state() {
    let app = setup_test_app(feed(), true).await;
    let body = serde_json::json!({
        "owner": "0x3333333333333333333333333333333333333333",
        "inputs": ["1", "1000"],
        "balances": {"eth": "10"}
    });
    let (status, body) = post(app, "/v1/strategies/liquity-deposit-and-borrow/compile", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("You should open new trove first"));
}

#[tokio::test]
async fn test_compile_without_data_is_unavailable() {
    let broken = feed().failing(DataSourceError::RateLimited);
    let app = setup_test_app(broken, true).await;
    let body = serde_json::json!({"owner": OWNER, "inputs": ["1", "500"]});
    let (status, _) = post(app, "/v1/strategies/reflexer-deposit-and-generate/compile", body).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_strategy_is_not_found() {
    let app = setup_test_app(feed(), true).await;
    let body = serde_json::json!({"owner": OWNER});
    let (status, _) = post(app, "/v1/strategies/nope/evaluate", body).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
