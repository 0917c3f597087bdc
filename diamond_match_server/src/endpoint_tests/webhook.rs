use actix_web::{http::StatusCode, web, web::ServiceConfig};
use diamond_match_engine::{
    db_types::{ClarityGrade, ColorGrade, Dealer, DiamondShape, InventoryItem, MessageType},
    events::EventProducers,
    traits::DealerDirectoryError,
    MatchFlowApi,
};
use dmg_common::Secret;

use super::{
    helpers::{post_webhook, PLATFORM_HEADERS},
    mocks::{MockComposer, MockInventory, MockMatchStore},
};
use crate::{
    config::{ServerOptions, WebhookConfig},
    routes::TelegramWebhookRoute,
    verify::SECRET_TOKEN_HEADER,
};

const TARGET_GROUP: i64 = -100200300;

fn group_update(text: &str) -> String {
    serde_json::json!({
        "update_id": 4242,
        "message": {
            "message_id": 1,
            "from": {"id": 42, "first_name": "Maya", "username": "maya_d"},
            "chat": {"id": TARGET_GROUP, "type": "supergroup", "title": "B2B diamonds"},
            "date": 1722470400,
            "text": text
        }
    })
    .to_string()
}

fn private_update(text: &str) -> String {
    serde_json::json!({
        "update_id": 4243,
        "message": {
            "message_id": 2,
            "from": {"id": 77, "first_name": "Gil"},
            "chat": {"id": 77, "type": "private"},
            "date": 1722470400,
            "text": text
        }
    })
    .to_string()
}

fn test_options(secret: Option<&str>) -> ServerOptions {
    ServerOptions {
        webhook: WebhookConfig {
            secret: secret.map(|s| Secret::new(s.to_string())),
            required_user_agent: "TelegramBot".to_string(),
            ..Default::default()
        },
        target_group_id: Some(TARGET_GROUP),
    }
}

fn matching_stone() -> InventoryItem {
    InventoryItem {
        stock_number: Some("R-1".into()),
        shape: Some(DiamondShape::Round),
        weight: 1.5,
        color: Some(ColorGrade::D),
        clarity: Some(ClarityGrade::Vs1),
        price_per_carat: 5_000.0,
    }
}

fn register(
    cfg: &mut ServiceConfig,
    store: MockMatchStore,
    inventory: MockInventory,
    composer: MockComposer,
    options: ServerOptions,
) {
    let api = MatchFlowApi::new(store, inventory, EventProducers::default());
    cfg.service(TelegramWebhookRoute::<MockMatchStore, MockInventory, MockComposer>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(composer))
        .app_data(web::Data::new(options));
}

// Mocks with no expectations: any call to the matching pipeline fails the test.
fn untouched_pipeline(cfg: &mut ServiceConfig, options: ServerOptions) {
    register(cfg, MockMatchStore::new(), MockInventory::new(), MockComposer::new(), options);
}

//----------------------------------------------  Verification  ------------------------------------------------------

fn configure_secret_gate(cfg: &mut ServiceConfig) {
    untouched_pipeline(cfg, test_options(Some("s3cret")));
}

#[actix_web::test]
async fn missing_secret_header_is_rejected_regardless_of_body() {
    let _ = env_logger::try_init();
    let body = group_update("Looking for a round 1.5ct D VS1 diamond under $10k");
    let (status, body) = post_webhook(body, &PLATFORM_HEADERS, configure_secret_gate).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Unauthorized");
}

#[actix_web::test]
async fn wrong_user_agent_is_rejected() {
    let _ = env_logger::try_init();
    let headers = [("User-Agent", "curl/8.0"), (SECRET_TOKEN_HEADER, "s3cret")];
    let (status, body) = post_webhook(group_update("hello"), &headers, configure_secret_gate).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Unauthorized");
}

//----------------------------------------------  No-op branches  ----------------------------------------------------

fn configure_noop(cfg: &mut ServiceConfig) {
    untouched_pipeline(cfg, test_options(None));
}

#[actix_web::test]
async fn small_talk_never_reaches_the_matcher() {
    let _ = env_logger::try_init();
    let (status, body) = post_webhook(group_update("hello"), &PLATFORM_HEADERS, configure_noop).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[actix_web::test]
async fn malformed_payload_is_a_silent_ok() {
    let _ = env_logger::try_init();
    let (status, body) = post_webhook("this is not json".to_string(), &PLATFORM_HEADERS, configure_noop).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[actix_web::test]
async fn textless_update_is_a_silent_ok() {
    let _ = env_logger::try_init();
    let body = serde_json::json!({"update_id": 1, "message": {"message_id": 3, "chat": {"id": TARGET_GROUP, "type": "supergroup"}}})
        .to_string();
    let (status, _) = post_webhook(body, &PLATFORM_HEADERS, configure_noop).await.unwrap();
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn messages_outside_the_target_group_are_ignored() {
    let _ = env_logger::try_init();
    let body = serde_json::json!({
        "update_id": 5,
        "message": {
            "message_id": 4,
            "from": {"id": 42, "first_name": "Maya"},
            "chat": {"id": -55, "type": "supergroup", "title": "Another group"},
            "date": 1722470400,
            "text": "Looking for a round 1.5ct D VS1 diamond under $10k"
        }
    })
    .to_string();
    let (status, body) = post_webhook(body, &PLATFORM_HEADERS, configure_noop).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

//----------------------------------------------  Short circuits  ----------------------------------------------------

fn configure_cta(cfg: &mut ServiceConfig) {
    let mut store = MockMatchStore::new();
    store
        .expect_record_cta_click()
        .withf(|click| click.telegram_id == 77 && click.parameter == "spring_promo")
        .times(1)
        .returning(|_| Ok(9));
    register(cfg, store, MockInventory::new(), MockComposer::new(), test_options(None));
}

#[actix_web::test]
async fn private_start_parameter_records_a_click_and_stops() {
    let _ = env_logger::try_init();
    let (status, body) = post_webhook(private_update("/start spring_promo"), &PLATFORM_HEADERS, configure_cta).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

fn configure_payment_confirmation(cfg: &mut ServiceConfig) {
    let mut composer = MockComposer::new();
    composer.expect_generate_diamond_post().withf(|id| *id == 42).times(1).returning(|_| Ok(()));
    register(cfg, MockMatchStore::new(), MockInventory::new(), composer, test_options(None));
}

#[actix_web::test]
async fn payment_confirmation_bypasses_the_extractor() {
    let _ = env_logger::try_init();
    let (status, body) =
        post_webhook(group_update("Payment confirmed"), &PLATFORM_HEADERS, configure_payment_confirmation).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

//----------------------------------------------  Matching flow  -----------------------------------------------------

fn configure_fan_out(cfg: &mut ServiceConfig) {
    let mut store = MockMatchStore::new();
    store.expect_fetch_active_dealers().times(1).returning(|| {
        Ok(vec![Dealer { telegram_id: 100, name: Some("Avi".into()) }, Dealer { telegram_id: 200, name: None }])
    });
    store
        .expect_insert_notification()
        .withf(|n| {
            n.telegram_id == 100
                && n.message_type == MessageType::GroupDiamondRequest
                && n.idempotency_key.is_none()
                && n.metadata["confidenceScore"].as_f64().unwrap() > 1.0
        })
        .times(1)
        .returning(|_| Ok(1));
    let mut inventory = MockInventory::new();
    inventory
        .expect_fetch_inventory()
        .times(2)
        .returning(|id| if id == 100 { Ok(vec![matching_stone()]) } else { Ok(Vec::new()) });
    register(cfg, store, inventory, MockComposer::new(), test_options(None));
}

#[actix_web::test]
async fn qualifying_request_notifies_matching_dealers_only() {
    let _ = env_logger::try_init();
    let body = group_update("Looking for a round 1.5ct D VS1 diamond under $10k");
    let (status, body) = post_webhook(body, &PLATFORM_HEADERS, configure_fan_out).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

fn configure_boundary_confidence(cfg: &mut ServiceConfig) {
    let mut store = MockMatchStore::new();
    // The scan must run: confidence 0.30 is exactly at the (inclusive) gate.
    store.expect_fetch_active_dealers().times(1).returning(|| Ok(Vec::new()));
    register(cfg, store, MockInventory::new(), MockComposer::new(), test_options(None));
}

#[actix_web::test]
async fn confidence_exactly_at_the_gate_proceeds_to_matching() {
    let _ = env_logger::try_init();
    // Shape only: 0.30.
    let (status, _) = post_webhook(group_update("any asscher around?"), &PLATFORM_HEADERS, configure_boundary_confidence)
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
}

//----------------------------------------------  CORS / liveness  ---------------------------------------------------

#[actix_web::test]
async fn preflight_carries_cors_headers() {
    use actix_web::{http::Method, test, test::TestRequest, App};
    let app = test::init_service(App::new().service(crate::routes::webhook_preflight)).await;
    let req = TestRequest::with_uri("/webhook/telegram").method(Method::OPTIONS).to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
    assert_eq!(res.headers().get("Access-Control-Allow-Origin").unwrap(), "*");
    assert_eq!(res.headers().get("Access-Control-Allow-Methods").unwrap(), "POST, OPTIONS");
}

#[actix_web::test]
async fn health_answers() {
    use actix_web::{test, test::TestRequest, App};
    let app = test::init_service(App::new().service(crate::routes::health)).await;
    let res = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert!(res.status().is_success());
}

//----------------------------------------------  Failure mapping  ---------------------------------------------------

fn configure_broken_store(cfg: &mut ServiceConfig) {
    let mut store = MockMatchStore::new();
    store
        .expect_fetch_active_dealers()
        .times(1)
        .returning(|| Err(DealerDirectoryError::DatabaseError("store is down".into())));
    register(cfg, store, MockInventory::new(), MockComposer::new(), test_options(None));
}

#[actix_web::test]
async fn storage_failure_maps_to_a_plain_500() {
    let _ = env_logger::try_init();
    let body = group_update("Looking for a round 1.5ct D VS1 diamond under $10k");
    let (status, body) = post_webhook(body, &PLATFORM_HEADERS, configure_broken_store).await.unwrap();
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Error");
}
