mod common;

use actix_web::dev::Service;
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use common::*;
use ramen_gacha::handlers::{gacha_config, gacha_internal_config};
use ramen_gacha::middlewares::AuthMiddleware;
use ramen_gacha::utils::JwtService;
use serde_json::{Value, json};

const JWT_SECRET: &str = "test-secret";

fn jwt() -> JwtService {
    JwtService::new(JWT_SECRET, 3600)
}

fn bearer(user_id: i64) -> (&'static str, String) {
    let token = jwt().generate_access_token(user_id).unwrap();
    ("Authorization", format!("Bearer {token}"))
}

macro_rules! init_app {
    ($db:expr) => {
        test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt()))
                .app_data(web::Data::new(test_service(&$db)))
                .configure(gacha_internal_config)
                .service(web::scope("/api/v1").configure(gacha_config)),
        )
        .await
    };
}

#[actix_web::test]
async fn protected_routes_require_a_token() {
    let db = setup_db().await;
    let app = init_app!(db);

    let req = test::TestRequest::get()
        .uri("/api/v1/gacha/tickets")
        .to_request();
    let err = app.call(req).await.err().unwrap();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/gacha/pity")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let err = app.call(req).await.err().unwrap();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn second_daily_draw_returns_conflict() {
    let db = setup_db().await;
    let app = init_app!(db);

    let req = test::TestRequest::post()
        .uri("/api/v1/gacha/draw")
        .insert_header(bearer(1))
        .set_json(json!({ "kind": "daily" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["is_new"], true);
    assert!(body["data"]["badge"]["code"].is_string());

    let req = test::TestRequest::post()
        .uri("/api/v1/gacha/draw")
        .insert_header(bearer(1))
        .set_json(json!({ "kind": "daily" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "ALREADY_DRAWN_TODAY");

    let req = test::TestRequest::get()
        .uri("/api/v1/gacha/daily")
        .insert_header(bearer(1))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["eligible"], false);

    let req = test::TestRequest::get()
        .uri("/api/v1/gacha/history")
        .insert_header(bearer(1))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["draw_kind"], "daily");
    assert_eq!(body["data"][0]["pity_count_at_draw"], 1);
}

#[actix_web::test]
async fn ticket_draw_without_tickets_returns_conflict() {
    let db = setup_db().await;
    let app = init_app!(db);

    let req = test::TestRequest::post()
        .uri("/api/v1/gacha/draw")
        .insert_header(bearer(2))
        .set_json(json!({ "kind": "ticket" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "INSUFFICIENT_TICKETS");

    let req = test::TestRequest::get()
        .uri("/api/v1/gacha/pity")
        .insert_header(bearer(2))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"], json!({ "counter50": 0, "counter100": 0 }));
}

#[actix_web::test]
async fn internal_ticket_grant_requires_key() {
    let db = setup_db().await;
    let app = init_app!(db);

    let req = test::TestRequest::post()
        .uri("/internal/gacha/tickets")
        .set_json(json!({ "user_id": 3, "amount": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/internal/gacha/tickets")
        .insert_header(("X-Internal-Key", "wrong"))
        .set_json(json!({ "user_id": 3, "amount": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/internal/gacha/tickets")
        .insert_header(("X-Internal-Key", INTERNAL_KEY))
        .set_json(json!({ "user_id": 3, "amount": 0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/internal/gacha/tickets")
        .insert_header(("X-Internal-Key", INTERNAL_KEY))
        .set_json(json!({ "user_id": 3, "amount": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["new_balance"], 1);

    let req = test::TestRequest::post()
        .uri("/api/v1/gacha/draw")
        .insert_header(bearer(3))
        .set_json(json!({ "kind": "ticket" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/v1/gacha/tickets")
        .insert_header(bearer(3))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["count"], 0);

    let req = test::TestRequest::get()
        .uri("/api/v1/gacha/collection")
        .insert_header(bearer(3))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn rates_and_catalog_are_published() {
    let db = setup_db().await;
    let app = init_app!(db);

    let req = test::TestRequest::get()
        .uri("/api/v1/gacha/rates")
        .insert_header(bearer(4))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let bands = body["data"]["bands"].as_array().unwrap();
    assert_eq!(bands.len(), 5);
    let total: f64 = bands.iter().map(|b| b["percent"].as_f64().unwrap()).sum();
    assert!((total - 100.0).abs() < 1e-9);
    assert_eq!(body["data"]["hard_pity_threshold"], 100);
    assert_eq!(body["data"]["soft_pity_threshold"], 50);

    let req = test::TestRequest::get()
        .uri("/api/v1/gacha/badges")
        .insert_header(bearer(4))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
}

#[actix_web::test]
async fn history_limit_is_clamped() {
    let db = setup_db().await;
    let app = init_app!(db);
    let service = test_service(&db);
    service.add_tickets(5, 3).await.unwrap();
    for _ in 0..3 {
        service
            .draw(5, ramen_gacha::entities::DrawKind::Ticket)
            .await
            .unwrap();
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/gacha/history?limit=0")
        .insert_header(bearer(5))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/gacha/history?limit=500")
        .insert_header(bearer(5))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}
