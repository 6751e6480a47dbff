use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};

use super::auth::Auth;
use super::handlers::AppState;
use super::routes::configure_routes;
use crate::advisor::{ModelConfig, ModelHandle};
use crate::catalog::{CatalogClient, CatalogConfig};
use crate::util::db::Db;

const SECRET: &str = "s3cret";

async fn state() -> web::Data<AppState> {
    let catalog = CatalogClient::new(CatalogConfig::default()).unwrap();
    let advisor = ModelHandle::new("advisor", ModelConfig::new(None, "pro")).unwrap();
    let chat = ModelHandle::new("chat", ModelConfig::new(None, "flash")).unwrap();
    let db = Db::memory().await.unwrap();
    web::Data::new(AppState::new(catalog, advisor, chat, db))
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .wrap(Auth::new(SECRET.to_string()))
                .configure(configure_routes),
        )
        .await
    };
}

fn authed(req: test::TestRequest) -> test::TestRequest {
    req.insert_header(("Authorization", format!("Bearer {SECRET}")))
}

#[actix_web::test]
async fn health_is_public_and_api_is_guarded() {
    let state = state().await;
    let app = app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["database"], "connected");
    assert_eq!(body["data"]["catalog_configured"], false);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/games").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/games")
        .insert_header(("Authorization", "Bearer wrong"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn unconfigured_catalog_degrades_to_empty_listings() {
    let state = state().await;
    let app = app!(state);

    let req = authed(test::TestRequest::get().uri("/api/v1/games?search=witcher&page=1&pageSize=20")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"], json!({ "items": [], "totalCount": 0 }));

    let req = authed(test::TestRequest::get().uri("/api/v1/platforms")).to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    for baseline in ["PC", "PlayStation", "Xbox", "Nintendo Switch"] {
        assert!(names.contains(&baseline), "{baseline} missing from {names:?}");
    }

    let req = authed(test::TestRequest::get().uri("/api/v1/games?sort=id%3B%20fields%20*")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn advisor_failures_are_generic_and_input_errors_are_400() {
    let state = state().await;
    let app = app!(state);

    let req = authed(test::TestRequest::post().uri("/api/v1/discover"))
        .set_json(json!({ "query": "space pirate cats" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Failed to get game recommendations.");

    let req = authed(test::TestRequest::post().uri("/api/v1/chat"))
        .set_json(json!({ "history": [] }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn favorite_toggle_round_trip() {
    let state = state().await;
    let app = app!(state);
    let item = json!({ "id": 42, "type": "game", "name": "Hades", "coverUrl": "/placeholder.jpg" });

    let req = authed(test::TestRequest::post().uri("/api/v1/users/u1/favorites/toggle"))
        .set_json(&item)
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["isFavorite"], true);

    let req = authed(test::TestRequest::post().uri("/api/v1/users/u1/favorites/statuses"))
        .set_json(json!({ "items": [{ "id": 42, "type": "game" }, { "id": 42, "type": "franchise" }] }))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"], json!({ "game-42": true, "franchise-42": false }));

    let req = authed(test::TestRequest::post().uri("/api/v1/users/u1/favorites/toggle"))
        .set_json(&item)
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["isFavorite"], false);

    let req = authed(test::TestRequest::get().uri("/api/v1/users/u1/favorites")).to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"], json!([]));
}

#[actix_web::test]
async fn game_status_put_then_get() {
    let state = state().await;
    let app = app!(state);

    let req = authed(test::TestRequest::put().uri("/api/v1/users/u1/games/1942"))
        .set_json(json!({ "status": "playing", "gameName": "The Witcher 3" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = authed(test::TestRequest::get().uri("/api/v1/users/u1/games/1942")).to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"], json!({ "gameId": 1942, "status": "playing" }));

    let req = authed(test::TestRequest::get().uri("/api/v1/users/u1/games/7")).to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["status"], "unplayed");
}

#[actix_web::test]
async fn list_lifecycle() {
    let state = state().await;
    let app = app!(state);

    let req = authed(test::TestRequest::post().uri("/api/v1/users/u1/lists"))
        .set_json(json!({ "name": "Cozy" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let list_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = authed(test::TestRequest::post().uri("/api/v1/users/u1/lists/items"))
        .set_json(json!({
            "listIds": [list_id],
            "item": { "id": 5, "type": "game", "name": "Unpacking", "coverUrl": "https://img/5.jpg" }
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = authed(test::TestRequest::get().uri(&format!("/api/v1/users/u1/lists/{list_id}"))).to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["list"]["itemCount"], 1);
    assert_eq!(body["data"]["list"]["coverUrl"], "https://img/5.jpg");
    assert_eq!(body["data"]["items"][0]["id"], "game-5");

    let req = authed(test::TestRequest::get().uri("/api/v1/users/u1/lists/memberships/game/5")).to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"][0]["inList"], true);

    let req = authed(test::TestRequest::post().uri("/api/v1/users/u1/lists/items"))
        .set_json(json!({
            "listIds": ["nope"],
            "item": { "id": 6, "type": "game", "name": "Inside", "coverUrl": "" }
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = authed(test::TestRequest::delete().uri(&format!("/api/v1/users/u1/lists/{list_id}/items/game-5")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = authed(test::TestRequest::delete().uri(&format!("/api/v1/users/u1/lists/{list_id}"))).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = authed(test::TestRequest::get().uri(&format!("/api/v1/users/u1/lists/{list_id}"))).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}
