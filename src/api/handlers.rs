// HTTP request handlers for API endpoints

use actix_web::{http::StatusCode, web, HttpResponse, Result};
use std::time::Instant;
use tracing::{error, warn};

use crate::advisor::{chat, discovery, prices, ModelHandle};
use crate::api::models::*;
use crate::catalog::CatalogClient;
use crate::collections::{favorites, games, lists, ItemId, ItemType};
use crate::error::FinderError;
use crate::util::db::Db;

/// Long-lived handles shared by every worker.
pub struct AppState {
    pub catalog: CatalogClient,
    /// Discovery and price lookups.
    pub advisor: ModelHandle,
    /// Open-ended chat.
    pub chat: ModelHandle,
    pub db: Db,
    pub started: Instant,
}

impl AppState {
    pub fn new(catalog: CatalogClient, advisor: ModelHandle, chat: ModelHandle, db: Db) -> Self {
        Self {
            catalog,
            advisor,
            chat,
            db,
            started: Instant::now(),
        }
    }
}

type State = web::Data<AppState>;

fn ok<T: serde::Serialize>(data: T) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

/// Log `err` with the operation name and answer with a short message. Caller mistakes
/// keep their own text; everything else gets `message`.
fn failure(operation: &'static str, message: &'static str, err: FinderError) -> Result<HttpResponse> {
    let (status, text) = match &err {
        FinderError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        FinderError::InvalidInput(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, message.to_string()),
    };
    if status.is_server_error() {
        error!(target: "api", operation, error = %err, "request failed");
    } else {
        warn!(target: "api", operation, error = %err, "request rejected");
    }
    Ok(HttpResponse::build(status).json(ApiResponse::<()>::error(text)))
}

fn not_found(what: String) -> Result<HttpResponse> {
    Ok(HttpResponse::NotFound().json(ApiResponse::<()>::error(format!("{what} not found"))))
}

/// Health check endpoint
pub async fn health_check(state: State) -> Result<HttpResponse> {
    let db_status = match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.db.pool)
        .await
    {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    ok(HealthResponse {
        status: "healthy".to_string(),
        database: db_status.to_string(),
        catalog_configured: state.catalog.is_configured(),
        uptime_seconds: state.started.elapsed().as_secs(),
    })
}

// ---- catalog ----

pub async fn list_games(state: State, query: web::Query<GamesQuery>) -> Result<HttpResponse> {
    let filter = match query.into_inner().into_filter() {
        Ok(filter) => filter,
        Err(err) => return failure("list_games", "Failed to fetch games.", err),
    };
    match state.catalog.games(&filter).await {
        Ok(page) => ok(page),
        Err(err) => failure("list_games", "Failed to fetch games.", err),
    }
}

pub async fn get_game(state: State, path: web::Path<i64>) -> Result<HttpResponse> {
    let id = path.into_inner();
    match state.catalog.game_details(id).await {
        Ok(Some(game)) => ok(game),
        Ok(None) => not_found(format!("game {id}")),
        Err(err) => failure("get_game", "Failed to fetch game details.", err),
    }
}

pub async fn list_platforms(state: State) -> Result<HttpResponse> {
    match state.catalog.platforms().await {
        Ok(platforms) => ok(platforms),
        Err(err) => failure("list_platforms", "Failed to fetch platforms.", err),
    }
}

pub async fn list_franchises(state: State, query: web::Query<ListingQuery>) -> Result<HttpResponse> {
    let filter = match query.into_inner().into_filter() {
        Ok(filter) => filter,
        Err(err) => return failure("list_franchises", "Failed to fetch franchises.", err),
    };
    match state.catalog.franchises(&filter).await {
        Ok(page) => ok(page),
        Err(err) => failure("list_franchises", "Failed to fetch franchises.", err),
    }
}

pub async fn get_franchise(state: State, path: web::Path<i64>) -> Result<HttpResponse> {
    let id = path.into_inner();
    match state.catalog.franchise_details(id).await {
        Ok(Some(franchise)) => ok(franchise),
        Ok(None) => not_found(format!("franchise {id}")),
        Err(err) => failure("get_franchise", "Failed to fetch franchise details.", err),
    }
}

pub async fn list_studios(state: State, query: web::Query<ListingQuery>) -> Result<HttpResponse> {
    let filter = match query.into_inner().into_filter() {
        Ok(filter) => filter,
        Err(err) => return failure("list_studios", "Failed to fetch studios.", err),
    };
    match state.catalog.studios(&filter).await {
        Ok(page) => ok(page),
        Err(err) => failure("list_studios", "Failed to fetch studios.", err),
    }
}

// ---- advisor ----

pub async fn discover(state: State, body: web::Json<DiscoverRequest>) -> Result<HttpResponse> {
    match discovery::discover(&state.advisor, &state.catalog, &body.query).await {
        Ok(result) => ok(result),
        Err(err) => failure("discover", "Failed to get game recommendations.", err),
    }
}

pub async fn chat_reply(state: State, body: web::Json<ChatRequest>) -> Result<HttpResponse> {
    match chat::chat(&state.chat, &body.history).await {
        Ok(reply) => ok(ChatResponse { reply }),
        Err(err) => failure(
            "chat",
            "The assistant could not be reached. Please try again.",
            err,
        ),
    }
}

pub async fn find_prices(state: State, body: web::Json<PricesRequest>) -> Result<HttpResponse> {
    match prices::aggregate_prices(&state.advisor, &body.game_name).await {
        Ok(offers) => ok(offers),
        Err(err) => failure("find_prices", "Failed to fetch game prices.", err),
    }
}

// ---- game statuses ----

pub async fn get_user_games(state: State, path: web::Path<String>) -> Result<HttpResponse> {
    match games::user_games(&state.db, &path).await {
        Ok(records) => ok(records),
        Err(err) => failure("get_user_games", "Failed to fetch user games.", err),
    }
}

pub async fn get_game_status(state: State, path: web::Path<(String, i64)>) -> Result<HttpResponse> {
    let (uid, game_id) = path.into_inner();
    match games::game_status(&state.db, &uid, game_id).await {
        Ok(status) => ok(GameStatusResponse { game_id, status }),
        Err(err) => failure("get_game_status", "Failed to fetch game status.", err),
    }
}

pub async fn put_game_status(
    state: State,
    path: web::Path<(String, i64)>,
    body: web::Json<GameStatusRequest>,
) -> Result<HttpResponse> {
    let (uid, game_id) = path.into_inner();
    let GameStatusRequest { status, game_name } = body.into_inner();
    match games::set_game_status(&state.db, &uid, game_id, status, &game_name).await {
        Ok(()) => ok(GameStatusResponse { game_id, status }),
        Err(err) => failure("put_game_status", "Failed to update game status.", err),
    }
}

pub async fn get_experiences(state: State, path: web::Path<String>) -> Result<HttpResponse> {
    match games::experienced_games(&state.db, &state.catalog, &path).await {
        Ok(experienced) => ok(experienced),
        Err(err) => failure("get_experiences", "Failed to fetch user games.", err),
    }
}

// ---- favorites ----

pub async fn get_favorites(state: State, path: web::Path<String>) -> Result<HttpResponse> {
    match favorites::favorites(&state.db, &path).await {
        Ok(items) => ok(items),
        Err(err) => failure("get_favorites", "Failed to fetch favorites.", err),
    }
}

pub async fn toggle_favorite(
    state: State,
    path: web::Path<String>,
    body: web::Json<crate::collections::ItemRef>,
) -> Result<HttpResponse> {
    match favorites::toggle_favorite(&state.db, &path, &body).await {
        Ok(is_favorite) => ok(FavoriteToggleResponse { is_favorite }),
        Err(err) => failure("toggle_favorite", "Failed to update favorites.", err),
    }
}

pub async fn favorite_statuses(
    state: State,
    path: web::Path<String>,
    body: web::Json<FavoriteStatusesRequest>,
) -> Result<HttpResponse> {
    match favorites::favorite_statuses(&state.db, &path, &body.items).await {
        Ok(statuses) => ok(statuses),
        Err(err) => failure("favorite_statuses", "Failed to fetch favorites.", err),
    }
}

// ---- lists ----

pub async fn get_lists(state: State, path: web::Path<String>) -> Result<HttpResponse> {
    match lists::user_lists(&state.db, &path).await {
        Ok(user_lists) => ok(user_lists),
        Err(err) => failure("get_lists", "Failed to fetch lists.", err),
    }
}

pub async fn create_list(
    state: State,
    path: web::Path<String>,
    body: web::Json<CreateListRequest>,
) -> Result<HttpResponse> {
    match lists::create_list(&state.db, &path, &body.name).await {
        Ok(id) => Ok(HttpResponse::Created().json(ApiResponse::success(CreatedList { id }))),
        Err(err) => failure("create_list", "Failed to create list.", err),
    }
}

pub async fn get_list(state: State, path: web::Path<(String, String)>) -> Result<HttpResponse> {
    let (uid, list_id) = path.into_inner();
    match lists::list_details(&state.db, &uid, &list_id).await {
        Ok(Some(details)) => ok(details),
        Ok(None) => not_found(format!("list {list_id}")),
        Err(err) => failure("get_list", "Failed to fetch list.", err),
    }
}

pub async fn delete_list(state: State, path: web::Path<(String, String)>) -> Result<HttpResponse> {
    let (uid, list_id) = path.into_inner();
    match lists::delete_list(&state.db, &uid, &list_id).await {
        Ok(true) => Ok(HttpResponse::NoContent().finish()),
        Ok(false) => not_found(format!("list {list_id}")),
        Err(err) => failure("delete_list", "Failed to delete list.", err),
    }
}

pub async fn add_to_lists(
    state: State,
    path: web::Path<String>,
    body: web::Json<AddToListsRequest>,
) -> Result<HttpResponse> {
    match lists::add_item_to_lists(&state.db, &path, &body.list_ids, &body.item).await {
        Ok(()) => ok(serde_json::json!({ "added": body.list_ids.len() })),
        Err(err) => failure("add_to_lists", "Failed to add item to lists.", err),
    }
}

pub async fn remove_list_item(
    state: State,
    path: web::Path<(String, String, String)>,
) -> Result<HttpResponse> {
    let (uid, list_id, item_key) = path.into_inner();
    match lists::remove_item_from_list(&state.db, &uid, &list_id, &item_key).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(err) => failure("remove_list_item", "Failed to remove item from list.", err),
    }
}

pub async fn list_memberships(
    state: State,
    path: web::Path<(String, ItemType, i64)>,
) -> Result<HttpResponse> {
    let (uid, item_type, item_id) = path.into_inner();
    match lists::item_list_statuses(&state.db, &uid, ItemId::new(item_type, item_id)).await {
        Ok(memberships) => ok(memberships),
        Err(err) => failure("list_memberships", "Failed to fetch lists.", err),
    }
}
