// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check (no auth required)
        .route("/health", web::get().to(handlers::health_check))
        .route("/", web::get().to(handlers::health_check))
        // API v1 routes (all require authentication)
        .service(
            web::scope("/api/v1")
                // Catalog
                .route("/games", web::get().to(handlers::list_games))
                .route("/games/{id}", web::get().to(handlers::get_game))
                .route("/platforms", web::get().to(handlers::list_platforms))
                .route("/franchises", web::get().to(handlers::list_franchises))
                .route("/franchises/{id}", web::get().to(handlers::get_franchise))
                .route("/studios", web::get().to(handlers::list_studios))
                // Advisor
                .route("/discover", web::post().to(handlers::discover))
                .route("/chat", web::post().to(handlers::chat_reply))
                .route("/prices", web::post().to(handlers::find_prices))
                // Collections
                .service(web::scope("/users/{uid}").configure(configure_user_routes)),
        );
}

fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/games", web::get().to(handlers::get_user_games))
        .service(
            web::resource("/games/{game_id}")
                .route(web::get().to(handlers::get_game_status))
                .route(web::put().to(handlers::put_game_status)),
        )
        .route("/experiences", web::get().to(handlers::get_experiences))
        .route("/favorites", web::get().to(handlers::get_favorites))
        .route("/favorites/toggle", web::post().to(handlers::toggle_favorite))
        .route("/favorites/statuses", web::post().to(handlers::favorite_statuses))
        .service(
            web::resource("/lists")
                .route(web::get().to(handlers::get_lists))
                .route(web::post().to(handlers::create_list)),
        )
        // Literal segments before `{list_id}`.
        .route("/lists/items", web::post().to(handlers::add_to_lists))
        .route(
            "/lists/memberships/{item_type}/{item_id}",
            web::get().to(handlers::list_memberships),
        )
        .service(
            web::resource("/lists/{list_id}")
                .route(web::get().to(handlers::get_list))
                .route(web::delete().to(handlers::delete_list)),
        )
        .route(
            "/lists/{list_id}/items/{item_key}",
            web::delete().to(handlers::remove_list_item),
        );
}
