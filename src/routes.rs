// region:    --- Imports
use crate::handlers;
use crate::store::SharedStore;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

// endregion: --- Imports

/// Every ledger route, bound to `store`.
pub fn router(store: SharedStore) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/users", post(handlers::handle_create_user))
        .route("/users/:id", get(handlers::handle_get_user))
        .route(
            "/categories",
            get(handlers::handle_get_categories).post(handlers::handle_new_category),
        )
        .route(
            "/categories/:id/listings",
            get(handlers::handle_get_category_listings),
        )
        .route(
            "/listings",
            get(handlers::handle_get_active_listings).post(handlers::handle_new_listing),
        )
        .route("/listings/:id", get(handlers::handle_get_listing))
        .route(
            "/listings/:id/bids",
            get(handlers::handle_get_bid_history).post(handlers::handle_bid),
        )
        .route("/listings/:id/winner", get(handlers::handle_get_winner))
        .route("/listings/:id/close", post(handlers::handle_close))
        .route(
            "/listings/:id/watch",
            put(handlers::handle_watch_listing).delete(handlers::handle_unwatch_listing),
        )
        .route(
            "/listings/:id/comments",
            get(handlers::handle_get_comments).post(handlers::handle_comment),
        )
        .route("/me/listings", get(handlers::handle_my_listings))
        .route("/me/bids", get(handlers::handle_my_bids))
        .route("/me/watchlist", get(handlers::handle_my_watchlist))
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 64))
        .with_state(store)
}
