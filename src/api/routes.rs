use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        // Recommendations
        .route("/recommendations", get(handlers::recommend))
        .route("/restaurants/recommendations", get(handlers::recommend))
        // Restaurants
        .route(
            "/restaurants",
            get(handlers::list_restaurants).post(handlers::create_restaurant),
        )
        .route("/restaurants/search", get(handlers::search_restaurants))
        .route("/restaurants/:id", get(handlers::get_restaurant))
        // Reviews: POST takes a restaurant id, PUT/DELETE a review id
        .route(
            "/reviews/:id",
            post(handlers::add_review)
                .put(handlers::edit_review)
                .delete(handlers::delete_review),
        )
        // Users
        .route("/users", post(handlers::create_user))
        .route("/users/profile", get(handlers::get_profile))
        .route("/users/dashboard", get(handlers::get_dashboard))
        .route("/users/favorites", get(handlers::get_favorites))
        .route(
            "/users/favorites/:id",
            post(handlers::add_favorite).delete(handlers::remove_favorite),
        )
        .route(
            "/users/preferences/cuisines",
            put(handlers::update_preferred_cuisines),
        )
        .route("/users/reviews", get(handlers::get_my_reviews))
}
