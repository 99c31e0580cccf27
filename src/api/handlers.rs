use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::{CurrentUser, RequestId},
    models::{
        Dashboard, NewRestaurant, NewUser, RecommendationResult, Restaurant, RestaurantDetail,
        RestaurantFilter, Review, ReviewPatch, SearchResults, User, UserProfile,
    },
    services::{
        recommendations, restaurants, reviews,
        reviews::ReviewRequest,
        users,
    },
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub favorites: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferredCuisines {
    pub preferred_cuisines: Vec<String>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Recommendations for the calling user
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResult>> {
    let limit = state.recommendation_limit(params.limit);

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        limit,
        "Processing recommendation request"
    );

    let result = recommendations::get_recommendations(
        state.recommendations.as_ref(),
        state.cache.as_ref(),
        user_id,
        limit,
    )
    .await?;

    tracing::info!(
        request_id = %request_id,
        based_on = ?result.based_on,
        count = result.recommendations.len(),
        "Recommendations completed"
    );

    Ok(Json(result))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<NewUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = users::create_user(state.store.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<UserProfile>> {
    Ok(Json(users::profile(state.store.as_ref(), user_id).await?))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Dashboard>> {
    Ok(Json(users::dashboard(state.store.as_ref(), user_id).await?))
}

pub async fn get_favorites(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Vec<Restaurant>>> {
    Ok(Json(users::favorites(state.store.as_ref(), user_id).await?))
}

pub async fn add_favorite(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(restaurant_id): Path<Uuid>,
) -> AppResult<Json<FavoritesResponse>> {
    let favorites = users::add_favorite(state.store.as_ref(), user_id, restaurant_id).await?;
    Ok(Json(FavoritesResponse { favorites }))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(restaurant_id): Path<Uuid>,
) -> AppResult<Json<FavoritesResponse>> {
    let favorites = users::remove_favorite(state.store.as_ref(), user_id, restaurant_id).await?;
    Ok(Json(FavoritesResponse { favorites }))
}

pub async fn update_preferred_cuisines(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<PreferredCuisines>,
) -> AppResult<Json<PreferredCuisines>> {
    let preferred_cuisines =
        users::set_preferred_cuisines(state.store.as_ref(), user_id, request.preferred_cuisines)
            .await?;
    Ok(Json(PreferredCuisines { preferred_cuisines }))
}

pub async fn get_my_reviews(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Vec<Review>>> {
    Ok(Json(users::my_reviews(state.store.as_ref(), user_id).await?))
}

/// `GET /restaurants?search=&cuisine=&location=&sort=rating|reviews`
pub async fn list_restaurants(
    State(state): State<AppState>,
    Query(filter): Query<RestaurantFilter>,
) -> AppResult<Json<Vec<Restaurant>>> {
    Ok(Json(
        restaurants::list_restaurants(state.store.as_ref(), filter).await?,
    ))
}

pub async fn search_restaurants(
    State(state): State<AppState>,
    Query(filter): Query<RestaurantFilter>,
) -> AppResult<Json<SearchResults>> {
    Ok(Json(
        restaurants::search_restaurants(state.store.as_ref(), filter).await?,
    ))
}

pub async fn create_restaurant(
    State(state): State<AppState>,
    Json(request): Json<NewRestaurant>,
) -> AppResult<(StatusCode, Json<Restaurant>)> {
    let restaurant = restaurants::create_restaurant(state.store.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(restaurant)))
}

pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RestaurantDetail>> {
    Ok(Json(restaurants::restaurant_detail(state.store.as_ref(), id).await?))
}

/// `POST /reviews/:id` where `id` is the restaurant being reviewed
pub async fn add_review(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(restaurant_id): Path<Uuid>,
    Json(request): Json<ReviewRequest>,
) -> AppResult<(StatusCode, Json<Review>)> {
    let review = reviews::add_review(state.store.as_ref(), user_id, restaurant_id, request).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn edit_review(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(review_id): Path<Uuid>,
    Json(patch): Json<ReviewPatch>,
) -> AppResult<Json<Review>> {
    Ok(Json(
        reviews::edit_review(state.store.as_ref(), user_id, review_id, patch).await?,
    ))
}

pub async fn delete_review(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(review_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    reviews::delete_review(state.store.as_ref(), user_id, review_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
