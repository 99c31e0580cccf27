use serde::Deserialize;
use uuid::Uuid;

use crate::{
    db::{RestaurantStore, ReviewStore, Store, UserStore},
    error::{AppError, AppResult},
    models::{NewReview, Review, ReviewPatch},
    services::ratings::validate_rating,
};

/// Body of a review submission
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: i16,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Creates a review and refreshes the restaurant's rating
pub async fn add_review(
    store: &dyn Store,
    user_id: Uuid,
    restaurant_id: Uuid,
    request: ReviewRequest,
) -> AppResult<Review> {
    let rating = validate_rating(request.rating)?;

    if store.find_user(user_id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }
    if store.find_restaurant(restaurant_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Restaurant {} not found",
            restaurant_id
        )));
    }

    let review = store
        .create_review(NewReview {
            restaurant_id,
            user_id,
            rating,
            comment: request.comment,
        })
        .await?;

    tracing::info!(
        review_id = %review.id,
        restaurant_id = %restaurant_id,
        user_id = %user_id,
        rating,
        "Review added"
    );

    Ok(review)
}

/// Updates the caller's own review
pub async fn edit_review(
    store: &dyn Store,
    user_id: Uuid,
    review_id: Uuid,
    patch: ReviewPatch,
) -> AppResult<Review> {
    if let Some(rating) = patch.rating {
        validate_rating(rating)?;
    }

    let review = store
        .update_review(user_id, review_id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;

    tracing::info!(review_id = %review_id, user_id = %user_id, "Review updated");
    Ok(review)
}

/// Deletes the caller's own review
pub async fn delete_review(store: &dyn Store, user_id: Uuid, review_id: Uuid) -> AppResult<Review> {
    let review = store
        .delete_review(user_id, review_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;

    tracing::info!(
        review_id = %review_id,
        restaurant_id = %review.restaurant_id,
        "Review deleted"
    );
    Ok(review)
}
