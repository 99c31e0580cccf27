use uuid::Uuid;

use crate::{
    db::{RestaurantStore, ReviewStore, Store},
    error::{AppError, AppResult},
    models::{NewRestaurant, Restaurant, RestaurantDetail, RestaurantFilter, SearchResults},
};

pub async fn create_restaurant(store: &dyn Store, mut new: NewRestaurant) -> AppResult<Restaurant> {
    for (field, value) in [
        ("name", &mut new.name),
        ("cuisine", &mut new.cuisine),
        ("address", &mut new.address),
    ] {
        *value = value.trim().to_string();
        if value.is_empty() {
            return Err(AppError::InvalidInput(format!("{} is required", field)));
        }
    }

    let restaurant = store.create_restaurant(new).await?;
    tracing::info!(
        restaurant_id = %restaurant.id,
        cuisine = %restaurant.cuisine,
        "Restaurant created"
    );
    Ok(restaurant)
}

pub async fn list_restaurants(
    store: &dyn Store,
    filter: RestaurantFilter,
) -> AppResult<Vec<Restaurant>> {
    store.list_restaurants(&filter.normalized()).await
}

/// Free-text search; `q` is required, `cuisine` and `location` narrow it further
pub async fn search_restaurants(
    store: &dyn Store,
    filter: RestaurantFilter,
) -> AppResult<SearchResults> {
    let filter = filter.normalized();
    let Some(query) = filter.q.clone() else {
        return Err(AppError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    };

    let restaurants = store.list_restaurants(&filter).await?;
    tracing::debug!(query = %query, count = restaurants.len(), "Restaurant search completed");

    Ok(SearchResults {
        query,
        count: restaurants.len(),
        restaurants,
    })
}

pub async fn restaurant_detail(store: &dyn Store, id: Uuid) -> AppResult<RestaurantDetail> {
    let restaurant = store
        .find_restaurant(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Restaurant {} not found", id)))?;
    let reviews = store.reviews_by_restaurant(id).await?;

    Ok(RestaurantDetail {
        restaurant,
        reviews,
    })
}
