use uuid::Uuid;

use crate::{
    db::{RestaurantStore, ReviewStore, Store, UserStore},
    error::{AppError, AppResult},
    models::{Dashboard, NewUser, Restaurant, Review, User, UserProfile},
};

fn user_not_found(user_id: Uuid) -> AppError {
    AppError::NotFound(format!("User {} not found", user_id))
}

pub async fn create_user(store: &dyn Store, new: NewUser) -> AppResult<User> {
    let name = new.name.trim();
    let email = new.email.trim();

    if name.is_empty() {
        return Err(AppError::InvalidInput("Name is required".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::InvalidInput(format!("Invalid email: {}", email)));
    }

    let user = store
        .create_user(NewUser {
            name: name.to_string(),
            email: email.to_string(),
        })
        .await?;

    tracing::info!(user_id = %user.id, "User created");
    Ok(user)
}

async fn load_user(store: &dyn Store, user_id: Uuid) -> AppResult<User> {
    store
        .find_user(user_id)
        .await?
        .ok_or_else(|| user_not_found(user_id))
}

/// Profile with favorites resolved. Favorites that no longer resolve are omitted.
pub async fn profile(store: &dyn Store, user_id: Uuid) -> AppResult<UserProfile> {
    let user = load_user(store, user_id).await?;
    let favorites = store.find_restaurants_by_ids(&user.favorites).await?;

    Ok(UserProfile {
        id: user.id,
        name: user.name,
        email: user.email,
        preferred_cuisines: user.preferred_cuisines,
        favorites,
    })
}

pub async fn dashboard(store: &dyn Store, user_id: Uuid) -> AppResult<Dashboard> {
    let user = profile(store, user_id).await?;
    let reviews = store.reviews_by_user(user_id).await?;
    Ok(Dashboard { user, reviews })
}

pub async fn favorites(store: &dyn Store, user_id: Uuid) -> AppResult<Vec<Restaurant>> {
    Ok(profile(store, user_id).await?.favorites)
}

/// Adds a restaurant to the user's favorites; adding twice is a no-op
pub async fn add_favorite(
    store: &dyn Store,
    user_id: Uuid,
    restaurant_id: Uuid,
) -> AppResult<Vec<Uuid>> {
    if store.find_restaurant(restaurant_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Restaurant {} not found",
            restaurant_id
        )));
    }

    let favorites = store
        .add_favorite(user_id, restaurant_id)
        .await?
        .ok_or_else(|| user_not_found(user_id))?;

    tracing::info!(user_id = %user_id, restaurant_id = %restaurant_id, "Favorite added");
    Ok(favorites)
}

pub async fn remove_favorite(
    store: &dyn Store,
    user_id: Uuid,
    restaurant_id: Uuid,
) -> AppResult<Vec<Uuid>> {
    let favorites = store
        .remove_favorite(user_id, restaurant_id)
        .await?
        .ok_or_else(|| user_not_found(user_id))?;

    tracing::info!(user_id = %user_id, restaurant_id = %restaurant_id, "Favorite removed");
    Ok(favorites)
}

/// Trims entries, drops blanks and keeps the first of any duplicates
pub fn normalize_cuisines(cuisines: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(cuisines.len());
    for cuisine in cuisines {
        let cuisine = cuisine.trim();
        if !cuisine.is_empty() && !normalized.iter().any(|c| c == cuisine) {
            normalized.push(cuisine.to_string());
        }
    }
    normalized
}

pub async fn set_preferred_cuisines(
    store: &dyn Store,
    user_id: Uuid,
    cuisines: Vec<String>,
) -> AppResult<Vec<String>> {
    let cuisines = normalize_cuisines(cuisines);
    let updated = store
        .set_preferred_cuisines(user_id, cuisines)
        .await?
        .ok_or_else(|| user_not_found(user_id))?;

    tracing::info!(user_id = %user_id, cuisines = ?updated, "Preferred cuisines updated");
    Ok(updated)
}

pub async fn my_reviews(store: &dyn Store, user_id: Uuid) -> AppResult<Vec<Review>> {
    load_user(store, user_id).await?;
    store.reviews_by_user(user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, RestaurantStore};
    use crate::models::NewRestaurant;

    fn new_user() -> NewUser {
        NewUser {
            name: " Priya ".to_string(),
            email: "priya@example.com".to_string(),
        }
    }

    #[test]
    fn test_normalize_cuisines() {
        let cuisines = vec![
            " Thai ".to_string(),
            "".to_string(),
            "Thai".to_string(),
            "Italian, Continental".to_string(),
        ];
        assert_eq!(
            normalize_cuisines(cuisines),
            vec!["Thai".to_string(), "Italian, Continental".to_string()]
        );
    }

    #[tokio::test]
    async fn test_create_user_trims_name() {
        let store = MemoryStore::new();
        let user = create_user(&store, new_user()).await.unwrap();
        assert_eq!(user.name, "Priya");
    }

    #[tokio::test]
    async fn test_create_user_requires_email() {
        let store = MemoryStore::new();
        let result = create_user(
            &store,
            NewUser {
                name: "Priya".to_string(),
                email: "not-an-email".to_string(),
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_add_favorite_requires_restaurant() {
        let store = MemoryStore::new();
        let user = create_user(&store, new_user()).await.unwrap();
        let result = add_favorite(&store, user.id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_favorites_resolve_to_restaurants() {
        let store = MemoryStore::new();
        let user = create_user(&store, new_user()).await.unwrap();
        let restaurant = store
            .create_restaurant(NewRestaurant {
                name: "Sangeetha".to_string(),
                cuisine: "South Indian".to_string(),
                address: "Mylapore".to_string(),
                area: None,
                location: None,
                description: None,
                image: None,
                is_pure_veg: true,
            })
            .await
            .unwrap();

        add_favorite(&store, user.id, restaurant.id).await.unwrap();
        let ids = add_favorite(&store, user.id, restaurant.id).await.unwrap();
        assert_eq!(ids, vec![restaurant.id]);

        let favorites = favorites(&store, user.id).await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].name, "Sangeetha");

        let ids = remove_favorite(&store, user.id, restaurant.id).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let store = MemoryStore::new();
        let result = dashboard(&store, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
