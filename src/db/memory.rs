use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{RecommendationSource, RestaurantStore, ReviewStore, UserStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        NewRestaurant, NewReview, NewUser, Restaurant, RestaurantFilter, RestaurantQuery,
        RestaurantRef, RestaurantSort, Review, ReviewPatch, ReviewSignal, User, UserSignals,
    },
    services::ratings::RatingSummary,
};

/// In-process store
///
/// Restaurants are kept in insertion order so rating sorts, which are stable,
/// break ties by age. Every review mutation recomputes the restaurant aggregate
/// under the same write guard.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    users: HashMap<Uuid, User>,
    restaurants: HashMap<Uuid, Restaurant>,
    restaurant_order: Vec<Uuid>,
    reviews: Vec<Review>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryStoreInner {
    /// Restaurants in insertion order
    fn ordered_restaurants(&self) -> impl Iterator<Item = &Restaurant> {
        self.restaurant_order
            .iter()
            .filter_map(|id| self.restaurants.get(id))
    }

    /// Restaurants sorted by rating, highest first, ties in insertion order
    fn by_rating_desc<'a>(restaurants: impl Iterator<Item = &'a Restaurant>) -> Vec<Restaurant> {
        let mut sorted: Vec<Restaurant> = restaurants.cloned().collect();
        sorted.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        sorted
    }

    fn restaurant_ref(&self, id: Uuid) -> RestaurantRef {
        RestaurantRef {
            id,
            cuisine: self.restaurants.get(&id).map(|r| r.cuisine.clone()),
        }
    }

    fn recompute_rating(&mut self, restaurant_id: Uuid) {
        let summary = RatingSummary::from_ratings(
            self.reviews
                .iter()
                .filter(|r| r.restaurant_id == restaurant_id)
                .map(|r| r.rating),
        );

        if let Some(restaurant) = self.restaurants.get_mut(&restaurant_id) {
            restaurant.rating = summary.rating;
            restaurant.review_count = summary.review_count;
            tracing::debug!(
                restaurant_id = %restaurant_id,
                rating = summary.rating,
                review_count = summary.review_count,
                "Recomputed restaurant rating"
            );
        }
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new: NewUser) -> AppResult<User> {
        let mut inner = self.inner.write().await;

        if inner
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&new.email))
        {
            return Err(AppError::InvalidInput(format!(
                "Email {} is already registered",
                new.email
            )));
        }

        let user = User::new(new);
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn add_favorite(
        &self,
        user_id: Uuid,
        restaurant_id: Uuid,
    ) -> AppResult<Option<Vec<Uuid>>> {
        let mut inner = self.inner.write().await;
        Ok(inner.users.get_mut(&user_id).map(|user| {
            user.add_favorite(restaurant_id);
            user.favorites.clone()
        }))
    }

    async fn remove_favorite(
        &self,
        user_id: Uuid,
        restaurant_id: Uuid,
    ) -> AppResult<Option<Vec<Uuid>>> {
        let mut inner = self.inner.write().await;
        Ok(inner.users.get_mut(&user_id).map(|user| {
            user.remove_favorite(restaurant_id);
            user.favorites.clone()
        }))
    }

    async fn set_preferred_cuisines(
        &self,
        user_id: Uuid,
        cuisines: Vec<String>,
    ) -> AppResult<Option<Vec<String>>> {
        let mut inner = self.inner.write().await;
        Ok(inner.users.get_mut(&user_id).map(|user| {
            user.preferred_cuisines = cuisines;
            user.preferred_cuisines.clone()
        }))
    }
}

#[async_trait::async_trait]
impl RestaurantStore for MemoryStore {
    async fn create_restaurant(&self, new: NewRestaurant) -> AppResult<Restaurant> {
        let restaurant = Restaurant::new(new);
        let mut inner = self.inner.write().await;
        inner.restaurant_order.push(restaurant.id);
        inner.restaurants.insert(restaurant.id, restaurant.clone());
        Ok(restaurant)
    }

    async fn find_restaurant(&self, id: Uuid) -> AppResult<Option<Restaurant>> {
        let inner = self.inner.read().await;
        Ok(inner.restaurants.get(&id).cloned())
    }

    async fn find_restaurants_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Restaurant>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.restaurants.get(id))
            .cloned()
            .collect())
    }

    async fn list_restaurants(&self, filter: &RestaurantFilter) -> AppResult<Vec<Restaurant>> {
        let inner = self.inner.read().await;
        let mut listed =
            MemoryStoreInner::by_rating_desc(inner.ordered_restaurants().filter(|r| filter.matches(r)));
        if filter.sort == RestaurantSort::Reviews {
            listed.sort_by(|a, b| b.review_count.cmp(&a.review_count));
        }
        Ok(listed)
    }
}

#[async_trait::async_trait]
impl ReviewStore for MemoryStore {
    async fn reviews_by_user(&self, user_id: Uuid) -> AppResult<Vec<Review>> {
        let inner = self.inner.read().await;
        Ok(inner
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn reviews_by_restaurant(&self, restaurant_id: Uuid) -> AppResult<Vec<Review>> {
        let inner = self.inner.read().await;
        Ok(inner
            .reviews
            .iter()
            .rev()
            .filter(|r| r.restaurant_id == restaurant_id)
            .cloned()
            .collect())
    }

    async fn create_review(&self, new: NewReview) -> AppResult<Review> {
        let mut inner = self.inner.write().await;

        if inner
            .reviews
            .iter()
            .any(|r| r.user_id == new.user_id && r.restaurant_id == new.restaurant_id)
        {
            return Err(AppError::InvalidInput(
                "You already reviewed this restaurant".to_string(),
            ));
        }

        let review = Review::new(new);
        inner.reviews.push(review.clone());
        inner.recompute_rating(review.restaurant_id);
        Ok(review)
    }

    async fn update_review(
        &self,
        user_id: Uuid,
        review_id: Uuid,
        patch: ReviewPatch,
    ) -> AppResult<Option<Review>> {
        let mut inner = self.inner.write().await;

        let Some(review) = inner
            .reviews
            .iter_mut()
            .find(|r| r.id == review_id && r.user_id == user_id)
        else {
            return Ok(None);
        };

        review.apply(patch);
        let updated = review.clone();
        inner.recompute_rating(updated.restaurant_id);
        Ok(Some(updated))
    }

    async fn delete_review(&self, user_id: Uuid, review_id: Uuid) -> AppResult<Option<Review>> {
        let mut inner = self.inner.write().await;

        let Some(position) = inner
            .reviews
            .iter()
            .position(|r| r.id == review_id && r.user_id == user_id)
        else {
            return Ok(None);
        };

        let removed = inner.reviews.remove(position);
        inner.recompute_rating(removed.restaurant_id);
        Ok(Some(removed))
    }
}

#[async_trait::async_trait]
impl RecommendationSource for MemoryStore {
    async fn find_user_signals(&self, user_id: Uuid) -> AppResult<Option<UserSignals>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&user_id).map(|user| UserSignals {
            user_id,
            favorites: user
                .favorites
                .iter()
                .map(|id| inner.restaurant_ref(*id))
                .collect(),
            preferred_cuisines: user.preferred_cuisines.clone(),
        }))
    }

    async fn find_reviews_by_user(
        &self,
        user_id: Uuid,
        min_rating: Option<i16>,
    ) -> AppResult<Vec<ReviewSignal>> {
        let inner = self.inner.read().await;
        Ok(inner
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter(|r| min_rating.map_or(true, |min| r.rating >= min))
            .map(|r| ReviewSignal {
                restaurant: inner.restaurant_ref(r.restaurant_id),
                rating: r.rating,
            })
            .collect())
    }

    async fn find_restaurants(&self, query: &RestaurantQuery) -> AppResult<Vec<Restaurant>> {
        let inner = self.inner.read().await;
        let mut matches =
            MemoryStoreInner::by_rating_desc(inner.ordered_restaurants().filter(|r| query.matches(r)));
        matches.truncate(query.limit);
        Ok(matches)
    }

    async fn find_top_rated_restaurants(&self, limit: usize) -> AppResult<Vec<Restaurant>> {
        let inner = self.inner.read().await;
        let mut top = MemoryStoreInner::by_rating_desc(inner.ordered_restaurants());
        top.truncate(limit);
        Ok(top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_restaurant(name: &str, cuisine: &str) -> NewRestaurant {
        NewRestaurant {
            name: name.to_string(),
            cuisine: cuisine.to_string(),
            address: "Anna Salai".to_string(),
            area: None,
            location: None,
            description: None,
            image: None,
            is_pure_veg: false,
        }
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".to_string(),
            email: email.to_string(),
        }
    }

    fn new_review(user_id: Uuid, restaurant_id: Uuid, rating: i16) -> NewReview {
        NewReview {
            restaurant_id,
            user_id,
            rating,
            comment: None,
        }
    }

    #[tokio::test]
    async fn test_rating_recomputed_on_every_mutation() {
        let store = MemoryStore::new();
        let restaurant = store
            .create_restaurant(new_restaurant("Saravana", "South Indian"))
            .await
            .unwrap();

        let mut reviews = Vec::new();
        for (i, rating) in [4, 5, 3].into_iter().enumerate() {
            let user = store
                .create_user(new_user(&format!("u{}@example.com", i)))
                .await
                .unwrap();
            let review = store
                .create_review(new_review(user.id, restaurant.id, rating))
                .await
                .unwrap();
            reviews.push(review);
        }

        let r = store.find_restaurant(restaurant.id).await.unwrap().unwrap();
        assert_eq!(r.rating, 4.0);
        assert_eq!(r.review_count, 3);

        let low = &reviews[2];
        store.delete_review(low.user_id, low.id).await.unwrap();
        let r = store.find_restaurant(restaurant.id).await.unwrap().unwrap();
        assert_eq!(r.rating, 4.5);
        assert_eq!(r.review_count, 2);

        for review in &reviews[..2] {
            store.delete_review(review.user_id, review.id).await.unwrap();
        }
        let r = store.find_restaurant(restaurant.id).await.unwrap().unwrap();
        assert_eq!(r.rating, 0.0);
        assert_eq!(r.review_count, 0);
    }

    #[tokio::test]
    async fn test_update_recomputes_rating() {
        let store = MemoryStore::new();
        let restaurant = store
            .create_restaurant(new_restaurant("Murugan", "South Indian"))
            .await
            .unwrap();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        let review = store
            .create_review(new_review(user.id, restaurant.id, 2))
            .await
            .unwrap();

        store
            .update_review(
                user.id,
                review.id,
                ReviewPatch {
                    rating: Some(5),
                    comment: None,
                },
            )
            .await
            .unwrap()
            .unwrap();

        let r = store.find_restaurant(restaurant.id).await.unwrap().unwrap();
        assert_eq!(r.rating, 5.0);
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let store = MemoryStore::new();
        let quiet = store
            .create_restaurant(new_restaurant("Quiet Dosa Corner", "South Indian"))
            .await
            .unwrap();
        let busy = store
            .create_restaurant(new_restaurant("Busy Dosa Hub", "South Indian"))
            .await
            .unwrap();
        store
            .create_restaurant(new_restaurant("Wok Express", "Chinese"))
            .await
            .unwrap();

        let first = store.create_user(new_user("f1@example.com")).await.unwrap();
        let second = store.create_user(new_user("f2@example.com")).await.unwrap();
        store
            .create_review(new_review(first.id, quiet.id, 5))
            .await
            .unwrap();
        store
            .create_review(new_review(first.id, busy.id, 3))
            .await
            .unwrap();
        store
            .create_review(new_review(second.id, busy.id, 4))
            .await
            .unwrap();

        let mut filter = RestaurantFilter {
            q: Some("DOSA".to_string()),
            ..Default::default()
        };
        let by_rating: Vec<Uuid> = store
            .list_restaurants(&filter)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(by_rating, vec![quiet.id, busy.id]);

        filter.sort = RestaurantSort::Reviews;
        let by_reviews: Vec<Uuid> = store
            .list_restaurants(&filter)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(by_reviews, vec![busy.id, quiet.id]);

        let all = store
            .list_restaurants(&RestaurantFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_restaurant_reviews_newest_first() {
        let store = MemoryStore::new();
        let restaurant = store
            .create_restaurant(new_restaurant("Ratna Cafe", "South Indian"))
            .await
            .unwrap();

        let mut ids = Vec::new();
        for i in 0..3 {
            let user = store
                .create_user(new_user(&format!("order{}@example.com", i)))
                .await
                .unwrap();
            let review = store
                .create_review(new_review(user.id, restaurant.id, 4))
                .await
                .unwrap();
            ids.push(review.id);
        }
        ids.reverse();

        let listed: Vec<Uuid> = store
            .reviews_by_restaurant(restaurant.id)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_one_review_per_user_and_restaurant() {
        let store = MemoryStore::new();
        let restaurant = store
            .create_restaurant(new_restaurant("Buhari", "Mughlai"))
            .await
            .unwrap();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();

        store
            .create_review(new_review(user.id, restaurant.id, 4))
            .await
            .unwrap();
        let second = store
            .create_review(new_review(user.id, restaurant.id, 5))
            .await;

        assert!(matches!(second, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_only_owner_can_mutate_review() {
        let store = MemoryStore::new();
        let restaurant = store
            .create_restaurant(new_restaurant("Buhari", "Mughlai"))
            .await
            .unwrap();
        let owner = store.create_user(new_user("a@example.com")).await.unwrap();
        let other = store.create_user(new_user("b@example.com")).await.unwrap();
        let review = store
            .create_review(new_review(owner.id, restaurant.id, 4))
            .await
            .unwrap();

        assert!(store.delete_review(other.id, review.id).await.unwrap().is_none());
        assert!(store
            .update_review(other.id, review.id, ReviewPatch::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@example.com")).await.unwrap();
        let result = store.create_user(new_user("A@example.com")).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_top_rated_ties_keep_insertion_order() {
        let store = MemoryStore::new();
        let first = store
            .create_restaurant(new_restaurant("First", "Thai"))
            .await
            .unwrap();
        let second = store
            .create_restaurant(new_restaurant("Second", "Thai"))
            .await
            .unwrap();

        let top = store.find_top_rated_restaurants(10).await.unwrap();
        let ids: Vec<Uuid> = top.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_dangling_favorite_has_no_cuisine() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        let missing = Uuid::new_v4();
        store.add_favorite(user.id, missing).await.unwrap();

        let signals = store.find_user_signals(user.id).await.unwrap().unwrap();
        assert_eq!(
            signals.favorites,
            vec![RestaurantRef {
                id: missing,
                cuisine: None
            }]
        );
    }

    #[tokio::test]
    async fn test_reviews_by_user_min_rating() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        let high = store
            .create_restaurant(new_restaurant("High", "Thai"))
            .await
            .unwrap();
        let low = store
            .create_restaurant(new_restaurant("Low", "Chinese"))
            .await
            .unwrap();
        store
            .create_review(new_review(user.id, high.id, 4))
            .await
            .unwrap();
        store
            .create_review(new_review(user.id, low.id, 2))
            .await
            .unwrap();

        let all = store.find_reviews_by_user(user.id, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let liked = store.find_reviews_by_user(user.id, Some(4)).await.unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].restaurant.cuisine.as_deref(), Some("Thai"));
    }
}
