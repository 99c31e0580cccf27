/// Storage abstraction
///
/// The CRUD collaborators (`UserStore`, `RestaurantStore`, `ReviewStore`) back the
/// HTTP surface. `RecommendationSource` is the narrower read-only view the
/// recommender consumes. Both the in-memory and the Postgres store implement all four.
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        NewRestaurant, NewReview, NewUser, Restaurant, RestaurantFilter, RestaurantQuery, Review,
        ReviewPatch, ReviewSignal, User, UserSignals,
    },
};

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Registers a user. Fails with `InvalidInput` if the email is taken.
    async fn create_user(&self, new: NewUser) -> AppResult<User>;

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Adds a favorite (no-op if present) and returns the updated favorite ids.
    /// `None` if the user does not exist.
    async fn add_favorite(&self, user_id: Uuid, restaurant_id: Uuid)
        -> AppResult<Option<Vec<Uuid>>>;

    /// Removes a favorite and returns the updated favorite ids.
    async fn remove_favorite(
        &self,
        user_id: Uuid,
        restaurant_id: Uuid,
    ) -> AppResult<Option<Vec<Uuid>>>;

    /// Replaces the preferred cuisine list
    async fn set_preferred_cuisines(
        &self,
        user_id: Uuid,
        cuisines: Vec<String>,
    ) -> AppResult<Option<Vec<String>>>;
}

#[async_trait::async_trait]
pub trait RestaurantStore: Send + Sync {
    async fn create_restaurant(&self, new: NewRestaurant) -> AppResult<Restaurant>;

    async fn find_restaurant(&self, id: Uuid) -> AppResult<Option<Restaurant>>;

    /// Resolves ids to restaurants, preserving the order of `ids` and skipping
    /// ids that do not resolve.
    async fn find_restaurants_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Restaurant>>;

    /// Restaurants passing `filter`, in `filter.sort` order. Ties keep the
    /// oldest restaurant first.
    async fn list_restaurants(&self, filter: &RestaurantFilter) -> AppResult<Vec<Restaurant>>;
}

#[async_trait::async_trait]
pub trait ReviewStore: Send + Sync {
    /// A user's reviews, oldest first
    async fn reviews_by_user(&self, user_id: Uuid) -> AppResult<Vec<Review>>;

    /// A restaurant's reviews, newest first
    async fn reviews_by_restaurant(&self, restaurant_id: Uuid) -> AppResult<Vec<Review>>;

    /// Inserts the review and recomputes the restaurant's rating in one atomic step.
    /// Fails with `InvalidInput` if the user already reviewed the restaurant.
    async fn create_review(&self, new: NewReview) -> AppResult<Review>;

    /// Applies the patch if `review_id` exists and belongs to `user_id`, then
    /// recomputes the restaurant's rating.
    async fn update_review(
        &self,
        user_id: Uuid,
        review_id: Uuid,
        patch: ReviewPatch,
    ) -> AppResult<Option<Review>>;

    /// Deletes the review if it belongs to `user_id`, then recomputes the
    /// restaurant's rating.
    async fn delete_review(&self, user_id: Uuid, review_id: Uuid) -> AppResult<Option<Review>>;
}

/// Full CRUD store
pub trait Store: UserStore + RestaurantStore + ReviewStore {}

impl<T: UserStore + RestaurantStore + ReviewStore> Store for T {}

/// Reads the recommender depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationSource: Send + Sync {
    /// Loads the user with favorites resolved to their cuisines.
    /// `None` if the user does not exist.
    async fn find_user_signals(&self, user_id: Uuid) -> AppResult<Option<UserSignals>>;

    /// The user's reviews joined to the reviewed restaurant's cuisine, oldest first.
    /// With `min_rating` set only reviews rated at least that are returned.
    async fn find_reviews_by_user(
        &self,
        user_id: Uuid,
        min_rating: Option<i16>,
    ) -> AppResult<Vec<ReviewSignal>>;

    /// Restaurants matching the query, highest rated first, at most `query.limit`
    async fn find_restaurants(&self, query: &RestaurantQuery) -> AppResult<Vec<Restaurant>>;

    /// The globally highest rated restaurants, unfiltered
    async fn find_top_rated_restaurants(&self, limit: usize) -> AppResult<Vec<Restaurant>>;
}
