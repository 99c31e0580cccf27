use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Restaurant;

/// A restaurant reference carrying only what the recommender needs
///
/// `cuisine` is `None` when the reference no longer resolves to a restaurant.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RestaurantRef {
    pub id: Uuid,
    pub cuisine: Option<String>,
}

/// Preference signals stored on the user record
#[derive(Debug, Clone, PartialEq)]
pub struct UserSignals {
    pub user_id: Uuid,
    pub favorites: Vec<RestaurantRef>,
    pub preferred_cuisines: Vec<String>,
}

/// A review reduced to the reviewed restaurant and the rating given
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSignal {
    pub restaurant: RestaurantRef,
    pub rating: i16,
}

/// Which branch produced a recommendation list
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BasedOn {
    /// Ranked from the user's favorites, preferences and highly rated reviews
    UserPreferences,
    /// Cold-start fallback to the globally top rated restaurants
    TopRated,
}

/// Output of the recommender
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    pub recommendations: Vec<Restaurant>,
    pub based_on: BasedOn,
    /// Top cuisines used for ranking, empty for the fallback
    pub preferred_cuisines: Vec<String>,
}
