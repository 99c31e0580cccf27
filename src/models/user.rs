use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Restaurant, Review};

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Favorited restaurant ids, oldest first
    pub favorites: Vec<Uuid>,
    pub preferred_cuisines: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for registering a user
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(new: NewUser) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            favorites: Vec::new(),
            preferred_cuisines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a favorite if not already present
    pub fn add_favorite(&mut self, restaurant_id: Uuid) {
        if !self.favorites.contains(&restaurant_id) {
            self.favorites.push(restaurant_id);
        }
    }

    pub fn remove_favorite(&mut self, restaurant_id: Uuid) {
        self.favorites.retain(|id| *id != restaurant_id);
    }
}

/// Profile with favorites resolved to restaurants
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub preferred_cuisines: Vec<String>,
    pub favorites: Vec<Restaurant>,
}

/// Profile plus the user's own reviews
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub user: UserProfile,
    pub reviews: Vec<Review>,
}
