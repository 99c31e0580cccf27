use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Review;

/// A restaurant as stored and returned to clients
///
/// `rating` is the mean of the restaurant's review ratings (0 when it has none)
/// and is recomputed by the store after every review mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    /// Free-form cuisine label, possibly a composite such as "Italian, Continental"
    pub cuisine: String,
    pub rating: f64,
    pub review_count: i32,
    pub address: String,
    pub area: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_pure_veg: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a restaurant
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRestaurant {
    pub name: String,
    pub cuisine: String,
    pub address: String,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub is_pure_veg: bool,
}

impl Restaurant {
    /// Builds an unrated restaurant from a creation payload
    pub fn new(new: NewRestaurant) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            cuisine: new.cuisine,
            rating: 0.0,
            review_count: 0,
            address: new.address,
            area: new.area,
            location: new.location,
            description: new.description,
            image: new.image,
            is_pure_veg: new.is_pure_veg,
            created_at: Utc::now(),
        }
    }
}

/// A restaurant together with its reviews
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantDetail {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub reviews: Vec<Review>,
}

/// Candidate query issued by the recommender
///
/// Matches restaurants whose cuisine equals one of `cuisine_in` exactly and whose
/// id is not in `exclude_ids`. Results are ordered by rating, highest first.
#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantQuery {
    pub cuisine_in: Vec<String>,
    pub exclude_ids: Vec<Uuid>,
    pub limit: usize,
}

impl RestaurantQuery {
    /// Returns true if the restaurant satisfies the cuisine and exclusion filters
    pub fn matches(&self, restaurant: &Restaurant) -> bool {
        self.cuisine_in.iter().any(|c| *c == restaurant.cuisine)
            && !self.exclude_ids.contains(&restaurant.id)
    }
}

/// Ordering for restaurant listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestaurantSort {
    /// Highest rated first
    #[default]
    Rating,
    /// Most reviewed first, then highest rated
    Reviews,
}

/// Listing and search filters
///
/// Text filters are case-insensitive substring matches. `q` looks at name,
/// cuisine, description and address; `location` at address, area and location.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RestaurantFilter {
    #[serde(default, alias = "search")]
    pub q: Option<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub sort: RestaurantSort,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn optional_contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| contains_ci(h, needle))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl RestaurantFilter {
    /// Trims text filters and drops blank ones
    pub fn normalized(self) -> Self {
        Self {
            q: trimmed(self.q),
            cuisine: trimmed(self.cuisine),
            location: trimmed(self.location),
            sort: self.sort,
        }
    }

    pub fn matches(&self, restaurant: &Restaurant) -> bool {
        let text = self.q.as_deref().map_or(true, |q| {
            contains_ci(&restaurant.name, q)
                || contains_ci(&restaurant.cuisine, q)
                || optional_contains_ci(restaurant.description.as_deref(), q)
                || contains_ci(&restaurant.address, q)
        });
        let cuisine = self
            .cuisine
            .as_deref()
            .map_or(true, |c| contains_ci(&restaurant.cuisine, c));
        let location = self.location.as_deref().map_or(true, |l| {
            contains_ci(&restaurant.address, l)
                || optional_contains_ci(restaurant.area.as_deref(), l)
                || optional_contains_ci(restaurant.location.as_deref(), l)
        });

        text && cuisine && location
    }
}

/// Response of a free-text restaurant search
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub count: usize,
    pub restaurants: Vec<Restaurant>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restaurant(cuisine: &str) -> Restaurant {
        Restaurant::new(NewRestaurant {
            name: "Test".to_string(),
            cuisine: cuisine.to_string(),
            address: "1 Main St".to_string(),
            area: None,
            location: None,
            description: None,
            image: None,
            is_pure_veg: false,
        })
    }

    #[test]
    fn test_new_restaurant_is_unrated() {
        let r = restaurant("Thai");
        assert_eq!(r.rating, 0.0);
        assert_eq!(r.review_count, 0);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(restaurant("Thai")).unwrap();
        assert!(json.get("reviewCount").is_some());
        assert!(json.get("isPureVeg").is_some());
        assert!(json.get("review_count").is_none());
    }

    #[test]
    fn test_query_matches_composite_cuisine_only_exactly() {
        let composite = restaurant("Italian, Continental");
        let query = RestaurantQuery {
            cuisine_in: vec!["Italian".to_string()],
            exclude_ids: vec![],
            limit: 10,
        };
        assert!(!query.matches(&composite));

        let exact = RestaurantQuery {
            cuisine_in: vec!["Italian, Continental".to_string()],
            exclude_ids: vec![],
            limit: 10,
        };
        assert!(exact.matches(&composite));
    }

    #[test]
    fn test_query_respects_exclusions() {
        let r = restaurant("Thai");
        let query = RestaurantQuery {
            cuisine_in: vec!["Thai".to_string()],
            exclude_ids: vec![r.id],
            limit: 10,
        };
        assert!(!query.matches(&r));
    }

    #[test]
    fn test_filter_matches_case_insensitively() {
        let mut r = restaurant("South Indian");
        r.name = "Murugan Idli Shop".to_string();
        r.area = Some("T. Nagar".to_string());

        let by_name = RestaurantFilter {
            q: Some("idli".to_string()),
            ..Default::default()
        };
        assert!(by_name.matches(&r));

        let by_area = RestaurantFilter {
            location: Some("nagar".to_string()),
            cuisine: Some("INDIAN".to_string()),
            ..Default::default()
        };
        assert!(by_area.matches(&r));

        let miss = RestaurantFilter {
            q: Some("idli".to_string()),
            cuisine: Some("Thai".to_string()),
            ..Default::default()
        };
        assert!(!miss.matches(&r));
    }

    #[test]
    fn test_filter_normalizes_blanks() {
        let filter = RestaurantFilter {
            q: Some("  dosa ".to_string()),
            cuisine: Some("   ".to_string()),
            location: None,
            sort: RestaurantSort::Reviews,
        }
        .normalized();
        assert_eq!(filter.q.as_deref(), Some("dosa"));
        assert_eq!(filter.cuisine, None);
        assert_eq!(filter.sort, RestaurantSort::Reviews);
    }

    #[test]
    fn test_filter_from_query_string() {
        let filter: RestaurantFilter =
            serde_json::from_value(serde_json::json!({ "search": "biryani", "sort": "reviews" }))
                .unwrap();
        assert_eq!(filter.q.as_deref(), Some("biryani"));
        assert_eq!(filter.sort, RestaurantSort::Reviews);
    }
}
