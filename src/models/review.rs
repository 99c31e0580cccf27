use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's review of a restaurant. At most one exists per (user, restaurant) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub user_id: Uuid,
    /// Rating in `1..=5`
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating a review
#[derive(Debug, Clone)]
pub struct NewReview {
    pub restaurant_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
}

/// Partial update applied by the review's owner
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
    #[serde(default)]
    pub rating: Option<i16>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Review {
    pub fn new(new: NewReview) -> Self {
        Self {
            id: Uuid::new_v4(),
            restaurant_id: new.restaurant_id,
            user_id: new.user_id,
            rating: new.rating,
            comment: new.comment,
            created_at: Utc::now(),
        }
    }

    /// Applies the fields present in the patch
    pub fn apply(&mut self, patch: ReviewPatch) {
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        if let Some(comment) = patch.comment {
            self.comment = Some(comment);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_partial_patch_keeps_comment() {
        let mut review = Review::new(NewReview {
            restaurant_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            rating: 3,
            comment: Some("ok".to_string()),
        });

        review.apply(ReviewPatch {
            rating: Some(5),
            comment: None,
        });

        assert_eq!(review.rating, 5);
        assert_eq!(review.comment.as_deref(), Some("ok"));
    }
}
