use crate::error::{AppError, AppResult};

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

/// Aggregate rating of a restaurant derived from its reviews
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    /// Mean review rating, 0 when there are no reviews
    pub rating: f64,
    pub review_count: i32,
}

impl RatingSummary {
    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = i16>,
    {
        let (sum, count) = ratings
            .into_iter()
            .fold((0i64, 0i32), |(sum, count), r| (sum + r as i64, count + 1));

        let rating = if count == 0 {
            0.0
        } else {
            sum as f64 / count as f64
        };

        Self {
            rating,
            review_count: count,
        }
    }
}

/// Rejects ratings outside `1..=5`
pub fn validate_rating(rating: i16) -> AppResult<i16> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(rating)
    } else {
        Err(AppError::InvalidInput(format!(
            "Rating must be between {} and {}, got {}",
            MIN_RATING, MAX_RATING, rating
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_of_ratings() {
        let summary = RatingSummary::from_ratings([4, 5, 3]);
        assert_eq!(summary.rating, 4.0);
        assert_eq!(summary.review_count, 3);
    }

    #[test]
    fn test_recompute_after_removal() {
        let summary = RatingSummary::from_ratings([4, 5]);
        assert_eq!(summary.rating, 4.5);
        assert_eq!(summary.review_count, 2);
    }

    #[test]
    fn test_no_reviews_is_zero() {
        let summary = RatingSummary::from_ratings(std::iter::empty());
        assert_eq!(summary.rating, 0.0);
        assert_eq!(summary.review_count, 0);
    }

    #[test]
    fn test_validate_rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }
}
