use std::collections::{HashMap, HashSet};

use tracing::instrument;
use uuid::Uuid;

use crate::{
    cached,
    db::{Cache, CacheKey, RecommendationSource},
    error::{AppError, AppResult},
    models::{BasedOn, RecommendationResult, Restaurant, RestaurantQuery},
};

/// Reviews rated at least this count as a cuisine signal
pub const HIGH_RATING_THRESHOLD: i16 = 4;

/// How many of the ranked cuisines are reported back to the caller
pub const REPORTED_CUISINES: usize = 3;

const TOP_RATED_CACHE_TTL: u64 = 60; // 1 minute

/// Number of signals that named a cuisine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuisineCount {
    pub cuisine: String,
    pub count: usize,
}

/// Tallies cuisine signals and ranks them by frequency, most frequent first
///
/// Cuisines are compared as opaque strings, so "Italian, Continental" and
/// "Italian" are distinct. Blank values are ignored. Equal counts keep the
/// order in which the cuisine was first seen.
pub fn rank_cuisines<'a, I>(signals: I) -> Vec<CuisineCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut tally: Vec<CuisineCount> = Vec::new();

    for cuisine in signals {
        if cuisine.trim().is_empty() {
            continue;
        }
        match index.get(cuisine) {
            Some(&i) => tally[i].count += 1,
            None => {
                index.insert(cuisine, tally.len());
                tally.push(CuisineCount {
                    cuisine: cuisine.to_string(),
                    count: 1,
                });
            }
        }
    }

    // sort_by is stable
    tally.sort_by(|a, b| b.count.cmp(&a.count));
    tally
}

/// Generates restaurant recommendations for a user
///
/// Cuisine signals come from the user's favorites, their preferred cuisines and
/// the restaurants they rated 4 or higher. Restaurants of the ranked cuisines
/// are returned highest rated first, excluding anything the user already
/// favorited or reviewed at any rating. A user with no signal at all gets the
/// global top rated list with no exclusions.
///
/// The user read and the review read run concurrently; the candidate query
/// depends on both.
#[instrument(skip(source, cache))]
pub async fn get_recommendations(
    source: &dyn RecommendationSource,
    cache: Option<&Cache>,
    user_id: Uuid,
    limit: usize,
) -> AppResult<RecommendationResult> {
    if limit == 0 {
        return Err(AppError::InvalidInput(
            "limit must be a positive integer".to_string(),
        ));
    }

    let (user, reviews) = tokio::join!(
        source.find_user_signals(user_id),
        source.find_reviews_by_user(user_id, None)
    );
    let user = user?.ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
    let reviews = reviews?;

    let unresolved = user
        .favorites
        .iter()
        .map(|f| &f.cuisine)
        .chain(reviews.iter().map(|r| &r.restaurant.cuisine))
        .filter(|c| c.is_none())
        .count();
    if unresolved > 0 {
        tracing::debug!(
            user_id = %user_id,
            unresolved,
            "Skipping restaurant references that no longer resolve"
        );
    }

    let favorite_cuisines = user.favorites.iter().filter_map(|f| f.cuisine.as_deref());
    let preferred_cuisines = user.preferred_cuisines.iter().map(String::as_str);
    let reviewed_cuisines = reviews
        .iter()
        .filter(|r| r.rating >= HIGH_RATING_THRESHOLD)
        .filter_map(|r| r.restaurant.cuisine.as_deref());

    // Ties keep first-seen order, so behavioral signals outrank declared ones
    let ranked = rank_cuisines(
        favorite_cuisines
            .chain(reviewed_cuisines)
            .chain(preferred_cuisines),
    );

    if ranked.is_empty() {
        tracing::info!(user_id = %user_id, "No cuisine signal, falling back to top rated");
        let recommendations = top_rated(source, cache, limit).await?;
        return Ok(RecommendationResult {
            recommendations,
            based_on: BasedOn::TopRated,
            preferred_cuisines: Vec::new(),
        });
    }

    let mut seen = HashSet::new();
    let exclude_ids: Vec<Uuid> = user
        .favorites
        .iter()
        .map(|f| f.id)
        .chain(reviews.iter().map(|r| r.restaurant.id))
        .filter(|id| seen.insert(*id))
        .collect();

    let query = RestaurantQuery {
        cuisine_in: ranked.iter().map(|c| c.cuisine.clone()).collect(),
        exclude_ids,
        limit,
    };

    tracing::debug!(
        user_id = %user_id,
        cuisines = ?query.cuisine_in,
        excluded = query.exclude_ids.len(),
        "Querying candidate restaurants"
    );

    let recommendations = source.find_restaurants(&query).await?;

    tracing::info!(
        user_id = %user_id,
        returned = recommendations.len(),
        "Personalized recommendations generated"
    );

    Ok(RecommendationResult {
        recommendations,
        based_on: BasedOn::UserPreferences,
        preferred_cuisines: ranked
            .into_iter()
            .take(REPORTED_CUISINES)
            .map(|c| c.cuisine)
            .collect(),
    })
}

/// Global top rated list, memoized in Redis when a cache is configured
async fn top_rated(
    source: &dyn RecommendationSource,
    cache: Option<&Cache>,
    limit: usize,
) -> AppResult<Vec<Restaurant>> {
    match cache {
        Some(cache) => {
            let top: AppResult<Vec<Restaurant>> = cached!(
                cache,
                CacheKey::TopRated(limit),
                TOP_RATED_CACHE_TTL,
                source.find_top_rated_restaurants(limit)
            );
            top
        }
        None => source.find_top_rated_restaurants(limit).await,
    }
}
