use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::store::{RecommendationSource, RestaurantStore, ReviewStore, UserStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        NewRestaurant, NewReview, NewUser, Restaurant, RestaurantFilter, RestaurantQuery,
        RestaurantRef, RestaurantSort, Review, ReviewPatch, ReviewSignal, User, UserSignals,
    },
};

const RESTAURANT_COLUMNS: &str = "id, name, cuisine, rating, review_count, address, area, \
     location, description, image, is_pure_veg, created_at";

const REVIEW_COLUMNS: &str = "id, restaurant_id, user_id, rating, comment, created_at";

/// Rating order shared by every restaurant listing; ties fall back to age then id
const RATING_ORDER: &str = "ORDER BY rating DESC, created_at ASC, id ASC";

const REVIEW_COUNT_ORDER: &str = "ORDER BY review_count DESC, rating DESC, created_at ASC, id ASC";

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the schema in `migrations/`
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    preferred_cuisines: Vec<String>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ReviewSignalRow {
    restaurant_id: Uuid,
    rating: i16,
    cuisine: Option<String>,
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// `%needle%` for `ILIKE`, with the pattern metacharacters escaped
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn sort_order(sort: RestaurantSort) -> &'static str {
    match sort {
        RestaurantSort::Rating => RATING_ORDER,
        RestaurantSort::Reviews => REVIEW_COUNT_ORDER,
    }
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn user_exists(&self, user_id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn favorite_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar(
            "SELECT restaurant_id FROM user_favorites WHERE user_id = $1 \
             ORDER BY created_at ASC, restaurant_id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Locks the restaurant row so concurrent review writes recompute one at a time
    async fn lock_restaurant(
        tx: &mut Transaction<'_, Postgres>,
        restaurant_id: Uuid,
    ) -> AppResult<bool> {
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM restaurants WHERE id = $1 FOR UPDATE")
                .bind(restaurant_id)
                .fetch_optional(&mut **tx)
                .await?;
        Ok(locked.is_some())
    }

    async fn recompute_rating(
        tx: &mut Transaction<'_, Postgres>,
        restaurant_id: Uuid,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE restaurants SET
                rating = COALESCE(
                    (SELECT AVG(rating)::float8 FROM reviews WHERE restaurant_id = $1), 0),
                review_count = (SELECT COUNT(*)::int4 FROM reviews WHERE restaurant_id = $1)
            WHERE id = $1
            "#,
        )
        .bind(restaurant_id)
        .execute(&mut **tx)
        .await?;

        tracing::debug!(restaurant_id = %restaurant_id, "Recomputed restaurant rating");
        Ok(())
    }

    /// Restaurant owning a review, locked for the rest of the transaction
    async fn lock_review_restaurant(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        review_id: Uuid,
    ) -> AppResult<Option<Uuid>> {
        let restaurant_id: Option<Uuid> =
            sqlx::query_scalar("SELECT restaurant_id FROM reviews WHERE id = $1 AND user_id = $2")
                .bind(review_id)
                .bind(user_id)
                .fetch_optional(&mut **tx)
                .await?;

        if let Some(restaurant_id) = restaurant_id {
            Self::lock_restaurant(tx, restaurant_id).await?;
        }
        Ok(restaurant_id)
    }
}

#[async_trait::async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, new: NewUser) -> AppResult<User> {
        let user = User::new(new);

        let result = sqlx::query(
            "INSERT INTO users (id, name, email, preferred_cuisines, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.preferred_cuisines)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                AppError::InvalidInput(format!("Email {} is already registered", user.email)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, name, email, preferred_cuisines, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let favorites = self.favorite_ids(id).await?;
        Ok(Some(User {
            id: row.id,
            name: row.name,
            email: row.email,
            favorites,
            preferred_cuisines: row.preferred_cuisines,
            created_at: row.created_at,
        }))
    }

    async fn add_favorite(
        &self,
        user_id: Uuid,
        restaurant_id: Uuid,
    ) -> AppResult<Option<Vec<Uuid>>> {
        if !self.user_exists(user_id).await? {
            return Ok(None);
        }

        sqlx::query(
            "INSERT INTO user_favorites (user_id, restaurant_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(restaurant_id)
        .execute(&self.pool)
        .await?;

        Ok(Some(self.favorite_ids(user_id).await?))
    }

    async fn remove_favorite(
        &self,
        user_id: Uuid,
        restaurant_id: Uuid,
    ) -> AppResult<Option<Vec<Uuid>>> {
        if !self.user_exists(user_id).await? {
            return Ok(None);
        }

        sqlx::query("DELETE FROM user_favorites WHERE user_id = $1 AND restaurant_id = $2")
            .bind(user_id)
            .bind(restaurant_id)
            .execute(&self.pool)
            .await?;

        Ok(Some(self.favorite_ids(user_id).await?))
    }

    async fn set_preferred_cuisines(
        &self,
        user_id: Uuid,
        cuisines: Vec<String>,
    ) -> AppResult<Option<Vec<String>>> {
        let updated: Option<Vec<String>> = sqlx::query_scalar(
            "UPDATE users SET preferred_cuisines = $2 WHERE id = $1 RETURNING preferred_cuisines",
        )
        .bind(user_id)
        .bind(&cuisines)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }
}

#[async_trait::async_trait]
impl RestaurantStore for PgStore {
    async fn create_restaurant(&self, new: NewRestaurant) -> AppResult<Restaurant> {
        let restaurant = Restaurant::new(new);

        sqlx::query(&format!(
            "INSERT INTO restaurants ({RESTAURANT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        ))
        .bind(restaurant.id)
        .bind(&restaurant.name)
        .bind(&restaurant.cuisine)
        .bind(restaurant.rating)
        .bind(restaurant.review_count)
        .bind(&restaurant.address)
        .bind(&restaurant.area)
        .bind(&restaurant.location)
        .bind(&restaurant.description)
        .bind(&restaurant.image)
        .bind(restaurant.is_pure_veg)
        .bind(restaurant.created_at)
        .execute(&self.pool)
        .await?;

        Ok(restaurant)
    }

    async fn find_restaurant(&self, id: Uuid) -> AppResult<Option<Restaurant>> {
        let restaurant = sqlx::query_as(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(restaurant)
    }

    async fn find_restaurants_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Restaurant>> {
        let rows: Vec<Restaurant> = sqlx::query_as(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_id: HashMap<Uuid, Restaurant> = rows.into_iter().map(|r| (r.id, r)).collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn list_restaurants(&self, filter: &RestaurantFilter) -> AppResult<Vec<Restaurant>> {
        let restaurants = sqlx::query_as(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants \
             WHERE ($1::text IS NULL OR name ILIKE $1 OR cuisine ILIKE $1 \
                    OR description ILIKE $1 OR address ILIKE $1) \
               AND ($2::text IS NULL OR cuisine ILIKE $2) \
               AND ($3::text IS NULL OR address ILIKE $3 OR area ILIKE $3 OR location ILIKE $3) \
             {}",
            sort_order(filter.sort)
        ))
        .bind(filter.q.as_deref().map(like_pattern))
        .bind(filter.cuisine.as_deref().map(like_pattern))
        .bind(filter.location.as_deref().map(like_pattern))
        .fetch_all(&self.pool)
        .await?;
        Ok(restaurants)
    }
}

#[async_trait::async_trait]
impl ReviewStore for PgStore {
    async fn reviews_by_user(&self, user_id: Uuid) -> AppResult<Vec<Review>> {
        let reviews = sqlx::query_as(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE user_id = $1 ORDER BY created_at ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    async fn reviews_by_restaurant(&self, restaurant_id: Uuid) -> AppResult<Vec<Review>> {
        let reviews = sqlx::query_as(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE restaurant_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    async fn create_review(&self, new: NewReview) -> AppResult<Review> {
        let review = Review::new(new);
        let mut tx = self.pool.begin().await?;

        if !Self::lock_restaurant(&mut tx, review.restaurant_id).await? {
            return Err(AppError::NotFound(format!(
                "Restaurant {} not found",
                review.restaurant_id
            )));
        }

        let inserted = sqlx::query(&format!(
            "INSERT INTO reviews ({REVIEW_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
        ))
        .bind(review.id)
        .bind(review.restaurant_id)
        .bind(review.user_id)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(AppError::InvalidInput(
                    "You already reviewed this restaurant".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        Self::recompute_rating(&mut tx, review.restaurant_id).await?;
        tx.commit().await?;
        Ok(review)
    }

    async fn update_review(
        &self,
        user_id: Uuid,
        review_id: Uuid,
        patch: ReviewPatch,
    ) -> AppResult<Option<Review>> {
        let mut tx = self.pool.begin().await?;

        let Some(restaurant_id) = Self::lock_review_restaurant(&mut tx, user_id, review_id).await?
        else {
            return Ok(None);
        };

        let review: Review = sqlx::query_as(&format!(
            "UPDATE reviews SET rating = COALESCE($3, rating), comment = COALESCE($4, comment) \
             WHERE id = $1 AND user_id = $2 RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(review_id)
        .bind(user_id)
        .bind(patch.rating)
        .bind(patch.comment)
        .fetch_one(&mut *tx)
        .await?;

        Self::recompute_rating(&mut tx, restaurant_id).await?;
        tx.commit().await?;
        Ok(Some(review))
    }

    async fn delete_review(&self, user_id: Uuid, review_id: Uuid) -> AppResult<Option<Review>> {
        let mut tx = self.pool.begin().await?;

        let Some(restaurant_id) = Self::lock_review_restaurant(&mut tx, user_id, review_id).await?
        else {
            return Ok(None);
        };

        let review: Review = sqlx::query_as(&format!(
            "DELETE FROM reviews WHERE id = $1 AND user_id = $2 RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(review_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::recompute_rating(&mut tx, restaurant_id).await?;
        tx.commit().await?;
        Ok(Some(review))
    }
}

#[async_trait::async_trait]
impl RecommendationSource for PgStore {
    async fn find_user_signals(&self, user_id: Uuid) -> AppResult<Option<UserSignals>> {
        let preferred_cuisines: Option<Vec<String>> =
            sqlx::query_scalar("SELECT preferred_cuisines FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(preferred_cuisines) = preferred_cuisines else {
            return Ok(None);
        };

        let favorites: Vec<RestaurantRef> = sqlx::query_as(
            "SELECT f.restaurant_id AS id, r.cuisine \
             FROM user_favorites f LEFT JOIN restaurants r ON r.id = f.restaurant_id \
             WHERE f.user_id = $1 ORDER BY f.created_at ASC, f.restaurant_id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(UserSignals {
            user_id,
            favorites,
            preferred_cuisines,
        }))
    }

    async fn find_reviews_by_user(
        &self,
        user_id: Uuid,
        min_rating: Option<i16>,
    ) -> AppResult<Vec<ReviewSignal>> {
        let rows: Vec<ReviewSignalRow> = sqlx::query_as(
            "SELECT rv.restaurant_id, rv.rating, r.cuisine \
             FROM reviews rv LEFT JOIN restaurants r ON r.id = rv.restaurant_id \
             WHERE rv.user_id = $1 AND ($2::int2 IS NULL OR rv.rating >= $2) \
             ORDER BY rv.created_at ASC",
        )
        .bind(user_id)
        .bind(min_rating)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ReviewSignal {
                restaurant: RestaurantRef {
                    id: row.restaurant_id,
                    cuisine: row.cuisine,
                },
                rating: row.rating,
            })
            .collect())
    }

    async fn find_restaurants(&self, query: &RestaurantQuery) -> AppResult<Vec<Restaurant>> {
        let restaurants = sqlx::query_as(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants \
             WHERE cuisine = ANY($1) AND NOT (id = ANY($2)) {RATING_ORDER} LIMIT $3"
        ))
        .bind(&query.cuisine_in)
        .bind(&query.exclude_ids)
        .bind(sql_limit(query.limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(restaurants)
    }

    async fn find_top_rated_restaurants(&self, limit: usize) -> AppResult<Vec<Restaurant>> {
        let restaurants = sqlx::query_as(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants {RATING_ORDER} LIMIT $1"
        ))
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(restaurants)
    }
}
