/// A macro to simplify caching logic using Redis.
///
/// This macro checks if a value is present in the cache.
/// If found, it returns the cached value. A cache read error counts as a miss.
/// If not found, it executes the provided block to compute the value,
/// stores it in the cache, and then returns the computed value.
///
/// # Arguments
/// * `$cache`: The cache instance to use for retrieval and storage. The cache must have
///   `get_from_cache` and `set_in_background` methods.
/// * `$key`: The key to use for caching the value.
/// * `$ttl`: The time-to-live (TTL) for the cached value in seconds.
/// * `$block`: The block of code to execute if the value is not found in cache.
///
/// # Example
/// ```ignore
/// let top = cached!(cache, CacheKey::TopRated(limit), 60, async {
///     source.find_top_rated_restaurants(limit).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        // A failed read is a miss; the block still answers from the source of truth
        let hit = match $cache.get_from_cache(&$key).await {
            Ok(hit) => hit,
            Err(e) => {
                ::tracing::warn!(error = %e, key = %$key, "Cache read failed, treating as miss");
                None
            }
        };

        if let Some(cached) = hit {
            Ok(cached)
        } else {
            // If not in cache, execute the block to compute the value
            let value = $block.await?;
            // Store the computed value in cache
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
