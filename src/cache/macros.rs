/// A macro to simplify the check-compute-store pattern around the response
/// cache.
///
/// Checks the cache for the key first and returns the hit if present. On a
/// miss it awaits the provided block, stores the computed value, and returns
/// it. The TTL comes from the key's prefix policy, so callers never pass one.
///
/// # Arguments
/// * `$cache`: the `ResponseCache` to consult.
/// * `$key`: the `CacheKey` identifying the request.
/// * `$block`: an async block producing `AppResult<T>` on a miss.
///
/// # Example
/// ```rust,ignore
/// let response = cached!(state.cache, key, async {
///     orchestrator::search(&library, None, &query, 1).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $block:expr) => {{
        if let Some(hit) = $cache.get(&$key) {
            Ok::<_, $crate::error::AppError>(hit)
        } else {
            let computed: $crate::error::AppResult<_> = $block.await;
            let value = computed?;
            $cache.set(&$key, &value);
            Ok::<_, $crate::error::AppError>(value)
        }
    }};
}
