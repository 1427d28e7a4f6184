/// Get-or-compute helper for [`TtlCache`](crate::cache::TtlCache).
///
/// Returns the cached value for `$key` when present and unexpired. Otherwise
/// awaits `$block`, stores its `Ok` value under `$key` with the cache's TTL and
/// returns it. Errors from `$block` are propagated with `?` and never cached.
///
/// # Example
/// ```rust,ignore
/// let result = cached!(cache, query.to_string(), async move {
///     compute_expensive_value().await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $block:expr) => {{
        let key: String = $key;
        if let Some(hit) = $cache.get(&key).await {
            tracing::info!(key = %key, "Returning cached result");
            Ok(hit)
        } else {
            let value = $block.await?;
            $cache.insert(key, Clone::clone(&value)).await;
            Ok(value)
        }
    }};
}
