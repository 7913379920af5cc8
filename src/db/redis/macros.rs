/// Serves a news response from Redis, falling back to the provided block.
///
/// A cache hit short-circuits the block. On a miss the block is awaited and
/// only `Fetched::Data` is written back, so an outage is never cached. Cache
/// read errors are logged and treated as misses.
///
/// # Arguments
/// * `$cache`: a `Cache` with `get_from_cache` and `set_in_background`.
/// * `$key`: the `CacheKey` for the value.
/// * `$ttl`: time-to-live in seconds.
/// * `$block`: future yielding `AppResult<Fetched<T>>`.
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok($crate::services::Fetched::Data(cached))
            }
            miss => {
                if let Err(e) = miss {
                    tracing::warn!(key = %key, error = %e, "Cache read failed");
                }
                let fetched = $block.await?;
                if let $crate::services::Fetched::Data(ref value) = fetched {
                    $cache.set_in_background(&key, value, $ttl);
                }
                Ok(fetched)
            }
        }
    }};
}
