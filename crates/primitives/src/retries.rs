use tokio_retry::{RetryIf, strategy::ExponentialBackoff};

/// The default maximum number of retries for a failed operation.
///
/// With a `DEFAULT_INITIAL_BACKOFF_MS` of 50ms this gives up after ~1.5s.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// The default initial backoff time in milliseconds for a failed operation.
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 50;

/// Retry the provided async operation using [`ExponentialBackoff`].
///
/// Retries are attempted as long as the provided `condition` returns `true` for
/// the error produced by the operation, up to `DEFAULT_MAX_RETRIES` attempts
/// starting at `DEFAULT_INITIAL_BACKOFF_MS`.
pub async fn retry_with_backoff_if<F, Fut, T, E, C>(op: F, condition: C) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
{
    let strategy = ExponentialBackoff::from_millis(DEFAULT_INITIAL_BACKOFF_MS)
        .take(DEFAULT_MAX_RETRIES as usize);
    RetryIf::spawn(strategy, op, condition).await
}
