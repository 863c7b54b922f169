/// Resilience patterns for the notification client
///
/// This library provides:
/// - **Reconnect backoff**: linear delay (`base × attempt`) with a hard attempt cap
/// - **Timeout**: time limits on connection attempts and backend calls
///
/// # Example: Reconnect schedule
///
/// ```rust
/// use resilience::{Backoff, ReconnectPolicy};
/// use std::time::Duration;
///
/// let mut backoff = Backoff::new(ReconnectPolicy {
///     base_delay: Duration::from_secs(2),
///     max_attempts: 2,
/// });
///
/// assert_eq!(backoff.next_delay(), Some(Duration::from_secs(2)));
/// assert_eq!(backoff.next_delay(), Some(Duration::from_secs(4)));
/// assert_eq!(backoff.next_delay(), None);
/// ```

pub mod backoff;
pub mod timeout;

// Re-export main types for convenience
pub use backoff::{Backoff, ReconnectPolicy};
pub use timeout::{with_timeout, with_timeout_result, TimeoutError};
