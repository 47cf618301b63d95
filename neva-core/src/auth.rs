//! Password retry policy
//!
//! Meters often ignore the first password packet right after a speed change.
//! The password is resent with a linearly growing pause:
//!
//! ```text
//! attempt 0 -> fail -> wait base
//! attempt 1 -> fail -> wait base + step
//! attempt 2 -> fail -> wait base + 2 * step
//! attempt 3 -> fail -> give up
//! ```

use std::time::Duration;

use crate::constants::auth::{BACKOFF_BASE, BACKOFF_STEP, MAX_RETRIES};

/// Bounded linear backoff for authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay after the first failed attempt
    pub base: Duration,

    /// Added per further failed attempt
    pub step: Duration,
}

impl RetryPolicy {
    /// Total attempts, including the first one
    pub fn attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay after failed attempt `attempt` (0-based), or `None` when it was the last one
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use neva_core::RetryPolicy;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.delay(0), Some(Duration::from_millis(500)));
    /// assert_eq!(policy.delay(2), Some(Duration::from_millis(700)));
    /// assert_eq!(policy.delay(3), None);
    /// ```
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }
        Some(self.base + self.step * attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base: BACKOFF_BASE,
            step: BACKOFF_STEP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts(), 4);
    }

    #[test]
    fn test_delays_strictly_increase() {
        let policy = RetryPolicy::default();
        let delays: Vec<_> = (0..policy.attempts()).map_while(|a| policy.delay(a)).collect();

        assert_eq!(
            delays,
            vec![
                Duration::from_millis(500),
                Duration::from_millis(600),
                Duration::from_millis(700),
            ]
        );
        assert!(delays.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_no_retries() {
        let policy = RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.attempts(), 1);
        assert_eq!(policy.delay(0), None);
    }
}
