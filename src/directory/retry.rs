// ⏳ Rate-limit retry policy
// Rate-limited calls are retried after a fixed delay (no backoff, no jitter).
// Every other failure goes straight back to the caller.

use std::thread;
use std::time::Duration;
use tracing::warn;

use crate::error::DirectoryError;

/// Blocks the calling thread between attempts. Swapped out in tests.
pub trait Sleeper {
    fn sleep(&self, delay: Duration);
}

/// `std::thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        thread::sleep(delay);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait between a rate-limited attempt and the next one
    pub delay: Duration,

    /// `None` retries forever
    pub max_retries: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            delay: Duration::from_secs(1),
            max_retries: None,
        }
    }
}

impl RetryPolicy {
    pub fn new(delay: Duration, max_retries: Option<u32>) -> Self {
        RetryPolicy { delay, max_retries }
    }

    /// Run `op` until it returns something other than a rate-limit error.
    pub fn run<T, F>(&self, sleeper: &dyn Sleeper, mut op: F) -> Result<T, DirectoryError>
    where
        F: FnMut() -> Result<T, DirectoryError>,
    {
        let mut retries: u32 = 0;

        loop {
            match op() {
                Err(err) if err.is_rate_limited() => {
                    if let Some(max) = self.max_retries {
                        if retries >= max {
                            return Err(DirectoryError::RetriesExhausted {
                                attempts: retries + 1,
                            });
                        }
                    }
                    retries += 1;
                    warn!(
                        "Rate limited, retrying in {}ms (retry {})",
                        self.delay.as_millis(),
                        retries
                    );
                    sleeper.sleep(self.delay);
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct RecordingSleeper {
        sleeps: RefCell<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, delay: Duration) {
            self.sleeps.borrow_mut().push(delay);
        }
    }

    fn rate_limited() -> DirectoryError {
        DirectoryError::RateLimited {
            message: "Rate limit exceeded".to_string(),
        }
    }

    #[test]
    fn test_retries_until_success() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::new(Duration::from_millis(250), None);
        let attempts = Cell::new(0);

        let result = policy.run(&sleeper, || {
            attempts.set(attempts.get() + 1);
            if attempts.get() <= 2 {
                Err(rate_limited())
            } else {
                Ok("done")
            }
        });

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.get(), 3);
        assert_eq!(
            *sleeper.sleeps.borrow(),
            vec![Duration::from_millis(250), Duration::from_millis(250)]
        );
    }

    #[test]
    fn test_other_errors_propagate_immediately() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::default();
        let attempts = Cell::new(0);

        let result: Result<(), _> = policy.run(&sleeper, || {
            attempts.set(attempts.get() + 1);
            Err(DirectoryError::Client {
                status: 500,
                message: "boom".to_string(),
            })
        });

        assert!(matches!(result, Err(DirectoryError::Client { status: 500, .. })));
        assert_eq!(attempts.get(), 1);
        assert!(sleeper.sleeps.borrow().is_empty());
    }

    #[test]
    fn test_cap_stops_retrying() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::new(Duration::from_millis(1), Some(2));
        let attempts = Cell::new(0);

        let result: Result<(), _> = policy.run(&sleeper, || {
            attempts.set(attempts.get() + 1);
            Err(rate_limited())
        });

        assert!(matches!(
            result,
            Err(DirectoryError::RetriesExhausted { attempts: 3 })
        ));
        assert_eq!(attempts.get(), 3);
        assert_eq!(sleeper.sleeps.borrow().len(), 2);
    }

    #[test]
    fn test_default_policy_is_unbounded() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay, Duration::from_secs(1));
        assert_eq!(policy.max_retries, None);
    }
}
