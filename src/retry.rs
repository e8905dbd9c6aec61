//! Bounded retry for transient generation failures

use std::time::Duration;
use log::{debug, error};

/// Pause after a failed connection attempt, regardless of the
/// configured rate-limit backoff
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Failures worth another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transient
{   RateLimited
  , ConnectionFailed
  , TimedOut
}

/// Retry policy shared by every transient failure of one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy
{   pub max_retries: usize
  , pub backoff: Duration
  , pub connect_delay: Duration
}

impl RetryPolicy
{   pub fn new(
      max_retries: usize
    , backoff: Duration
    ) -> Self
    {   RetryPolicy
        {   max_retries
          , backoff
          , connect_delay: CONNECT_RETRY_DELAY
        }
    }

    pub fn from_settings(
      settings: &crate::config::GeminiSettings
    ) -> Self
    {   RetryPolicy::new(settings.max_retries, settings.backoff())
    }

    /// Fails fast once `attempt` has used up the budget
    pub fn check(&self, attempt: usize)
      -> Result<(), crate::error::Error>
    {   if attempt >= self.max_retries
        {   error!(
              "Giving up after {} attempts (limit {})",
              attempt, self.max_retries
            );
            return Err(crate::error::Error::RetriesExhausted {
              attempts: attempt
            });
        }
        Ok(())
    }

    /// Wait before the next attempt, `None` to go again at once
    pub fn delay_for(&self, failure: Transient)
      -> Option<Duration>
    {   debug!("Calculating delay after {:?}", failure);
        match failure
        {   Transient::RateLimited => Some(self.backoff)
          , Transient::ConnectionFailed => Some(self.connect_delay)
          , Transient::TimedOut => None
        }
    }
}

impl Default for RetryPolicy
{   fn default() -> Self
    {   RetryPolicy::new(
          crate::config::DEFAULT_MAX_RETRIES,
          Duration::from_secs(crate::config::DEFAULT_BACKOFF_SECS)
        )
    }
}
