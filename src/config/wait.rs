// ABOUTME: Polling policy for waiting on container status changes.
// ABOUTME: Fixed interval, fixed attempt count, no backoff.

use serde::Deserialize;
use std::time::Duration;

/// How `Container::wait_for_status` polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WaitPolicy {
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_attempts")]
    pub attempts: u32,
}

fn default_interval() -> Duration {
    Duration::from_millis(200)
}

fn default_attempts() -> u32 {
    10
}

impl Default for WaitPolicy {
    fn default() -> Self {
        WaitPolicy {
            interval: default_interval(),
            attempts: default_attempts(),
        }
    }
}
