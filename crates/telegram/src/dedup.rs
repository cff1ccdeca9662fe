//! Redelivery guard for callback queries
//!
//! Telegram retries a webhook delivery when the acknowledgement is slow, so
//! the same callback query can arrive more than once. Each callback id is
//! processed on its first delivery only.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::constants::CALLBACK_REDELIVERY_WINDOW_SECS;

/// Thread-safe record of recently processed callback ids
pub struct RecentCallbacks {
    /// Map of callback id to first delivery time
    seen: RwLock<HashMap<String, Instant>>,
    /// How long a callback id is remembered
    window: Duration,
}

impl Default for RecentCallbacks {
    fn default() -> Self {
        Self::new(Duration::from_secs(CALLBACK_REDELIVERY_WINDOW_SECS))
    }
}

impl RecentCallbacks {
    pub fn new(window: Duration) -> Self {
        Self {
            seen: RwLock::new(HashMap::new()),
            window,
        }
    }

    /// Check whether this is the first delivery of a callback
    ///
    /// Returns `true` and remembers the id if it was not seen within the
    /// window, `false` for a redelivery.
    pub fn first_delivery(&self, callback_id: &str) -> bool {
        let now = Instant::now();
        let mut seen = self.seen.write().unwrap_or_else(|e| e.into_inner());

        if let Some(&first) = seen.get(callback_id) {
            if now.duration_since(first) < self.window {
                return false;
            }
        }

        seen.insert(callback_id.to_string(), now);
        true
    }

    /// Forget ids older than the window (call periodically)
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut seen = self.seen.write().unwrap_or_else(|e| e.into_inner());
        let initial_count = seen.len();
        seen.retain(|_, &mut first| now.duration_since(first) < self.window);
        initial_count - seen.len()
    }

    pub fn len(&self) -> usize {
        self.seen.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redelivery_is_rejected() {
        let recent = RecentCallbacks::default();

        assert!(recent.first_delivery("cb-1"));
        assert!(!recent.first_delivery("cb-1"));

        // Different callback should pass
        assert!(recent.first_delivery("cb-2"));
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn test_zero_window_forgets_immediately() {
        let recent = RecentCallbacks::new(Duration::ZERO);
        assert!(recent.first_delivery("cb-1"));
        assert!(recent.first_delivery("cb-1"));
        assert_eq!(recent.cleanup(), 1);
        assert!(recent.is_empty());
    }

    #[test]
    fn test_cleanup_keeps_fresh_ids() {
        let recent = RecentCallbacks::default();
        recent.first_delivery("cb-1");
        assert_eq!(recent.cleanup(), 0);
        assert_eq!(recent.len(), 1);
    }
}
