//! "User navigated" guard.

use std::time::Duration;

use tokio::time::Instant;

/// How long an explicit page change suppresses automatic resets.
pub const DEFAULT_GUARD_DELAY: Duration = Duration::from_secs(2);

/// Short-lived flag set on explicit navigation.
///
/// The guard is a deadline owned by its [`crate::PageState`]: it clears
/// itself once the delay has passed and needs no timer task, so dropping the
/// state leaves nothing behind.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    delay: Duration,
    armed_until: Option<Instant>,
}

impl NavigationGuard {
    /// Create a cleared guard with the given delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            armed_until: None,
        }
    }

    /// Set (or refresh) the guard starting now.
    pub fn arm(&mut self) {
        self.arm_at(Instant::now());
    }

    /// Set (or refresh) the guard starting at `now`.
    pub fn arm_at(&mut self, now: Instant) {
        self.armed_until = Some(now + self.delay);
    }

    /// Whether the guard is set now.
    pub fn is_set(&self) -> bool {
        self.is_set_at(Instant::now())
    }

    /// Whether the guard is set at `now`.
    pub fn is_set_at(&self, now: Instant) -> bool {
        self.armed_until.is_some_and(|until| now < until)
    }
}

impl Default for NavigationGuard {
    fn default() -> Self {
        Self::new(DEFAULT_GUARD_DELAY)
    }
}
