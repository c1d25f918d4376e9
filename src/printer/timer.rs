//! # Auto-Eject Timer
//!
//! Ejects a half-printed page when the host stops sending. Every strobed
//! byte pushes the deadline out by the configured timeout; starting a new
//! page disarms it. There is no background thread: the owner checks the
//! deadline with [`EjectTimer::expired`].

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EjectTimer {
    timeout: Option<Duration>,
    deadline: Option<Instant>,
}

impl EjectTimer {
    /// A timer that fires `timeout` after the last byte. `None` (or a zero
    /// duration) never fires.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout: timeout.filter(|t| !t.is_zero()),
            deadline: None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Restart the countdown from `now`.
    pub fn arm(&mut self, now: Instant) {
        if let Some(timeout) = self.timeout {
            self.deadline = Some(now + timeout);
        }
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Has the deadline passed at `now`? Firing disarms the timer.
    pub fn expired(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_timer_never_fires() {
        let mut timer = EjectTimer::new(None);
        let now = Instant::now();
        timer.arm(now);
        assert!(!timer.is_armed());
        assert!(!timer.expired(now + Duration::from_secs(3600)));

        let mut zero = EjectTimer::new(Some(Duration::ZERO));
        zero.arm(now);
        assert!(!zero.is_armed());
    }

    #[test]
    fn test_fires_once_after_deadline() {
        let mut timer = EjectTimer::new(Some(Duration::from_millis(500)));
        let now = Instant::now();
        timer.arm(now);
        assert!(!timer.expired(now + Duration::from_millis(499)));
        assert!(timer.expired(now + Duration::from_millis(500)));
        assert!(!timer.expired(now + Duration::from_millis(501)));
    }

    #[test]
    fn test_rearm_extends_deadline() {
        let mut timer = EjectTimer::new(Some(Duration::from_millis(100)));
        let now = Instant::now();
        timer.arm(now);
        timer.arm(now + Duration::from_millis(80));
        assert!(!timer.expired(now + Duration::from_millis(150)));
        assert!(timer.expired(now + Duration::from_millis(180)));
    }

    #[test]
    fn test_disarm() {
        let mut timer = EjectTimer::new(Some(Duration::from_millis(1)));
        let now = Instant::now();
        timer.arm(now);
        timer.disarm();
        assert!(!timer.expired(now + Duration::from_secs(1)));
    }
}
