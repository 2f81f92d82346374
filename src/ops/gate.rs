use std::time::{Duration, Instant};

/// Minimum spacing between two accepted render requests.
pub const DEFAULT_THRESHOLD: Duration = Duration::from_millis(100);

/// Rate limiter in front of the render job runner.
///
/// A request is accepted only if at least `threshold` has passed since the
/// last *accepted* request. Rejected requests are dropped, never replayed.
#[derive(Clone, Debug)]
pub struct UpdateGate {
    threshold: Duration,
    last_accepted: Option<Instant>,
}

impl Default for UpdateGate {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl UpdateGate {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            last_accepted: None,
        }
    }

    /// Returns `true` and records `now` if the request passes the gate.
    pub fn try_accept(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_accepted
            && now.saturating_duration_since(last) < self.threshold
        {
            return false;
        }
        self.last_accepted = Some(now);
        true
    }
}
