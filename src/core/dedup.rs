use std::time::{Duration, Instant};

pub const DEFAULT_WINDOW: Duration = Duration::from_millis(2000);

/// Anti-flicker filter for continuous frame sampling.
///
/// The same code seen again within `window` of its last acceptance is
/// dropped. A different code, or the same one after the window, is accepted
/// and becomes the remembered detection. It knows nothing about whether the
/// check-in behind an accepted code succeeds.
#[derive(Debug, Clone)]
pub struct ScanDeduplicator {
    window: Duration,
    last: Option<(String, Instant)>,
}

impl Default for ScanDeduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl ScanDeduplicator {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn should_process(&mut self, code: &str, now: Instant) -> bool {
        if let Some((last_code, at)) = &self.last
            && last_code == code
            && now.saturating_duration_since(*at) < self.window
        {
            return false;
        }

        self.last = Some((code.to_string(), now));
        true
    }

    /// Forget the remembered detection (new scanning session).
    pub fn reset(&mut self) {
        self.last = None;
    }
}
