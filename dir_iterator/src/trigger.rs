//! Per-cycle re-execution signal.
//!
//! Hosts typically skip a node whose inputs look unchanged. The iteration
//! engine must run every cycle regardless, so it exposes a token that differs
//! on every poll. [`ChangeDetector`] models the host side of that contract.

use rand::Rng;

/// Yields a fresh random token on every poll, never repeating the previous one.
#[derive(Debug, Default)]
pub struct AlwaysChanged {
    last: Option<u64>,
}

impl AlwaysChanged {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poll(&mut self) -> f64 {
        let mut rng = rand::thread_rng();
        loop {
            let token: f64 = rng.gen_range(0.0..1.0);
            if self.last != Some(token.to_bits()) {
                self.last = Some(token.to_bits());
                return token;
            }
        }
    }
}

/// Host-side change detection: run only when the token moved.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: Option<u64>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_run(&mut self, token: f64) -> bool {
        let bits = token.to_bits();
        let changed = self.last != Some(bits);
        self.last = Some(bits);
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_polls_differ() {
        let mut signal = AlwaysChanged::new();
        let mut previous = signal.poll();
        for _ in 0..1_000 {
            let next = signal.poll();
            assert_ne!(next.to_bits(), previous.to_bits());
            assert!((0.0..1.0).contains(&next));
            previous = next;
        }
    }

    #[test]
    fn detector_skips_repeated_token() {
        let mut detector = ChangeDetector::new();
        assert!(detector.should_run(0.25));
        assert!(!detector.should_run(0.25));
        assert!(detector.should_run(0.5));
    }

    #[test]
    fn detector_always_runs_with_always_changed() {
        let mut signal = AlwaysChanged::new();
        let mut detector = ChangeDetector::new();
        assert!((0..100).all(|_| detector.should_run(signal.poll())));
    }
}
