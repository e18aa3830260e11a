use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tracing::trace;

use crate::fingerprint;
use crate::keystrokes::{self, Keystroke};
use crate::pointer::{self, Point, PointerStep};
use crate::scrolling::{self, ScrollStep};
use crate::timing;

/// Behavior planner for one automation session. Owns a seedable RNG; one
/// emulator drives one session so plans stay reproducible under a fixed
/// seed.
#[derive(Debug)]
pub struct HumanEmulator {
    rng: StdRng,
}

impl HumanEmulator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic emulator for tests and replay.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Sample a Gaussian delay clamped into `[min, max]`.
    pub fn sample_delay(&mut self, min: Duration, max: Duration) -> Duration {
        timing::sample_delay(&mut self.rng, min, max)
    }

    /// Suspend for a sampled delay. This is the suspension point placed
    /// before and after every simulated interaction.
    pub async fn pause(&mut self, min: Duration, max: Duration) {
        let delay = self.sample_delay(min, max);
        trace!(delay_ms = delay.as_millis() as u64, "pausing");
        tokio::time::sleep(delay).await;
    }

    /// Convenience form of [`pause`](Self::pause) over whole seconds.
    pub async fn pause_secs(&mut self, min: u64, max: u64) {
        self.pause(Duration::from_secs(min), Duration::from_secs(max))
            .await;
    }

    pub fn plan_typing(&mut self, text: &str) -> Vec<Keystroke> {
        keystrokes::plan_typing(&mut self.rng, text)
    }

    pub fn plan_scroll(&mut self) -> Vec<ScrollStep> {
        scrolling::plan_scroll(&mut self.rng)
    }

    pub fn pointer_path(&mut self, origin: Point, target: Point) -> Vec<PointerStep> {
        pointer::pointer_path(&mut self.rng, origin, target)
    }

    pub fn user_agent(&mut self) -> &'static str {
        fingerprint::select_user_agent(&mut self.rng)
    }
}

impl Default for HumanEmulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystrokes::rendered_text;

    #[test]
    fn test_same_seed_same_plans() {
        let mut a = HumanEmulator::with_seed(1234);
        let mut b = HumanEmulator::with_seed(1234);

        assert_eq!(a.user_agent(), b.user_agent());
        assert_eq!(a.plan_typing("hello there"), b.plan_typing("hello there"));
        assert_eq!(a.plan_scroll(), b.plan_scroll());
        assert_eq!(
            a.sample_delay(Duration::from_secs(1), Duration::from_secs(2)),
            b.sample_delay(Duration::from_secs(1), Duration::from_secs(2)),
        );
    }

    #[test]
    fn test_seeded_typing_still_renders_exactly() {
        let mut emulator = HumanEmulator::with_seed(77);
        let note = "Great to meet you at the summit!";
        for _ in 0..200 {
            let plan = emulator.plan_typing(note);
            assert_eq!(rendered_text(&plan), note);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_suspends_within_bounds() {
        let mut emulator = HumanEmulator::with_seed(8);
        let before = tokio::time::Instant::now();
        emulator.pause(Duration::from_millis(100), Duration::from_millis(400)).await;
        let elapsed = before.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed <= Duration::from_millis(400) + Duration::from_millis(5));
    }
}
