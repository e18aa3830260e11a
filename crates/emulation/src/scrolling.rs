//! Scroll pattern planning. Mostly forward reading motion with the
//! occasional backtrack, the way a person skims a profile.

use rand::Rng;
use std::time::Duration;

use crate::timing::uniform_ms;

const BACKTRACK_PROBABILITY: f64 = 0.3;

/// One scroll gesture: a vertical pixel delta (negative scrolls up) and the
/// pause that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollStep {
    pub delta_px: i32,
    pub pause: Duration,
}

/// Plan 2-5 forward scrolls of 200-600 px, each followed by a 0.5-1.5 s
/// pause. With probability 0.3 the plan ends with a 100-300 px backtrack
/// and a 0.3-0.8 s pause.
pub fn plan_scroll<R: Rng + ?Sized>(rng: &mut R) -> Vec<ScrollStep> {
    let rounds = rng.gen_range(2..=5);
    let mut steps = Vec::with_capacity(rounds + 1);
    for _ in 0..rounds {
        steps.push(ScrollStep {
            delta_px: rng.gen_range(200..=600),
            pause: uniform_ms(rng, 500, 1_500),
        });
    }
    if rng.gen_bool(BACKTRACK_PROBABILITY) {
        steps.push(ScrollStep {
            delta_px: -rng.gen_range(100..=300),
            pause: uniform_ms(rng, 300, 800),
        });
    }
    steps
}
