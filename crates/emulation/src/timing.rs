//! Delay sampling. Delays follow a Gaussian centered on the midpoint of the
//! requested range rather than a uniform draw; uniform inter-action gaps
//! are a known automation tell.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::time::Duration;

/// Sample a delay from a Gaussian centered at the midpoint of
/// `[min, max]` with a standard deviation of one sixth of the range, so
/// ~99.7% of raw samples land inside the range. Tail samples are clamped;
/// the result is always within `[min, max]`.
pub fn sample_delay<R: Rng + ?Sized>(rng: &mut R, min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let min_s = min.as_secs_f64();
    let max_s = max.as_secs_f64();
    let mean = (min_s + max_s) / 2.0;
    let std_dev = (max_s - min_s) / 6.0;

    // std_dev is finite and positive here, so Normal::new cannot fail.
    let sampled = match Normal::new(mean, std_dev) {
        Ok(normal) => normal.sample(rng),
        Err(_) => mean,
    };
    Duration::from_secs_f64(sampled.clamp(min_s, max_s))
}

/// Uniform millisecond draw, used for the per-event gaps inside keystroke
/// and scroll plans.
pub fn uniform_ms<R: Rng + ?Sized>(rng: &mut R, min_ms: u64, max_ms: u64) -> Duration {
    Duration::from_millis(rng.gen_range(min_ms..=max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sample_delay_always_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let min = Duration::from_millis(500);
        let max = Duration::from_millis(2_000);
        // Large sample so Gaussian tail draws are exercised.
        for _ in 0..50_000 {
            let delay = sample_delay(&mut rng, min, max);
            assert!(delay >= min, "delay {:?} below min", delay);
            assert!(delay <= max, "delay {:?} above max", delay);
        }
    }

    #[test]
    fn test_sample_delay_degenerate_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let d = Duration::from_secs(3);
        assert_eq!(sample_delay(&mut rng, d, d), d);
    }

    #[test]
    fn test_sample_delay_clusters_at_midpoint() {
        let mut rng = StdRng::seed_from_u64(42);
        let min = Duration::from_secs(2);
        let max = Duration::from_secs(4);
        let n = 20_000;
        let total: f64 = (0..n)
            .map(|_| sample_delay(&mut rng, min, max).as_secs_f64())
            .sum();
        let mean = total / n as f64;
        assert!((mean - 3.0).abs() < 0.05, "mean {} far from midpoint", mean);
    }

    #[test]
    fn test_uniform_ms_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10_000 {
            let d = uniform_ms(&mut rng, 50, 200);
            assert!(d >= Duration::from_millis(50) && d <= Duration::from_millis(200));
        }
    }
}
