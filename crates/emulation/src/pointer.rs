//! Pointer path planning: stepwise linear interpolation toward a target,
//! replayed through the driver as individual mouse-move events.

use rand::Rng;
use std::time::Duration;

use crate::timing::uniform_ms;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One waypoint, with the pause to observe before moving to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerStep {
    pub point: Point,
    pub delay: Duration,
}

/// Plan 5-10 waypoints from `origin` to `target`, linearly interpolated,
/// with 10-30 ms between steps. The final waypoint is exactly `target`.
pub fn pointer_path<R: Rng + ?Sized>(rng: &mut R, origin: Point, target: Point) -> Vec<PointerStep> {
    let steps = rng.gen_range(5..=10);
    let mut path = Vec::with_capacity(steps);
    for i in 0..steps {
        let progress = (i + 1) as f64 / steps as f64;
        path.push(PointerStep {
            point: Point {
                x: origin.x + (target.x - origin.x) * progress,
                y: origin.y + (target.y - origin.y) * progress,
            },
            delay: uniform_ms(rng, 10, 30),
        });
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_path_ends_at_target() {
        let mut rng = StdRng::seed_from_u64(17);
        let origin = Point::new(0.0, 0.0);
        let target = Point::new(640.0, 480.0);
        for _ in 0..1_000 {
            let path = pointer_path(&mut rng, origin, target);
            assert!((5..=10).contains(&path.len()));
            let last = path.last().unwrap();
            assert_eq!(last.point, target);
            for step in &path {
                assert!(step.delay >= Duration::from_millis(10));
                assert!(step.delay <= Duration::from_millis(30));
                assert!(step.point.x >= origin.x && step.point.x <= target.x);
                assert!(step.point.y >= origin.y && step.point.y <= target.y);
            }
        }
    }

    #[test]
    fn test_path_is_monotonic() {
        let mut rng = StdRng::seed_from_u64(23);
        let path = pointer_path(&mut rng, Point::new(10.0, 10.0), Point::new(300.0, 200.0));
        for pair in path.windows(2) {
            assert!(pair[1].point.x >= pair[0].point.x);
            assert!(pair[1].point.y >= pair[0].point.y);
        }
    }
}
