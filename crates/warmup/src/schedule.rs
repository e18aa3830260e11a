//! The warmup schedule table: ramp entries for days 1-14 and per-platform
//! plateau quotas for everything after. Explicit configuration data, not
//! ambient state; `Default` carries the standard table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use outreach_core::types::{ActionType, Platform};

/// Number of ramp days before an account reaches its plateau.
pub const RAMP_DAYS: u32 = 14;

/// Quota record for one day: maximum action count per action type. An
/// action type absent from the record is always denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DailyLimits(BTreeMap<ActionType, u32>);

impl DailyLimits {
    pub fn new(entries: impl IntoIterator<Item = (ActionType, u32)>) -> Self {
        Self(entries.into_iter().collect())
    }

    pub fn limit(&self, action: ActionType) -> Option<u32> {
        self.0.get(&action).copied()
    }

    /// Scale every quota by `factor`, truncating toward zero.
    pub fn scaled(&self, factor: f64) -> Self {
        Self(
            self.0
                .iter()
                .map(|(&action, &max)| (action, (max as f64 * factor) as u32))
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActionType, u32)> + '_ {
        self.0.iter().map(|(&a, &m)| (a, m))
    }
}

/// Full schedule: the primary-platform ramp, per-platform plateaus, and
/// the scale factor applied to the ramp for non-primary platforms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarmupSchedule {
    /// Day `d` (1-based) resolves to `ramp[d - 1]`. Days absent from the
    /// ramp fall back to the day-1 entry.
    pub ramp: Vec<DailyLimits>,
    /// Quotas applied beyond the ramp. A platform missing here is
    /// unsupported past day 14.
    pub plateaus: BTreeMap<Platform, DailyLimits>,
    /// Ramp scaling for non-primary platforms.
    pub secondary_scale: f64,
}

/// Daily (connects, visits, messages) volumes for the primary platform,
/// strictly ramping across two weeks.
const PRIMARY_RAMP: [(u32, u32, u32); RAMP_DAYS as usize] = [
    // Week 1: very conservative.
    (5, 10, 3),
    (8, 15, 5),
    (10, 20, 7),
    (12, 25, 8),
    (15, 30, 10),
    (18, 40, 12),
    (20, 50, 15),
    // Week 2: gradual increase up to the plateau.
    (22, 60, 17),
    (24, 70, 19),
    (26, 80, 21),
    (28, 90, 23),
    (30, 95, 25),
    (30, 98, 27),
    (30, 100, 30),
];

impl Default for WarmupSchedule {
    fn default() -> Self {
        let ramp: Vec<DailyLimits> = PRIMARY_RAMP
            .iter()
            .map(|&(connects, visits, messages)| {
                DailyLimits::new([
                    (ActionType::Connect, connects),
                    (ActionType::Visit, visits),
                    (ActionType::Message, messages),
                ])
            })
            .collect();

        let mut plateaus = BTreeMap::new();
        // The primary plateau equals the day-14 entry by design: reaching
        // the end of the ramp is the steady state.
        plateaus.insert(Platform::Linkedin, ramp[RAMP_DAYS as usize - 1].clone());
        plateaus.insert(
            Platform::Instagram,
            DailyLimits::new([
                (ActionType::Follow, 50),
                (ActionType::Like, 150),
                (ActionType::Comment, 30),
            ]),
        );
        plateaus.insert(
            Platform::Facebook,
            DailyLimits::new([
                (ActionType::FriendRequest, 50),
                (ActionType::GroupPost, 10),
            ]),
        );

        Self {
            ramp,
            plateaus,
            secondary_scale: 0.7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_is_nondecreasing() {
        let schedule = WarmupSchedule::default();
        for action in [ActionType::Connect, ActionType::Visit, ActionType::Message] {
            let volumes: Vec<u32> = schedule
                .ramp
                .iter()
                .map(|day| day.limit(action).unwrap())
                .collect();
            assert!(
                volumes.windows(2).all(|w| w[0] <= w[1]),
                "{:?} ramp decreases: {:?}",
                action,
                volumes
            );
        }
    }

    #[test]
    fn test_scaled_truncates_toward_zero() {
        let limits = DailyLimits::new([(ActionType::Connect, 5), (ActionType::Message, 3)]);
        let scaled = limits.scaled(0.7);
        // 5 * 0.7 = 3.5 -> 3; 3 * 0.7 = 2.1 -> 2.
        assert_eq!(scaled.limit(ActionType::Connect), Some(3));
        assert_eq!(scaled.limit(ActionType::Message), Some(2));
    }

    #[test]
    fn test_absent_action_has_no_limit() {
        let schedule = WarmupSchedule::default();
        assert_eq!(schedule.ramp[0].limit(ActionType::Follow), None);
    }
}
