use tracing::debug;

use outreach_core::error::{OutreachError, OutreachResult};
use outreach_core::types::{ActionType, Platform};

use crate::schedule::{DailyLimits, WarmupSchedule, RAMP_DAYS};

/// Resolves daily quotas from an account's warmup day and platform, and
/// answers whether one more action is permitted. Holds no counters.
#[derive(Debug, Clone)]
pub struct WarmupRateLimiter {
    schedule: WarmupSchedule,
}

impl WarmupRateLimiter {
    pub fn new(schedule: WarmupSchedule) -> Self {
        Self { schedule }
    }

    /// Quota record for the given warmup day and platform.
    ///
    /// Within the ramp the primary platform reads the table directly and
    /// other platforms read it scaled down; day values outside the ramp
    /// fall back to the day-1 entry rather than erroring. Beyond the ramp
    /// a platform without a configured plateau is an explicit
    /// `UnsupportedPlatform` error, never an empty quota.
    pub fn daily_limits(&self, warmup_day: u32, platform: Platform) -> OutreachResult<DailyLimits> {
        if warmup_day > RAMP_DAYS {
            return self
                .schedule
                .plateaus
                .get(&platform)
                .cloned()
                .ok_or(OutreachError::UnsupportedPlatform(platform));
        }

        let index = warmup_day.saturating_sub(1) as usize;
        let entry = self
            .schedule
            .ramp
            .get(index)
            .or_else(|| self.schedule.ramp.first())
            .ok_or_else(|| OutreachError::Config("warmup schedule has an empty ramp".to_string()))?;

        if platform.is_primary() {
            Ok(entry.clone())
        } else {
            Ok(entry.scaled(self.schedule.secondary_scale))
        }
    }

    /// Whether one more `action` is permitted today. Denies, without
    /// raising, when the action has no quota on the resolved record or the
    /// platform is unsupported.
    pub fn should_perform(
        &self,
        current_count: u32,
        action: ActionType,
        warmup_day: u32,
        platform: Platform,
    ) -> bool {
        let limits = match self.daily_limits(warmup_day, platform) {
            Ok(limits) => limits,
            Err(_) => return false,
        };
        match limits.limit(action) {
            Some(max) => {
                let allowed = current_count < max;
                if !allowed {
                    debug!(
                        action = action.as_str(),
                        current_count, max, warmup_day, "daily quota reached"
                    );
                }
                allowed
            }
            None => false,
        }
    }
}

impl Default for WarmupRateLimiter {
    fn default() -> Self {
        Self::new(WarmupSchedule::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_14_equals_plateau() {
        let limiter = WarmupRateLimiter::default();
        let day_14 = limiter.daily_limits(14, Platform::Linkedin).unwrap();
        let day_15 = limiter.daily_limits(15, Platform::Linkedin).unwrap();
        assert_eq!(day_14, day_15);
        assert_eq!(day_14.limit(ActionType::Connect), Some(30));
        assert_eq!(day_14.limit(ActionType::Visit), Some(100));
        assert_eq!(day_14.limit(ActionType::Message), Some(30));
    }

    #[test]
    fn test_secondary_platform_scales_ramp() {
        let limiter = WarmupRateLimiter::default();
        let primary = limiter.daily_limits(1, Platform::Linkedin).unwrap();
        let secondary = limiter.daily_limits(1, Platform::Instagram).unwrap();
        for (action, max) in primary.iter() {
            assert_eq!(secondary.limit(action), Some((max as f64 * 0.7) as u32));
        }
        // Day 1 connects: 5 -> 3 after truncation.
        assert_eq!(secondary.limit(ActionType::Connect), Some(3));
    }

    #[test]
    fn test_out_of_range_days_fall_back_to_day_one() {
        let limiter = WarmupRateLimiter::default();
        let day_0 = limiter.daily_limits(0, Platform::Linkedin).unwrap();
        let day_1 = limiter.daily_limits(1, Platform::Linkedin).unwrap();
        assert_eq!(day_0, day_1);
    }

    #[test]
    fn test_plateau_quotas_per_platform() {
        let limiter = WarmupRateLimiter::default();
        let instagram = limiter.daily_limits(30, Platform::Instagram).unwrap();
        assert_eq!(instagram.limit(ActionType::Follow), Some(50));
        assert_eq!(instagram.limit(ActionType::Like), Some(150));
        assert_eq!(instagram.limit(ActionType::Comment), Some(30));
        assert_eq!(instagram.limit(ActionType::Connect), None);

        let facebook = limiter.daily_limits(30, Platform::Facebook).unwrap();
        assert_eq!(facebook.limit(ActionType::FriendRequest), Some(50));
        assert_eq!(facebook.limit(ActionType::GroupPost), Some(10));
    }

    #[test]
    fn test_unsupported_platform_beyond_ramp_is_explicit() {
        let mut schedule = WarmupSchedule::default();
        schedule.plateaus.remove(&Platform::Facebook);
        let limiter = WarmupRateLimiter::new(schedule);

        // Within the ramp the scaled table still applies.
        assert!(limiter.daily_limits(3, Platform::Facebook).is_ok());
        // Beyond it, an explicit signal rather than an empty quota.
        match limiter.daily_limits(15, Platform::Facebook) {
            Err(OutreachError::UnsupportedPlatform(Platform::Facebook)) => {}
            other => panic!("expected UnsupportedPlatform, got {:?}", other.map(|_| ())),
        }
        // And should_perform denies without raising.
        assert!(!limiter.should_perform(0, ActionType::FriendRequest, 15, Platform::Facebook));
    }

    #[test]
    fn test_should_perform_enforces_day_one_connect_quota() {
        let limiter = WarmupRateLimiter::default();
        assert!(limiter.should_perform(4, ActionType::Connect, 1, Platform::Linkedin));
        assert!(!limiter.should_perform(5, ActionType::Connect, 1, Platform::Linkedin));
    }

    #[test]
    fn test_should_perform_denies_unquotaed_actions() {
        let limiter = WarmupRateLimiter::default();
        // No follow quota exists on the primary platform, at any count.
        assert!(!limiter.should_perform(0, ActionType::Follow, 5, Platform::Linkedin));
        assert!(!limiter.should_perform(0, ActionType::GroupPost, 20, Platform::Linkedin));
    }
}
