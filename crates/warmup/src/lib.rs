//! Warmup-based adaptive rate limiting: per-day, per-action daily quotas
//! that ramp up over a two-week onboarding period before settling at a
//! platform plateau.
//!
//! The limiter is stateless. Callers supply the current counter and
//! persist any update; exactly one worker must drive a given account at a
//! time for the check-then-act sequence to be sound.

pub mod limiter;
pub mod schedule;

pub use limiter::WarmupRateLimiter;
pub use schedule::{DailyLimits, WarmupSchedule};
