//! Campaign orchestration: drives a single outreach campaign through its
//! state machine, pacing every simulated interaction through the behavior
//! emulator and consulting the warmup rate limiter before every action.
//!
//! UI operations are delegated to a [`driver::BrowserDriver`] collaborator
//! and persistence to a [`repository::CampaignRepository`] collaborator;
//! this crate owns sequencing, quota enforcement, outcome mapping, and the
//! failure-escalation policy.

pub mod actions;
pub mod cancel;
pub mod driver;
pub mod repository;
pub mod runner;
pub mod selectors;
pub mod state;

pub use cancel::CancelSignal;
pub use driver::{BrowserDriver, ElementHandle, PageSession, SessionCookie, SessionProfile};
pub use repository::{CampaignBundle, CampaignRepository, CredentialStore};
pub use runner::{CampaignRunner, RunnerConfig};
pub use selectors::PlatformSelectors;
pub use state::{RunOutcome, RunState};
