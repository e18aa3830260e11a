use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Social platform an account belongs to. Linkedin is the primary platform;
/// the warmup schedule is defined against it and scaled for the others.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Linkedin,
    Instagram,
    Facebook,
}

impl Platform {
    pub fn is_primary(self) -> bool {
        matches!(self, Platform::Linkedin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Linkedin => "linkedin",
            Platform::Instagram => "instagram",
            Platform::Facebook => "facebook",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "linkedin" => Some(Platform::Linkedin),
            "instagram" => Some(Platform::Instagram),
            "facebook" => Some(Platform::Facebook),
            _ => None,
        }
    }
}

/// Category of outreach action. Each variant carries an independent daily
/// quota; which variants apply depends on the platform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Connect,
    Visit,
    Message,
    Scrape,
    Follow,
    Like,
    Comment,
    FriendRequest,
    GroupPost,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Connect => "connect",
            ActionType::Visit => "visit",
            ActionType::Message => "message",
            ActionType::Scrape => "scrape",
            ActionType::Follow => "follow",
            ActionType::Like => "like",
            ActionType::Comment => "comment",
            ActionType::FriendRequest => "friend_request",
            ActionType::GroupPost => "group_post",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "connect" => Some(ActionType::Connect),
            "visit" => Some(ActionType::Visit),
            "message" => Some(ActionType::Message),
            "scrape" => Some(ActionType::Scrape),
            "follow" => Some(ActionType::Follow),
            "like" => Some(ActionType::Like),
            "comment" => Some(ActionType::Comment),
            "friend_request" => Some(ActionType::FriendRequest),
            "group_post" => Some(ActionType::GroupPost),
            _ => None,
        }
    }
}

/// Outcome of a single attempted action against one target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    Success,
    /// The affordance was absent; the target is already connected. A
    /// terminal outcome for the target, not a failure.
    AlreadyConnected,
    /// Soft failure; the campaign continues with the next target.
    Failed,
    /// Hard failure for this target; consecutive occurrences escalate the
    /// campaign.
    Error,
}

impl ActionOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionOutcome::Success => "success",
            ActionOutcome::AlreadyConnected => "already_connected",
            ActionOutcome::Failed => "failed",
            ActionOutcome::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(ActionOutcome::Success),
            "already_connected" => Some(ActionOutcome::AlreadyConnected),
            "failed" => Some(ActionOutcome::Failed),
            "error" => Some(ActionOutcome::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Pending,
    Active,
    Paused,
    Completed,
    Failed,
}

impl CampaignStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CampaignStatus::Pending => "pending",
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CampaignStatus::Pending),
            "active" => Some(CampaignStatus::Active),
            "paused" => Some(CampaignStatus::Paused),
            "completed" => Some(CampaignStatus::Completed),
            "failed" => Some(CampaignStatus::Failed),
            _ => None,
        }
    }
}

/// Upstream proxy assigned to an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub ip: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    /// `ip:port` form consumed by browser launch flags.
    pub fn server(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

/// Resolved login credentials. The secret is stored encrypted at rest;
/// decryption is the credential store's concern.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub secret: String,
}

/// A user-held social account. Owned by the account store; the worker only
/// reads it and reports counter updates through the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub platform: Platform,
    pub username: String,
    /// Ordinal day since automation began, starting at 1.
    pub warmup_day: u32,
    /// Per-action counters for the current day.
    pub daily_counts: BTreeMap<ActionType, u32>,
    pub proxy: Option<ProxyConfig>,
    /// Reference passed to the credential store to resolve login secrets.
    pub credential_ref: Uuid,
    pub last_action_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn count(&self, action: ActionType) -> u32 {
        self.daily_counts.get(&action).copied().unwrap_or(0)
    }
}

/// One profile (or lead) a campaign acts on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: Uuid,
    pub profile_url: String,
    pub name: Option<String>,
    pub title: Option<String>,
}

/// An outreach campaign bound to one account. Status is mutated only by the
/// orchestrator's terminal transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub status: CampaignStatus,
    pub action_type: ActionType,
    /// Ordered; consumed front to back.
    pub targets: Vec<Target>,
    pub note_template: Option<String>,
    /// Listing location for scrape campaigns.
    pub search_url: Option<String>,
    pub scrape_limit: Option<usize>,
}

/// Append-only log entry, produced exactly once per attempted action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub account_id: Uuid,
    pub action_type: ActionType,
    pub target_id: Option<Uuid>,
    pub target_url: String,
    pub outcome: ActionOutcome,
    pub created_at: DateTime<Utc>,
}

impl ActionRecord {
    pub fn new(
        campaign: &Campaign,
        account: &Account,
        target_id: Option<Uuid>,
        target_url: impl Into<String>,
        outcome: ActionOutcome,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            campaign_id: campaign.id,
            account_id: account.id,
            action_type: campaign.action_type,
            target_id,
            target_url: target_url.into(),
            outcome,
            created_at: Utc::now(),
        }
    }
}

/// A profile extracted from a listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub name: String,
    pub title: Option<String>,
    pub profile_url: String,
}

/// A listing entry that could not be parsed during extraction. Collected
/// and logged; never aborts the extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub index: usize,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_string_round_trips() {
        for platform in [Platform::Linkedin, Platform::Instagram, Platform::Facebook] {
            assert_eq!(Platform::parse(platform.as_str()), Some(platform));
        }
        for status in [
            CampaignStatus::Pending,
            CampaignStatus::Active,
            CampaignStatus::Paused,
            CampaignStatus::Completed,
            CampaignStatus::Failed,
        ] {
            assert_eq!(CampaignStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ActionType::parse("friend_request"), Some(ActionType::FriendRequest));
        assert_eq!(ActionType::parse("unknown_action"), None);
        assert_eq!(
            ActionOutcome::parse("already_connected"),
            Some(ActionOutcome::AlreadyConnected)
        );
    }

    #[test]
    fn test_account_count_defaults_to_zero() {
        let account = Account {
            id: Uuid::new_v4(),
            platform: Platform::Linkedin,
            username: "someone@example.com".to_string(),
            warmup_day: 1,
            daily_counts: BTreeMap::new(),
            proxy: None,
            credential_ref: Uuid::new_v4(),
            last_action_at: None,
        };
        assert_eq!(account.count(ActionType::Connect), 0);
    }
}
