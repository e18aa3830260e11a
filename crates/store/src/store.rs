use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use outreach_core::error::{OutreachError, OutreachResult};
use outreach_core::types::{
    Account, ActionRecord, ActionType, Campaign, CampaignStatus, Credentials, Lead, Platform,
    ProxyConfig, Target,
};
use outreach_orchestrator::{CampaignBundle, CampaignRepository, CredentialStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS social_accounts (
    id              TEXT PRIMARY KEY,
    platform        TEXT NOT NULL,
    username        TEXT NOT NULL,
    secret          TEXT NOT NULL,
    warmup_day      INTEGER NOT NULL DEFAULT 1,
    daily_counts    TEXT NOT NULL DEFAULT '{}',
    proxy_ip        TEXT,
    proxy_port      INTEGER,
    proxy_username  TEXT,
    proxy_password  TEXT,
    last_action_at  TEXT
);

CREATE TABLE IF NOT EXISTS campaigns (
    id              TEXT PRIMARY KEY,
    account_id      TEXT NOT NULL REFERENCES social_accounts(id),
    name            TEXT NOT NULL,
    status          TEXT NOT NULL DEFAULT 'pending',
    action_type     TEXT NOT NULL,
    note_template   TEXT,
    search_url      TEXT,
    scrape_limit    INTEGER
);

CREATE TABLE IF NOT EXISTS campaign_targets (
    id              TEXT PRIMARY KEY,
    campaign_id     TEXT NOT NULL REFERENCES campaigns(id),
    position        INTEGER NOT NULL,
    profile_url     TEXT NOT NULL,
    name            TEXT,
    title           TEXT,
    visited         INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS leads (
    id              TEXT PRIMARY KEY,
    campaign_id     TEXT NOT NULL REFERENCES campaigns(id),
    name            TEXT NOT NULL,
    title           TEXT,
    profile_url     TEXT NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS action_logs (
    id              TEXT PRIMARY KEY,
    campaign_id     TEXT NOT NULL,
    account_id      TEXT NOT NULL,
    action_type     TEXT NOT NULL,
    target_id       TEXT,
    target_url      TEXT NOT NULL,
    outcome         TEXT NOT NULL,
    created_at      TEXT NOT NULL
);
"#;

/// Repository over a single SQLite connection. Serialized behind a mutex;
/// the worker drives one campaign at a time so there is no contention to
/// optimize for.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `url` and apply the schema. Accepts
    /// a plain path, `sqlite://path`, or `:memory:`.
    pub fn open(url: &str) -> OutreachResult<Self> {
        let path = url.strip_prefix("sqlite://").unwrap_or(url);
        let conn = if path == ":memory:" {
            Connection::open_in_memory().map_err(storage_err)?
        } else {
            Connection::open(Path::new(path)).map_err(storage_err)?
        };
        conn.execute_batch(SCHEMA).map_err(storage_err)?;
        debug!(path, "opened campaign store");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert an account with its login secret. Used by seeding tooling
    /// and tests; the dashboard backend owns accounts in production.
    pub async fn insert_account(&self, account: &Account, secret: &str) -> OutreachResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO social_accounts
                 (id, platform, username, secret, warmup_day, daily_counts,
                  proxy_ip, proxy_port, proxy_username, proxy_password, last_action_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                account.id.to_string(),
                account.platform.as_str(),
                account.username,
                secret,
                account.warmup_day,
                serde_json::to_string(&account.daily_counts)?,
                account.proxy.as_ref().map(|p| p.ip.clone()),
                account.proxy.as_ref().map(|p| p.port),
                account.proxy.as_ref().and_then(|p| p.username.clone()),
                account.proxy.as_ref().and_then(|p| p.password.clone()),
                account.last_action_at.map(|t| t.to_rfc3339()),
            ],
        )
        .map_err(storage_err)?;
        Ok(())
    }

    /// Insert a campaign and its ordered targets.
    pub async fn insert_campaign(&self, campaign: &Campaign) -> OutreachResult<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(storage_err)?;
        tx.execute(
            "INSERT INTO campaigns
                 (id, account_id, name, status, action_type, note_template, search_url, scrape_limit)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                campaign.id.to_string(),
                campaign.account_id.to_string(),
                campaign.name,
                campaign.status.as_str(),
                campaign.action_type.as_str(),
                campaign.note_template,
                campaign.search_url,
                campaign.scrape_limit.map(|l| l as i64),
            ],
        )
        .map_err(storage_err)?;
        for (position, target) in campaign.targets.iter().enumerate() {
            tx.execute(
                "INSERT INTO campaign_targets (id, campaign_id, position, profile_url, name, title)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    target.id.to_string(),
                    campaign.id.to_string(),
                    position as i64,
                    target.profile_url,
                    target.name,
                    target.title,
                ],
            )
            .map_err(storage_err)?;
        }
        tx.commit().map_err(storage_err)?;
        Ok(())
    }
}

#[async_trait]
impl CampaignRepository for SqliteStore {
    async fn fetch_active(&self, campaign_id: Uuid) -> OutreachResult<Option<CampaignBundle>> {
        let conn = self.conn.lock().await;
        let row = conn
            .query_row(
                "SELECT c.id, c.account_id, c.name, c.status, c.action_type,
                        c.note_template, c.search_url, c.scrape_limit,
                        a.platform, a.username, a.warmup_day, a.daily_counts,
                        a.proxy_ip, a.proxy_port, a.proxy_username, a.proxy_password,
                        a.last_action_at
                 FROM campaigns c
                 JOIN social_accounts a ON a.id = c.account_id
                 WHERE c.id = ?1 AND c.status = 'active'",
                params![campaign_id.to_string()],
                |row| {
                    Ok(RawBundle {
                        campaign_id: row.get(0)?,
                        account_id: row.get(1)?,
                        name: row.get(2)?,
                        status: row.get(3)?,
                        action_type: row.get(4)?,
                        note_template: row.get(5)?,
                        search_url: row.get(6)?,
                        scrape_limit: row.get(7)?,
                        platform: row.get(8)?,
                        username: row.get(9)?,
                        warmup_day: row.get(10)?,
                        daily_counts: row.get(11)?,
                        proxy_ip: row.get(12)?,
                        proxy_port: row.get(13)?,
                        proxy_username: row.get(14)?,
                        proxy_password: row.get(15)?,
                        last_action_at: row.get(16)?,
                    })
                },
            )
            .optional()
            .map_err(storage_err)?;

        let Some(raw) = row else {
            return Ok(None);
        };

        let mut stmt = conn
            .prepare(
                "SELECT id, profile_url, name, title
                 FROM campaign_targets
                 WHERE campaign_id = ?1 AND visited = 0
                 ORDER BY position ASC",
            )
            .map_err(storage_err)?;
        let targets = stmt
            .query_map(params![raw.campaign_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })
            .map_err(storage_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage_err)?
            .into_iter()
            .map(|(id, profile_url, name, title)| {
                Ok(Target {
                    id: parse_uuid(&id)?,
                    profile_url,
                    name,
                    title,
                })
            })
            .collect::<OutreachResult<Vec<_>>>()?;

        Some(raw.into_bundle(targets)).transpose()
    }

    async fn append_action_record(&self, record: &ActionRecord) -> OutreachResult<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(storage_err)?;

        tx.execute(
            "INSERT INTO action_logs
                 (id, campaign_id, account_id, action_type, target_id, target_url, outcome, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id.to_string(),
                record.campaign_id.to_string(),
                record.account_id.to_string(),
                record.action_type.as_str(),
                record.target_id.map(|id| id.to_string()),
                record.target_url,
                record.outcome.as_str(),
                record.created_at.to_rfc3339(),
            ],
        )
        .map_err(storage_err)?;

        // The daily counter moves in the same transaction as the record,
        // so the two can never diverge.
        let counts_json: String = tx
            .query_row(
                "SELECT daily_counts FROM social_accounts WHERE id = ?1",
                params![record.account_id.to_string()],
                |row| row.get(0),
            )
            .map_err(storage_err)?;
        let mut counts: BTreeMap<ActionType, u32> = serde_json::from_str(&counts_json)?;
        *counts.entry(record.action_type).or_insert(0) += 1;
        tx.execute(
            "UPDATE social_accounts SET daily_counts = ?1, last_action_at = ?2 WHERE id = ?3",
            params![
                serde_json::to_string(&counts)?,
                record.created_at.to_rfc3339(),
                record.account_id.to_string(),
            ],
        )
        .map_err(storage_err)?;

        if let Some(target_id) = record.target_id {
            tx.execute(
                "UPDATE campaign_targets SET visited = 1 WHERE id = ?1",
                params![target_id.to_string()],
            )
            .map_err(storage_err)?;
        }

        tx.commit().map_err(storage_err)
    }

    async fn append_leads(&self, campaign_id: Uuid, leads: &[Lead]) -> OutreachResult<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(storage_err)?;
        let now = Utc::now().to_rfc3339();
        for lead in leads {
            tx.execute(
                "INSERT INTO leads (id, campaign_id, name, title, profile_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    lead.id.to_string(),
                    campaign_id.to_string(),
                    lead.name,
                    lead.title,
                    lead.profile_url,
                    now,
                ],
            )
            .map_err(storage_err)?;
        }
        tx.commit().map_err(storage_err)
    }

    async fn update_campaign_status(
        &self,
        campaign_id: Uuid,
        status: CampaignStatus,
    ) -> OutreachResult<()> {
        let conn = self.conn.lock().await;
        let updated = conn
            .execute(
                "UPDATE campaigns SET status = ?1 WHERE id = ?2",
                params![status.as_str(), campaign_id.to_string()],
            )
            .map_err(storage_err)?;
        if updated == 0 {
            return Err(OutreachError::Repository(format!(
                "campaign {campaign_id} not found for status update"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn resolve(&self, credential_ref: Uuid) -> OutreachResult<Credentials> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT username, secret FROM social_accounts WHERE id = ?1",
            params![credential_ref.to_string()],
            |row| {
                Ok(Credentials {
                    username: row.get(0)?,
                    secret: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(storage_err)?
        .ok_or_else(|| {
            OutreachError::Repository(format!("no credentials stored for {credential_ref}"))
        })
    }
}

struct RawBundle {
    campaign_id: String,
    account_id: String,
    name: String,
    status: String,
    action_type: String,
    note_template: Option<String>,
    search_url: Option<String>,
    scrape_limit: Option<i64>,
    platform: String,
    username: String,
    warmup_day: u32,
    daily_counts: String,
    proxy_ip: Option<String>,
    proxy_port: Option<u16>,
    proxy_username: Option<String>,
    proxy_password: Option<String>,
    last_action_at: Option<String>,
}

impl RawBundle {
    fn into_bundle(self, targets: Vec<Target>) -> OutreachResult<CampaignBundle> {
        let account_id = parse_uuid(&self.account_id)?;
        let proxy = self.proxy_ip.map(|ip| ProxyConfig {
            ip,
            port: self.proxy_port.unwrap_or(0),
            username: self.proxy_username,
            password: self.proxy_password,
        });
        let last_action_at = self
            .last_action_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;

        let campaign = Campaign {
            id: parse_uuid(&self.campaign_id)?,
            account_id,
            name: self.name,
            status: CampaignStatus::parse(&self.status).ok_or_else(|| {
                OutreachError::Repository(format!("unknown campaign status {:?}", self.status))
            })?,
            action_type: ActionType::parse(&self.action_type).ok_or_else(|| {
                OutreachError::Repository(format!("unknown action type {:?}", self.action_type))
            })?,
            targets,
            note_template: self.note_template,
            search_url: self.search_url,
            scrape_limit: self.scrape_limit.map(|l| l as usize),
        };
        let account = Account {
            id: account_id,
            platform: Platform::parse(&self.platform).ok_or_else(|| {
                OutreachError::Repository(format!("unknown platform {:?}", self.platform))
            })?,
            username: self.username,
            warmup_day: self.warmup_day,
            daily_counts: serde_json::from_str(&self.daily_counts)?,
            proxy,
            credential_ref: account_id,
            last_action_at,
        };
        Ok(CampaignBundle { campaign, account })
    }
}

fn storage_err(error: rusqlite::Error) -> OutreachError {
    OutreachError::Repository(error.to_string())
}

fn parse_uuid(s: &str) -> OutreachResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| OutreachError::Repository(format!("malformed id {s:?}: {e}")))
}

fn parse_timestamp(s: &str) -> OutreachResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| OutreachError::Repository(format!("malformed timestamp {s:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_core::types::ActionOutcome;

    fn sample_account() -> Account {
        Account {
            id: Uuid::new_v4(),
            platform: Platform::Linkedin,
            username: "worker@example.com".to_string(),
            warmup_day: 3,
            daily_counts: BTreeMap::new(),
            proxy: Some(ProxyConfig {
                ip: "10.0.0.8".to_string(),
                port: 8080,
                username: None,
                password: None,
            }),
            credential_ref: Uuid::new_v4(),
            last_action_at: None,
        }
    }

    fn sample_campaign(account: &Account) -> Campaign {
        Campaign {
            id: Uuid::new_v4(),
            account_id: account.id,
            name: "Launch outreach".to_string(),
            status: CampaignStatus::Active,
            action_type: ActionType::Connect,
            targets: vec![
                Target {
                    id: Uuid::new_v4(),
                    profile_url: "https://www.linkedin.com/in/first/".to_string(),
                    name: Some("First".to_string()),
                    title: None,
                },
                Target {
                    id: Uuid::new_v4(),
                    profile_url: "https://www.linkedin.com/in/second/".to_string(),
                    name: None,
                    title: Some("CTO".to_string()),
                },
            ],
            note_template: Some("Hello!".to_string()),
            search_url: None,
            scrape_limit: None,
        }
    }

    async fn seeded_store() -> (SqliteStore, Account, Campaign) {
        let store = SqliteStore::open(":memory:").unwrap();
        let account = sample_account();
        let campaign = sample_campaign(&account);
        store.insert_account(&account, "s3cret").await.unwrap();
        store.insert_campaign(&campaign).await.unwrap();
        (store, account, campaign)
    }

    #[tokio::test]
    async fn test_fetch_active_joins_campaign_and_account() {
        let (store, account, campaign) = seeded_store().await;

        let bundle = store.fetch_active(campaign.id).await.unwrap().unwrap();
        assert_eq!(bundle.campaign.id, campaign.id);
        assert_eq!(bundle.campaign.targets.len(), 2);
        assert_eq!(bundle.campaign.targets[0].profile_url, campaign.targets[0].profile_url);
        assert_eq!(bundle.account.id, account.id);
        assert_eq!(bundle.account.warmup_day, 3);
        assert_eq!(bundle.account.proxy.as_ref().unwrap().port, 8080);

        // Unknown and non-active campaigns both come back empty.
        assert!(store.fetch_active(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_record_bumps_counter_in_same_transaction() {
        let (store, account, campaign) = seeded_store().await;
        let target = &campaign.targets[0];

        let record = ActionRecord::new(
            &campaign,
            &account,
            Some(target.id),
            &target.profile_url,
            ActionOutcome::Success,
        );
        store.append_action_record(&record).await.unwrap();

        let bundle = store.fetch_active(campaign.id).await.unwrap().unwrap();
        // Counter moved with the record.
        assert_eq!(bundle.account.count(ActionType::Connect), 1);
        assert!(bundle.account.last_action_at.is_some());
        // The visited target no longer appears in the work list.
        assert_eq!(bundle.campaign.targets.len(), 1);
        assert_eq!(bundle.campaign.targets[0].id, campaign.targets[1].id);

        let conn = store.conn.lock().await;
        let logged: i64 = conn
            .query_row("SELECT COUNT(*) FROM action_logs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(logged, 1);
    }

    #[tokio::test]
    async fn test_status_update_hides_campaign_from_fetch() {
        let (store, _account, campaign) = seeded_store().await;

        store
            .update_campaign_status(campaign.id, CampaignStatus::Paused)
            .await
            .unwrap();
        assert!(store.fetch_active(campaign.id).await.unwrap().is_none());

        let missing = store
            .update_campaign_status(Uuid::new_v4(), CampaignStatus::Failed)
            .await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn test_append_leads_and_resolve_credentials() {
        let (store, account, campaign) = seeded_store().await;

        let leads = vec![Lead {
            id: Uuid::new_v4(),
            campaign_id: campaign.id,
            name: "Ada".to_string(),
            title: Some("Engineer".to_string()),
            profile_url: "/sales/lead/ada".to_string(),
        }];
        store.append_leads(campaign.id, &leads).await.unwrap();

        let conn = store.conn.lock().await;
        let stored: i64 = conn
            .query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0))
            .unwrap();
        drop(conn);
        assert_eq!(stored, 1);

        let credentials = store.resolve(account.id).await.unwrap();
        assert_eq!(credentials.username, "worker@example.com");
        assert_eq!(credentials.secret, "s3cret");

        assert!(store.resolve(Uuid::new_v4()).await.is_err());
    }
}
