//! The campaign runner: one instance drives one campaign end-to-end
//! through a single automation session, sequencing
//! authenticate -> quota check -> acquire target -> execute -> record
//! until targets or quota run out.

use std::collections::VecDeque;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use outreach_core::config::AppConfig;
use outreach_core::error::{OutreachError, OutreachResult};
use outreach_core::types::{
    Account, ActionOutcome, ActionRecord, ActionType, Campaign, Credentials, Lead, Target,
};
use outreach_emulation::{fingerprint, HumanEmulator};
use outreach_warmup::WarmupRateLimiter;

use crate::actions;
use crate::cancel::CancelSignal;
use crate::driver::{BrowserDriver, PageSession, SessionProfile};
use crate::repository::{CampaignBundle, CampaignRepository, CredentialStore};
use crate::selectors::PlatformSelectors;
use crate::state::{RunOutcome, RunState, RunStateMachine};

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Consecutive hard errors tolerated before the campaign fails.
    pub max_consecutive_errors: u32,
    pub scrape_scroll_rounds: usize,
    pub default_scrape_limit: usize,
    pub selectors: PlatformSelectors,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_consecutive_errors: 3,
            scrape_scroll_rounds: 5,
            default_scrape_limit: 50,
            selectors: PlatformSelectors::default(),
        }
    }
}

impl RunnerConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            max_consecutive_errors: config.worker.max_consecutive_errors,
            scrape_scroll_rounds: config.worker.scrape_scroll_rounds,
            default_scrape_limit: config.worker.default_scrape_limit,
            selectors: PlatformSelectors::default(),
        }
    }
}

/// Unit of work resolved during target acquisition.
enum WorkItem {
    Profile(Target),
    Listing { url: String, limit: usize },
}

impl WorkItem {
    fn url(&self) -> &str {
        match self {
            WorkItem::Profile(target) => &target.profile_url,
            WorkItem::Listing { url, .. } => url,
        }
    }

    fn target_id(&self) -> Option<Uuid> {
        match self {
            WorkItem::Profile(target) => Some(target.id),
            WorkItem::Listing { .. } => None,
        }
    }
}

pub struct CampaignRunner<D, R, C> {
    driver: D,
    repository: R,
    credentials: C,
    emulator: HumanEmulator,
    limiter: WarmupRateLimiter,
    config: RunnerConfig,
    cancel: CancelSignal,
}

impl<D, R, C> CampaignRunner<D, R, C>
where
    D: BrowserDriver,
    R: CampaignRepository,
    C: CredentialStore,
{
    pub fn new(driver: D, repository: R, credentials: C) -> Self {
        Self {
            driver,
            repository,
            credentials,
            emulator: HumanEmulator::new(),
            limiter: WarmupRateLimiter::default(),
            config: RunnerConfig::default(),
            cancel: CancelSignal::new(),
        }
    }

    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_emulator(mut self, emulator: HumanEmulator) -> Self {
        self.emulator = emulator;
        self
    }

    pub fn with_limiter(mut self, limiter: WarmupRateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Handle used to request a clean abort at the next state boundary.
    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    /// Run one campaign end-to-end. Returns the terminal outcome; errors
    /// surfaced here occurred before any session was acquired (or while
    /// persisting the final status) and map to configuration failures at
    /// the process boundary.
    pub async fn run(&mut self, campaign_id: Uuid) -> OutreachResult<RunOutcome> {
        let bundle = self
            .repository
            .fetch_active(campaign_id)
            .await?
            .ok_or_else(|| {
                OutreachError::Config(format!("campaign {campaign_id} not found or not active"))
            })?;
        let CampaignBundle { campaign, account } = bundle;

        validate_campaign(&campaign)?;

        let credentials = self.credentials.resolve(account.credential_ref).await?;

        info!(
            campaign_id = %campaign.id,
            account_id = %account.id,
            platform = account.platform.as_str(),
            action = campaign.action_type.as_str(),
            targets = campaign.targets.len(),
            warmup_day = account.warmup_day,
            "starting campaign run"
        );

        let profile = SessionProfile {
            user_agent: self.emulator.user_agent().to_string(),
            proxy: account.proxy.clone(),
            init_script: Some(fingerprint::STEALTH_SCRIPT.to_string()),
        };
        let mut session = self.driver.open_session(profile).await?;

        let drive_result = self
            .drive(session.as_mut(), &campaign, &account, &credentials)
            .await;

        // The session is released exactly once, on every exit path. A
        // release failure is logged and never overrides the run outcome.
        if let Err(close_error) = session.close().await {
            warn!(
                campaign_id = %campaign.id,
                error = %close_error,
                "failed to release automation session"
            );
        }

        let outcome = match drive_result {
            Ok(outcome) => outcome,
            Err(error) => {
                error!(
                    campaign_id = %campaign.id,
                    account_id = %account.id,
                    action = campaign.action_type.as_str(),
                    error = %error,
                    "campaign run failed"
                );
                RunOutcome::Failed
            }
        };

        self.repository
            .update_campaign_status(campaign.id, outcome.campaign_status())
            .await?;

        info!(campaign_id = %campaign.id, outcome = outcome.as_str(), "campaign run finished");
        Ok(outcome)
    }

    async fn drive(
        &mut self,
        session: &mut dyn PageSession,
        campaign: &Campaign,
        account: &Account,
        credentials: &Credentials,
    ) -> OutreachResult<RunOutcome> {
        let mut machine = RunStateMachine::new();

        machine.transition(RunState::Authenticating)?;
        match actions::login(
            session,
            &mut self.emulator,
            &self.config.selectors,
            account.id,
            credentials,
        )
        .await
        {
            Ok(cookies) => {
                debug!(cookies = cookies.len(), "session cookies captured for reuse");
                metrics::counter!("outreach.logins").increment(1);
            }
            Err(error) => {
                machine.transition(RunState::Failed)?;
                return Err(error);
            }
        }

        let action = campaign.action_type;
        // Listing extraction has no ramp entry of its own; it is gated by
        // the connect quota it feeds.
        let quota_action = match action {
            ActionType::Scrape => ActionType::Connect,
            other => other,
        };
        let mut counts = account.daily_counts.clone();
        let mut consecutive_errors: u32 = 0;
        let mut queue = build_work_queue(campaign, &self.config);

        loop {
            // Cancellation lands on state boundaries only, keeping
            // in-flight action semantics intact.
            if self.cancel.is_cancelled() {
                info!(campaign_id = %campaign.id, "cancellation requested, aborting");
                machine.transition(RunState::Aborted)?;
                return Ok(RunOutcome::Aborted);
            }

            machine.transition(RunState::QuotaCheck)?;
            let current = counts.get(&quota_action).copied().unwrap_or(0);
            if !self
                .limiter
                .should_perform(current, quota_action, account.warmup_day, account.platform)
            {
                info!(
                    campaign_id = %campaign.id,
                    account_id = %account.id,
                    action = action.as_str(),
                    current,
                    warmup_day = account.warmup_day,
                    "daily quota exhausted, pausing campaign"
                );
                metrics::counter!("outreach.quota_denials").increment(1);
                machine.transition(RunState::Aborted)?;
                return Ok(RunOutcome::Aborted);
            }

            machine.transition(RunState::TargetAcquisition)?;
            let Some(item) = queue.pop_front() else {
                machine.transition(RunState::Completed)?;
                return Ok(RunOutcome::Completed);
            };

            machine.transition(RunState::ActionExecution)?;
            metrics::counter!("outreach.actions_attempted").increment(1);
            let (outcome, leads) = match self.execute(session, campaign, &item).await {
                Ok(result) => result,
                Err(error) => {
                    error!(
                        campaign_id = %campaign.id,
                        account_id = %account.id,
                        action = action.as_str(),
                        target = item.url(),
                        error = %error,
                        "action errored"
                    );
                    (ActionOutcome::Error, Vec::new())
                }
            };

            machine.transition(RunState::Recording)?;
            if !leads.is_empty() {
                self.repository.append_leads(campaign.id, &leads).await?;
            }
            let record = ActionRecord::new(campaign, account, item.target_id(), item.url(), outcome);
            self.repository.append_action_record(&record).await?;
            // The counter moves only once the outcome is confirmed; the
            // repository persists it with the record.
            *counts.entry(action).or_insert(0) += 1;
            metrics::counter!("outreach.actions_recorded", "outcome" => outcome.as_str())
                .increment(1);
            debug!(
                campaign_id = %campaign.id,
                target = record.target_url.as_str(),
                outcome = outcome.as_str(),
                "action recorded"
            );

            if outcome == ActionOutcome::Error {
                consecutive_errors += 1;
                if consecutive_errors >= self.config.max_consecutive_errors {
                    error!(
                        campaign_id = %campaign.id,
                        account_id = %account.id,
                        consecutive_errors,
                        "consecutive error threshold reached, failing campaign"
                    );
                    machine.transition(RunState::Failed)?;
                    return Err(OutreachError::Driver(format!(
                        "{consecutive_errors} consecutive action errors"
                    )));
                }
            } else {
                consecutive_errors = 0;
            }

            if queue.is_empty() {
                machine.transition(RunState::Completed)?;
                return Ok(RunOutcome::Completed);
            }
        }
    }

    async fn execute(
        &mut self,
        session: &mut dyn PageSession,
        campaign: &Campaign,
        item: &WorkItem,
    ) -> OutreachResult<(ActionOutcome, Vec<Lead>)> {
        match item {
            WorkItem::Profile(target) => {
                let outcome = match campaign.action_type {
                    ActionType::Connect => {
                        actions::send_connection_request(
                            session,
                            &mut self.emulator,
                            &self.config.selectors,
                            target,
                            campaign.note_template.as_deref(),
                        )
                        .await?
                    }
                    ActionType::Visit => {
                        actions::visit_profile(session, &mut self.emulator, target).await?
                    }
                    other => {
                        return Err(OutreachError::Config(format!(
                            "no profile executor for action type {}",
                            other.as_str()
                        )))
                    }
                };
                Ok((outcome, Vec::new()))
            }
            WorkItem::Listing { url, limit } => {
                let (leads, skipped) = actions::extract_listing(
                    session,
                    &mut self.emulator,
                    &self.config.selectors,
                    campaign.id,
                    url,
                    *limit,
                    self.config.scrape_scroll_rounds,
                )
                .await?;
                for entry in &skipped {
                    debug!(
                        campaign_id = %campaign.id,
                        index = entry.index,
                        reason = entry.reason.as_str(),
                        "listing entry skipped"
                    );
                }
                if !skipped.is_empty() {
                    warn!(
                        campaign_id = %campaign.id,
                        skipped = skipped.len(),
                        "some listing entries could not be parsed"
                    );
                }
                Ok((ActionOutcome::Success, leads))
            }
        }
    }
}

/// Reject campaigns this worker cannot execute before any session is
/// acquired.
fn validate_campaign(campaign: &Campaign) -> OutreachResult<()> {
    match campaign.action_type {
        ActionType::Connect | ActionType::Visit => Ok(()),
        ActionType::Scrape => {
            if campaign.search_url.is_none() {
                Err(OutreachError::Config(format!(
                    "scrape campaign {} has no search URL",
                    campaign.id
                )))
            } else {
                Ok(())
            }
        }
        other => Err(OutreachError::Config(format!(
            "campaign {} has no executor for action type {}",
            campaign.id,
            other.as_str()
        ))),
    }
}

fn build_work_queue(campaign: &Campaign, config: &RunnerConfig) -> VecDeque<WorkItem> {
    match campaign.action_type {
        ActionType::Scrape => campaign
            .search_url
            .iter()
            .map(|url| WorkItem::Listing {
                url: url.clone(),
                limit: campaign.scrape_limit.unwrap_or(config.default_scrape_limit),
            })
            .collect(),
        _ => campaign
            .targets
            .iter()
            .cloned()
            .map(WorkItem::Profile)
            .collect(),
    }
}
