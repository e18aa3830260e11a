//! Persistence and credential seams. Storage schema and secret decryption
//! live behind these traits.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use outreach_core::types::{Account, ActionRecord, Campaign, CampaignStatus, Credentials, Lead};
use outreach_core::OutreachResult;

/// A campaign joined with the account that executes it.
#[derive(Debug, Clone)]
pub struct CampaignBundle {
    pub campaign: Campaign,
    pub account: Account,
}

#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Fetch a campaign in `active` status together with its account.
    /// Returns `None` for unknown or inactive campaigns.
    async fn fetch_active(&self, campaign_id: Uuid) -> OutreachResult<Option<CampaignBundle>>;

    /// Append one immutable action record. Implementations persist the
    /// account's daily counter bump for `record.action_type` in the same
    /// transaction, so the record and the counter can never diverge.
    async fn append_action_record(&self, record: &ActionRecord) -> OutreachResult<()>;

    /// Persist leads extracted from a listing.
    async fn append_leads(&self, campaign_id: Uuid, leads: &[Lead]) -> OutreachResult<()>;

    async fn update_campaign_status(
        &self,
        campaign_id: Uuid,
        status: CampaignStatus,
    ) -> OutreachResult<()>;
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Resolve login credentials for an account. The secret arrives ready
    /// to use; decryption happens behind this seam.
    async fn resolve(&self, credential_ref: Uuid) -> OutreachResult<Credentials>;
}

#[async_trait]
impl<T: CampaignRepository + ?Sized> CampaignRepository for Arc<T> {
    async fn fetch_active(&self, campaign_id: Uuid) -> OutreachResult<Option<CampaignBundle>> {
        (**self).fetch_active(campaign_id).await
    }

    async fn append_action_record(&self, record: &ActionRecord) -> OutreachResult<()> {
        (**self).append_action_record(record).await
    }

    async fn append_leads(&self, campaign_id: Uuid, leads: &[Lead]) -> OutreachResult<()> {
        (**self).append_leads(campaign_id, leads).await
    }

    async fn update_campaign_status(
        &self,
        campaign_id: Uuid,
        status: CampaignStatus,
    ) -> OutreachResult<()> {
        (**self).update_campaign_status(campaign_id, status).await
    }
}

#[async_trait]
impl<T: CredentialStore + ?Sized> CredentialStore for Arc<T> {
    async fn resolve(&self, credential_ref: Uuid) -> OutreachResult<Credentials> {
        (**self).resolve(credential_ref).await
    }
}
