//! Browser automation seam. The orchestrator drives a session through this
//! trait one logical operation at a time; element-selection strings come
//! from [`crate::selectors`] so the adapter only executes them.

use async_trait::async_trait;

use outreach_core::types::ProxyConfig;
use outreach_core::OutreachResult;
use outreach_emulation::Key;

/// Session-level identity: fingerprint, upstream proxy, and an optional
/// script evaluated on every page to mask automation signals.
#[derive(Debug, Clone)]
pub struct SessionProfile {
    pub user_agent: String,
    pub proxy: Option<ProxyConfig>,
    pub init_script: Option<String>,
}

/// Opaque reference to an element previously returned by a query on the
/// same session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
}

/// Opens automation sessions. One session serves one campaign run.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn open_session(&self, profile: SessionProfile) -> OutreachResult<Box<dyn PageSession>>;
}

/// A live page within an automation session. Queries return `None` for
/// absent elements; absence is a semantic signal to the orchestrator, not
/// an error.
#[async_trait]
pub trait PageSession: Send {
    async fn navigate(&mut self, url: &str) -> OutreachResult<()>;

    async fn current_url(&mut self) -> OutreachResult<String>;

    async fn query(&mut self, selector: &str) -> OutreachResult<Option<ElementHandle>>;

    async fn query_all(&mut self, selector: &str) -> OutreachResult<Vec<ElementHandle>>;

    async fn query_within(
        &mut self,
        root: ElementHandle,
        selector: &str,
    ) -> OutreachResult<Option<ElementHandle>>;

    async fn click(&mut self, element: ElementHandle) -> OutreachResult<()>;

    /// Press a single key into a focused element. Typing cadence is the
    /// caller's responsibility; the adapter sends keys as fast as asked.
    async fn send_key(&mut self, element: ElementHandle, key: Key) -> OutreachResult<()>;

    async fn evaluate(&mut self, script: &str) -> OutreachResult<serde_json::Value>;

    async fn inner_text(&mut self, element: ElementHandle) -> OutreachResult<Option<String>>;

    async fn attribute(
        &mut self,
        element: ElementHandle,
        name: &str,
    ) -> OutreachResult<Option<String>>;

    async fn move_mouse(&mut self, x: f64, y: f64) -> OutreachResult<()>;

    async fn cookies(&mut self) -> OutreachResult<Vec<SessionCookie>>;

    /// Release the underlying browser resources. Idempotent; called
    /// exactly once by the runner on every exit path.
    async fn close(&mut self) -> OutreachResult<()>;
}
