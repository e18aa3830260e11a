use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use outreach_core::config::BrowserConfig as BrowserSettings;
use outreach_core::error::{OutreachError, OutreachResult};
use outreach_core::types::ProxyConfig;
use outreach_emulation::fingerprint::LAUNCH_FLAGS;
use outreach_emulation::Key;
use outreach_orchestrator::{
    BrowserDriver, ElementHandle, PageSession, SessionCookie, SessionProfile,
};

/// Launches one Chromium instance per session.
#[derive(Debug, Clone)]
pub struct ChromeDriver {
    settings: BrowserSettings,
}

impl ChromeDriver {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

/// Launch flags for one session: the anti-automation set plus the
/// account's proxy, if any. Proxy credentials need an authenticating
/// upstream; only the server address is wired here.
fn launch_args(proxy: Option<&ProxyConfig>) -> Vec<String> {
    let mut args: Vec<String> = LAUNCH_FLAGS.iter().map(|f| f.to_string()).collect();
    if let Some(proxy) = proxy {
        args.push(format!("--proxy-server={}", proxy.server()));
        if proxy.username.is_some() {
            warn!("proxy credentials are set but not forwarded to the browser");
        }
    }
    args
}

#[async_trait]
impl BrowserDriver for ChromeDriver {
    async fn open_session(&self, profile: SessionProfile) -> OutreachResult<Box<dyn PageSession>> {
        let mut builder = BrowserConfig::builder()
            .args(launch_args(profile.proxy.as_ref()))
            .request_timeout(Duration::from_millis(self.settings.navigation_timeout_ms));
        if !self.settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(OutreachError::Driver)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(cdp_err)?;
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = browser.new_page("about:blank").await.map_err(cdp_err)?;
        page.set_user_agent(profile.user_agent.as_str())
            .await
            .map_err(cdp_err)?;

        debug!(user_agent = profile.user_agent.as_str(), "browser session opened");
        Ok(Box::new(ChromeSession {
            browser,
            page,
            handler_task,
            init_script: profile.init_script,
            elements: HashMap::new(),
            next_handle: 0,
            closed: false,
        }))
    }
}

pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    init_script: Option<String>,
    elements: HashMap<u64, Element>,
    next_handle: u64,
    closed: bool,
}

impl ChromeSession {
    fn register(&mut self, element: Element) -> ElementHandle {
        self.next_handle += 1;
        self.elements.insert(self.next_handle, element);
        ElementHandle(self.next_handle)
    }

    fn element(&self, handle: ElementHandle) -> OutreachResult<&Element> {
        self.elements
            .get(&handle.0)
            .ok_or_else(|| OutreachError::Driver(format!("stale element handle {}", handle.0)))
    }
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> OutreachResult<()> {
        // Handles from the previous page are meaningless after navigation.
        self.elements.clear();
        self.page.goto(url).await.map_err(cdp_err)?;
        if let Some(script) = self.init_script.clone() {
            self.page.evaluate(script.as_str()).await.map_err(cdp_err)?;
        }
        Ok(())
    }

    async fn current_url(&mut self) -> OutreachResult<String> {
        Ok(self.page.url().await.map_err(cdp_err)?.unwrap_or_default())
    }

    async fn query(&mut self, selector: &str) -> OutreachResult<Option<ElementHandle>> {
        match self.page.find_element(selector).await {
            Ok(element) => Ok(Some(self.register(element))),
            Err(_) => Ok(None),
        }
    }

    async fn query_all(&mut self, selector: &str) -> OutreachResult<Vec<ElementHandle>> {
        let elements = self.page.find_elements(selector).await.unwrap_or_default();
        Ok(elements
            .into_iter()
            .map(|element| self.register(element))
            .collect())
    }

    async fn query_within(
        &mut self,
        root: ElementHandle,
        selector: &str,
    ) -> OutreachResult<Option<ElementHandle>> {
        let element = match self.element(root)?.find_element(selector).await {
            Ok(element) => Some(element),
            Err(_) => None,
        };
        Ok(element.map(|e| self.register(e)))
    }

    async fn click(&mut self, element: ElementHandle) -> OutreachResult<()> {
        self.element(element)?.click().await.map_err(cdp_err)?;
        Ok(())
    }

    async fn send_key(&mut self, element: ElementHandle, key: Key) -> OutreachResult<()> {
        let element = self.element(element)?;
        match key {
            Key::Char(c) => {
                element
                    .type_str(c.to_string().as_str())
                    .await
                    .map_err(cdp_err)?;
            }
            Key::Backspace => {
                element.press_key("Backspace").await.map_err(cdp_err)?;
            }
        }
        Ok(())
    }

    async fn evaluate(&mut self, script: &str) -> OutreachResult<serde_json::Value> {
        let result = self.page.evaluate(script).await.map_err(cdp_err)?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn inner_text(&mut self, element: ElementHandle) -> OutreachResult<Option<String>> {
        self.element(element)?.inner_text().await.map_err(cdp_err)
    }

    async fn attribute(
        &mut self,
        element: ElementHandle,
        name: &str,
    ) -> OutreachResult<Option<String>> {
        self.element(element)?.attribute(name).await.map_err(cdp_err)
    }

    async fn move_mouse(&mut self, x: f64, y: f64) -> OutreachResult<()> {
        let params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseMoved)
            .x(x)
            .y(y)
            .build()
            .map_err(OutreachError::Driver)?;
        self.page.execute(params).await.map_err(cdp_err)?;
        Ok(())
    }

    async fn cookies(&mut self) -> OutreachResult<Vec<SessionCookie>> {
        let cookies = self.page.get_cookies().await.map_err(cdp_err)?;
        Ok(cookies
            .into_iter()
            .map(|cookie| SessionCookie {
                name: cookie.name,
                value: cookie.value,
                domain: Some(cookie.domain),
            })
            .collect())
    }

    async fn close(&mut self) -> OutreachResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.elements.clear();
        self.browser.close().await.map_err(cdp_err)?;
        if let Err(error) = self.browser.wait().await {
            warn!(error = %error, "browser did not exit cleanly");
        }
        self.handler_task.abort();
        Ok(())
    }
}

fn cdp_err(error: chromiumoxide::error::CdpError) -> OutreachError {
    OutreachError::Driver(error.to_string())
}
