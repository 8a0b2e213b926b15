//! Browser session manager: one isolated browser process plus one page per
//! scrape, configured for a reduced automation fingerprint and guaranteed
//! to be torn down on every exit path.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::network::SetBlockedUrLsParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task;
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::errors::ScrapeError;

pub struct Session {
    browser: Option<Browser>,
    page: Page,
    _handler_handle: task::JoinHandle<()>,
}

impl Session {
    /// Launches an isolated browser and a single configured page.
    /// The caller must pair this with [`Session::close`]; `Drop` is only a
    /// backstop against leaked processes.
    pub async fn launch(config: &SessionConfig) -> Result<Self, ScrapeError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(config.nav_timeout + Duration::from_secs(5))
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-extensions")
            .arg("--disable-gpu")
            .arg("--disable-software-rasterizer");

        if config.headless {
            builder = builder.headless_mode(HeadlessMode::True);
        } else {
            builder = builder.headless_mode(HeadlessMode::False);
        }

        let browser_config = builder
            .build()
            .map_err(ScrapeError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScrapeError::BrowserLaunch(e.to_string()))?;

        let _handler_handle = task::spawn(async move {
            while handler.next().await.is_some() {}
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::PageCreation(e.to_string()))?;

        let session = Self {
            browser: Some(browser),
            page,
            _handler_handle,
        };
        session.configure_page(config).await?;
        Ok(session)
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    async fn configure_page(&self, config: &SessionConfig) -> Result<(), ScrapeError> {
        self.page
            .execute(SetUserAgentOverrideParams::new(config.user_agent))
            .await
            .map_err(|e| ScrapeError::EvaluationFailed(format!("set user agent: {}", e)))?;

        let (width, height) = config.viewport;
        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(width as i64)
            .height(height as i64)
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(ScrapeError::EvaluationFailed)?;
        self.page
            .execute(metrics)
            .await
            .map_err(|e| ScrapeError::EvaluationFailed(format!("set viewport: {}", e)))?;

        let blocked: Vec<String> = config
            .blocked_url_patterns
            .iter()
            .map(|p| p.to_string())
            .collect();
        self.page
            .execute(SetBlockedUrLsParams::new(blocked))
            .await
            .map_err(|e| ScrapeError::EvaluationFailed(format!("block resources: {}", e)))?;

        let evasion_script = r#"
            Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
            Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3] });
            Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
        "#
        .to_string();

        self.page
            .execute(AddScriptToEvaluateOnNewDocumentParams {
                source: evasion_script,
                world_name: None,
                include_command_line_api: None,
                run_immediately: None,
            })
            .await
            .map_err(|e| ScrapeError::EvaluationFailed(format!("add evasion script: {}", e)))?;

        debug!(user_agent = config.user_agent, "session page configured");
        Ok(())
    }

    /// Terminates the browser process. Consumes the session so release
    /// happens at most once per acquire.
    pub async fn close(mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("browser close failed: {}", e);
            }
            if let Err(e) = browser.wait().await {
                warn!("browser wait failed: {}", e);
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Leaked browser processes are the dominant failure mode here, so a
        // session dropped without close() still kills the browser.
        if let Some(mut browser) = self.browser.take() {
            tokio::spawn(async move {
                let _ = browser.close().await;
                let _ = browser.wait().await;
            });
        }
    }
}
