use crate::scrapers::traits::BrowserSession;
use crate::scrapers::types::CrawlConfig;
use anyhow::{Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// One headless Chrome tab, reused for every detail page
pub struct ChromeSession {
    // Keeps the Chrome process alive for as long as the tab is used.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeSession {
    /// Launch Chrome and open the tab
    pub fn launch(cfg: &CrawlConfig) -> Result<Self> {
        info!("Launching headless Chrome...");

        let args: Vec<&OsStr> = vec![OsStr::new("--disable-dev-shm-usage")];
        let options = LaunchOptions::default_builder()
            .headless(cfg.headless)
            .sandbox(false)
            .args(args)
            .idle_browser_timeout(Duration::from_secs(600))
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open browser tab")?;
        tab.set_user_agent(&cfg.user_agent, None, None)
            .context("Failed to set user agent")?;

        Ok(Self {
            _browser: browser,
            tab,
        })
    }
}

impl BrowserSession for ChromeSession {
    fn navigate(&self, url: &str) -> Result<()> {
        debug!("Opening {}", url);
        self.tab.navigate_to(url)?;
        self.tab.wait_until_navigated()?;
        Ok(())
    }

    fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self.tab.evaluate(script, false)?;
        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }

    fn wait_for_attribute(
        &self,
        selector: &str,
        attribute: &str,
        timeout: Duration,
    ) -> Result<Option<String>> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .with_context(|| format!("No element matching {selector} within {timeout:?}"))?;

        let selector_js = serde_json::to_string(selector)?;
        let attribute_js = serde_json::to_string(attribute)?;
        let value = self.evaluate(&format!(
            "document.querySelector({selector_js})?.getAttribute({attribute_js})"
        ))?;

        Ok(value.as_str().map(str::to_string))
    }

    fn content(&self) -> Result<String> {
        let html = self.evaluate("document.documentElement.outerHTML")?;
        Ok(html.as_str().unwrap_or_default().to_string())
    }
}
