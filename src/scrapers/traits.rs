use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Fetches listing pages as raw HTML
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// A single live browser page, driven one call at a time
///
/// Every call blocks until the browser answers.
pub trait BrowserSession {
    /// Navigate and wait for the page load to finish
    fn navigate(&self, url: &str) -> Result<()>;

    /// Evaluate a script in the page and return its result
    fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Wait up to `timeout` for an element matching `selector`, then read one of its attributes.
    /// Fails if no element appears in time.
    fn wait_for_attribute(
        &self,
        selector: &str,
        attribute: &str,
        timeout: Duration,
    ) -> Result<Option<String>>;

    /// Rendered HTML of the current page
    fn content(&self) -> Result<String>;
}
