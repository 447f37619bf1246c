//! In-memory stand-ins for the browser and the HTTP transport.

use crate::scrapers::traits::{BrowserSession, PageFetcher};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Mutex;
use std::thread::{self, ThreadId};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub html: String,
    pub maps_href: Option<String>,
    /// Successive `scrollHeight` readings; the last one repeats
    pub heights: Vec<f64>,
}

impl FakePage {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            maps_href: None,
            heights: vec![1000.0],
        }
    }

    pub fn with_maps_href(mut self, href: &str) -> Self {
        self.maps_href = Some(href.to_string());
        self
    }

    pub fn with_heights(mut self, heights: &[f64]) -> Self {
        self.heights = heights.to_vec();
        self
    }
}

#[derive(Default)]
pub struct FakeBrowser {
    pages: HashMap<String, FakePage>,
    current: RefCell<Option<String>>,
    measured: RefCell<usize>,
    pub navigations: RefCell<Vec<String>>,
    /// Thread each successful navigation ran on
    pub render_threads: RefCell<Vec<ThreadId>>,
    pub scrolls: RefCell<Vec<f64>>,
    pub script_error: Option<String>,
}

impl FakeBrowser {
    pub fn with_page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    fn page(&self) -> Result<&FakePage> {
        let current = self.current.borrow();
        let url = current.as_deref().ok_or_else(|| anyhow!("no page loaded"))?;
        self.pages
            .get(url)
            .ok_or_else(|| anyhow!("no fixture for {url}"))
    }
}

impl BrowserSession for FakeBrowser {
    fn navigate(&self, url: &str) -> Result<()> {
        if !self.pages.contains_key(url) {
            return Err(anyhow!("net::ERR_NAME_NOT_RESOLVED at {url}"));
        }
        self.navigations.borrow_mut().push(url.to_string());
        self.render_threads.borrow_mut().push(thread::current().id());
        *self.current.borrow_mut() = Some(url.to_string());
        *self.measured.borrow_mut() = 0;
        Ok(())
    }

    fn evaluate(&self, script: &str) -> Result<Value> {
        if let Some(message) = &self.script_error {
            return Err(anyhow!("{message}"));
        }
        let page = self.page()?;
        if script.contains("scrollHeight") {
            let mut measured = self.measured.borrow_mut();
            let idx = (*measured).min(page.heights.len().saturating_sub(1));
            *measured += 1;
            return Ok(json!(page.heights.get(idx).copied().unwrap_or(0.0)));
        }
        if let Some(args) = script.strip_prefix("window.scrollTo(0, ") {
            let y: f64 = args.trim_end_matches(");").parse()?;
            self.scrolls.borrow_mut().push(y);
        }
        Ok(Value::Null)
    }

    fn wait_for_attribute(
        &self,
        _selector: &str,
        _attribute: &str,
        timeout: Duration,
    ) -> Result<Option<String>> {
        match &self.page()?.maps_href {
            Some(href) => Ok(Some(href.clone())),
            None => Err(anyhow!("The event waited for never came after {timeout:?}")),
        }
    }

    fn content(&self) -> Result<String> {
        Ok(self.page()?.html.clone())
    }
}

/// Serves fixed HTML per URL
#[derive(Default)]
pub struct FakeFetcher {
    pages: Mutex<HashMap<String, String>>,
}

impl FakeFetcher {
    pub fn with_page(self, url: &str, html: impl Into<String>) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), html.into());
        self
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("404 Not Found: {url}"))
    }
}

/// Detail page markup shaped like an otodom.pl listing
pub fn detail_html(price: &str, rows: &[(&str, &[&str])]) -> String {
    let rows: String = rows
        .iter()
        .map(|(label, values)| {
            let value = match values {
                [] => String::new(),
                [single] => format!(r#"<p class="e15n0fyo2">{single}</p>"#),
                many => {
                    let tags: String = many
                        .iter()
                        .map(|t| format!(r#"<span class="css-axw7ok e15n0fyo4">{t}</span>"#))
                        .collect();
                    format!(r#"<p class="e15n0fyo2"><span>{tags}</span></p>"#)
                }
            };
            format!(
                r#"<div class="css-t7cajz e15n0fyo1"><p class="e15n0fyo2">{label}:</p>{value}</div>"#
            )
        })
        .collect();

    format!(
        r#"<html><body>
        <strong data-cy="adPageHeaderPrice"> {price} </strong>
        <div class="css-70qvj9 e42rcgs0"><a class="css-1jjm9oe e42rcgs1">Warszawa, Mokotów</a></div>
        <div class="details">{rows}</div>
        </body></html>"#
    )
}

/// Results page markup with a pagination control and listing anchors
pub fn results_html(page_numbers: &[&str], hrefs: &[&str]) -> String {
    let items: String = page_numbers
        .iter()
        .map(|n| format!(r#"<li class="css-43nhzf">{n}</li>"#))
        .collect();
    let links: String = hrefs
        .iter()
        .map(|h| format!(r#"<a data-cy="listing-item-link" href="{h}">offer</a>"#))
        .collect();
    format!(
        r#"<html><body>
        <ul data-cy="frontend.search.base-pagination.nexus-pagination">{items}</ul>
        {links}
        </body></html>"#
    )
}
