use crate::models::{Coordinates, FieldGroup, PropertyRecord, StaticFields, NO_INFORMATION};
use crate::scrapers::pagination::own_text;
use crate::scrapers::selectors::{
    COORDINATES, DETAIL_CELLS, DETAIL_ROWS, DETAIL_TAGS, MAPS_LINK, STATIC_FIELDS,
};
use crate::scrapers::traits::BrowserSession;
use crate::scrapers::types::CrawlConfig;
use anyhow::{anyhow, Context, Result};
use scraper::{ElementRef, Html};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound on scroll steps for pages that keep growing
const MAX_SCROLL_STEPS: usize = 200;

#[derive(Debug, Clone, Copy)]
pub struct ExtractorSettings {
    pub scroll_pause: Duration,
    pub scroll_increment: f64,
    pub maps_timeout: Duration,
}

impl From<&CrawlConfig> for ExtractorSettings {
    fn from(cfg: &CrawlConfig) -> Self {
        Self {
            scroll_pause: cfg.scroll_pause,
            scroll_increment: cfg.scroll_increment,
            maps_timeout: cfg.maps_timeout,
        }
    }
}

/// Renders detail pages in the browser and turns them into records
pub struct DetailExtractor<B> {
    browser: B,
    settings: ExtractorSettings,
}

impl<B: BrowserSession> DetailExtractor<B> {
    pub fn new(browser: B, settings: ExtractorSettings) -> Self {
        Self { browser, settings }
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    /// Render `link` and extract one record.
    ///
    /// Only navigation or reading the rendered page can fail; every field that
    /// cannot be resolved is set to [`NO_INFORMATION`]. Blocks the calling thread
    /// for the whole render, so async callers go through `spawn_blocking`.
    pub fn extract(&self, link: &str, page_number: u32) -> Result<PropertyRecord> {
        self.browser
            .navigate(link)
            .with_context(|| format!("Failed to load {link}"))?;

        if let Err(e) = self.scroll_to_load() {
            warn!(link, error = ?e, "Scrolling failed, lazy content may be missing");
        }

        let coordinates = self.read_coordinates();

        let html = self
            .browser
            .content()
            .with_context(|| format!("Failed to read rendered page {link}"))?;
        let document = Html::parse_document(&html);

        let record = PropertyRecord::new(link, page_number, coordinates)
            .with(FieldGroup::Static(extract_static_fields(&document)))
            .with(FieldGroup::Dynamic(extract_dynamic_fields(&document)));

        info!(
            "Fetched data for: {}, Latitude: {}, Longitude: {}",
            record.link, record.latitude, record.longitude
        );

        Ok(record)
    }

    /// Scroll down in steps until the scroll position passes a document height that stopped growing
    fn scroll_to_load(&self) -> Result<()> {
        let mut total_height = self.document_height()?;
        let mut position = 0.0;
        let mut steps = 0;

        while position < total_height {
            if steps == MAX_SCROLL_STEPS {
                warn!(steps, total_height, "Page keeps growing, giving up on scrolling");
                break;
            }
            position += total_height * self.settings.scroll_increment;
            self.browser
                .evaluate(&format!("window.scrollTo(0, {position});"))?;
            thread::sleep(self.settings.scroll_pause);
            total_height = self.document_height()?;
            steps += 1;
        }

        debug!(steps, total_height, "Finished scrolling");
        Ok(())
    }

    fn document_height(&self) -> Result<f64> {
        let value = self.browser.evaluate("document.body.scrollHeight")?;
        value
            .as_f64()
            .ok_or_else(|| anyhow!("scrollHeight is not a number: {value}"))
    }

    fn read_coordinates(&self) -> Coordinates {
        match self
            .browser
            .wait_for_attribute(MAPS_LINK, "href", self.settings.maps_timeout)
        {
            Ok(Some(href)) => {
                let coordinates = parse_coordinates(&href);
                if !coordinates.is_known() {
                    debug!("Maps link has no ll= parameter: {}", href);
                }
                coordinates
            }
            Ok(None) => {
                debug!("Maps link has no href");
                Coordinates::unknown()
            }
            Err(e) => {
                warn!("Error extracting coordinates: {:#}", e);
                Coordinates::unknown()
            }
        }
    }
}

/// Read `ll=<lat>,<lon>` from a maps link
pub fn parse_coordinates(href: &str) -> Coordinates {
    match COORDINATES.captures(href) {
        Some(caps) => Coordinates {
            latitude: caps[1].to_string(),
            longitude: caps[2].to_string(),
        },
        None => Coordinates::unknown(),
    }
}

/// Fixed fields, each from the first text node of its element
pub fn extract_static_fields(document: &Html) -> StaticFields {
    StaticFields::from_lookup(|name| {
        let (_, selector) = STATIC_FIELDS.iter().find(|(n, _)| *n == name)?;
        document
            .select(selector)
            .flat_map(own_text)
            .next()
            .map(|text| text.trim().to_string())
    })
}

/// Label/value rows of the details table, in document order
pub fn extract_dynamic_fields(document: &Html) -> Vec<(String, String)> {
    let mut fields = Vec::new();

    for row in document.select(&DETAIL_ROWS) {
        let mut cells = row.select(&DETAIL_CELLS);
        let label = cells
            .next()
            .and_then(|cell| own_text(cell).next())
            .map(|text| text.replace(':', "").trim().to_string())
            .filter(|label| !label.is_empty());

        let Some(label) = label else {
            debug!("Skipping details row without a label");
            continue;
        };

        let value = match cells.next() {
            Some(cell) => cell_value(cell),
            None => NO_INFORMATION.to_string(),
        };
        fields.push((label, value));
    }

    fields
}

/// Tag chips joined with ", " if present, otherwise every text node of the cell
fn cell_value(cell: ElementRef<'_>) -> String {
    let tags = non_empty(cell.select(&DETAIL_TAGS).flat_map(own_text));
    let parts = if tags.is_empty() {
        non_empty(cell.text().map(str::to_string))
    } else {
        tags
    };

    if parts.is_empty() {
        NO_INFORMATION.to_string()
    } else {
        parts.join(", ")
    }
}

fn non_empty(texts: impl Iterator<Item = String>) -> Vec<String> {
    texts
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
