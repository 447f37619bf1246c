use crate::scrapers::selectors::{LISTING_LINKS, PAGINATION_ITEMS};
use reqwest::Url;
use scraper::{ElementRef, Html};
use tracing::{debug, info, warn};

/// Determines how many results pages to crawl
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    fallback: u32,
}

impl Paginator {
    pub fn new(fallback: u32) -> Self {
        Self { fallback }
    }

    /// Highest page number in the pagination control, or the fallback when none parses
    pub fn page_count(&self, first_page_html: &str) -> u32 {
        let document = Html::parse_document(first_page_html);
        let tokens: Vec<String> = document
            .select(&PAGINATION_ITEMS)
            .flat_map(own_text)
            .collect();
        debug!("Pagination tokens: {:?}", tokens);

        self.count_from_tokens(&tokens)
    }

    pub fn count_from_tokens<I>(&self, tokens: I) -> u32
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let max = tokens
            .into_iter()
            .filter_map(|t| {
                let t = t.as_ref().trim();
                if t.is_empty() || !t.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                t.parse::<u32>().ok()
            })
            .max();

        match max {
            Some(pages) => {
                info!("Highest page number: {}", pages);
                pages
            }
            None => {
                warn!(
                    "No page numbers found in pagination, assuming {} pages",
                    self.fallback
                );
                self.fallback
            }
        }
    }

    pub fn cursor(&self, total: u32) -> PaginationCursor {
        PaginationCursor::new(total)
    }
}

/// Walks page numbers `1..=total` in ascending order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationCursor {
    pub current: u32,
    pub total: u32,
}

impl PaginationCursor {
    pub fn new(total: u32) -> Self {
        Self { current: 0, total }
    }
}

impl Iterator for PaginationCursor {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.current >= self.total {
            return None;
        }
        self.current += 1;
        Some(self.current)
    }
}

/// Absolute detail-page links on a results page, in document order
pub fn listing_links(html: &str, page_url: &str) -> Vec<String> {
    let base = match Url::parse(page_url) {
        Ok(base) => Some(base),
        Err(e) => {
            warn!(page_url, error = %e, "Listing page URL does not parse, keeping raw hrefs");
            None
        }
    };

    let document = Html::parse_document(html);
    document
        .select(&LISTING_LINKS)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| match &base {
            Some(base) => base.join(href).ok().map(String::from),
            None => Some(href.to_string()),
        })
        .collect()
}

/// Text nodes that are direct children of `element`
pub(crate) fn own_text<'a>(element: ElementRef<'a>) -> impl Iterator<Item = String> + 'a {
    element
        .children()
        .filter_map(|child| child.value().as_text().map(|t| (**t).to_owned()))
}
