use crate::scrapers::dedup::LinkDeduplicator;
use crate::scrapers::extractor::DetailExtractor;
use crate::scrapers::pagination::{listing_links, Paginator};
use crate::scrapers::traits::{BrowserSession, PageFetcher};
use crate::scrapers::types::CrawlConfig;
use crate::store::{Commit, CorpusState, IncrementalWriter};
use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Counters for one crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub pages_total: u32,
    pub pages_fetched: u32,
    pub pages_failed: u32,
    pub links_discovered: usize,
    pub duplicates_skipped: usize,
    pub records_saved: usize,
    pub records_unflushed: usize,
    pub details_failed: usize,
}

/// A detail page waiting for the browser
#[derive(Debug, Clone, PartialEq, Eq)]
struct DetailTask {
    page: u32,
    link: String,
}

/// Incremental otodom.pl crawl: results pages over HTTP, detail pages through one browser
pub struct OtodomCrawler<B> {
    config: CrawlConfig,
    fetcher: Arc<dyn PageFetcher>,
    paginator: Paginator,
    dedup: LinkDeduplicator,
    extractor: Arc<Mutex<DetailExtractor<B>>>,
    writer: IncrementalWriter,
}

impl<B: BrowserSession + Send + 'static> OtodomCrawler<B> {
    pub fn new(
        config: CrawlConfig,
        fetcher: Arc<dyn PageFetcher>,
        extractor: DetailExtractor<B>,
        writer: IncrementalWriter,
    ) -> Self {
        Self {
            paginator: Paginator::new(config.fallback_page_count),
            dedup: LinkDeduplicator,
            config,
            fetcher,
            extractor: Arc::new(Mutex::new(extractor)),
            writer,
        }
    }

    pub fn extractor(&self) -> MutexGuard<'_, DetailExtractor<B>> {
        self.extractor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Crawl every results page and save each new listing as soon as it is extracted.
    ///
    /// Results pages are requested in ascending order with up to
    /// `page_concurrency` in flight and handled in completion order. Detail
    /// pages are rendered one at a time on the blocking pool, so fetches already
    /// in flight keep making progress meanwhile.
    pub async fn run(&self, mut corpus: CorpusState) -> Result<(CorpusState, CrawlSummary)> {
        let mut summary = CrawlSummary::default();

        let first_url = self.config.page_url(1);
        let first_page = self
            .fetcher
            .fetch(&first_url)
            .await
            .context("Failed to fetch first results page")?;
        summary.pages_total = self.paginator.page_count(&first_page);
        info!("Number of pages taken into account: {}", summary.pages_total);

        let mut pending_pages: VecDeque<u32> =
            self.paginator.cursor(summary.pages_total).collect();
        let mut pending_details: VecDeque<DetailTask> = VecDeque::new();
        let mut in_flight = JoinSet::new();
        let limit = self.config.page_concurrency.max(1);

        loop {
            while let Some(task) = pending_details.pop_front() {
                self.process_detail(&mut corpus, task, &mut summary).await?;
            }

            while in_flight.len() < limit {
                let Some(page) = pending_pages.pop_front() else {
                    break;
                };
                let fetcher = Arc::clone(&self.fetcher);
                let url = self.config.page_url(page);
                in_flight.spawn(async move {
                    let result = fetcher.fetch(&url).await;
                    (page, url, result)
                });
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };
            let (page, url, result) = joined.context("Results page task panicked")?;

            let html = match result {
                Ok(html) => html,
                Err(e) => {
                    summary.pages_failed += 1;
                    warn!(page, error = ?e, "Failed to fetch results page");
                    continue;
                }
            };
            summary.pages_fetched += 1;

            let links = listing_links(&html, &url);
            info!("Fetched {} links from page {}", links.len(), page);
            summary.links_discovered += links.len();

            let (fresh, skipped) = self.dedup.filter(&corpus, links);
            summary.duplicates_skipped += skipped;
            pending_details.extend(fresh.into_iter().map(|link| DetailTask { page, link }));
        }

        info!(
            pages = summary.pages_fetched,
            failed_pages = summary.pages_failed,
            links = summary.links_discovered,
            duplicates = summary.duplicates_skipped,
            saved = summary.records_saved,
            failed_details = summary.details_failed,
            corpus = corpus.len(),
            "Crawl finished"
        );

        Ok((corpus, summary))
    }

    async fn process_detail(
        &self,
        corpus: &mut CorpusState,
        task: DetailTask,
        summary: &mut CrawlSummary,
    ) -> Result<()> {
        // An earlier page may have listed the same link already in this run.
        if corpus.contains(&task.link) {
            summary.duplicates_skipped += 1;
            return Ok(());
        }

        let extractor = Arc::clone(&self.extractor);
        let (link, page) = (task.link.clone(), task.page);
        let extracted = tokio::task::spawn_blocking(move || {
            let extractor = extractor.lock().unwrap_or_else(PoisonError::into_inner);
            extractor.extract(&link, page)
        })
        .await
        .context("Detail extraction task panicked")?;

        let record = match extracted {
            Ok(record) => record,
            Err(e) => {
                summary.details_failed += 1;
                error!(link = %task.link, page = task.page, error = ?e, "Failed to extract listing");
                return Ok(());
            }
        };

        match self.writer.commit(corpus, record) {
            Commit::Saved => summary.records_saved += 1,
            Commit::Unflushed => summary.records_unflushed += 1,
            Commit::Duplicate => summary.duplicates_skipped += 1,
        }
        Ok(())
    }
}
