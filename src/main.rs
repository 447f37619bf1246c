use otodom_scout::scrapers::{
    ChromeSession, CrawlConfig, DetailExtractor, ExtractorSettings, HttpFetcher, OtodomCrawler,
};
use otodom_scout::store::{IncrementalWriter, ResultStore};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,headless_chrome=warn,reqwest=warn,hyper=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🏠 Otodom Scout - incremental house listing scraper");
    info!("====================================================");

    let cfg = CrawlConfig::from_env()?;
    info!("Results file: {}", cfg.results_path.display());

    let store = ResultStore::new(&cfg.results_path);
    let corpus = store.load();

    let fetcher = HttpFetcher::new(&cfg)?;
    let browser = ChromeSession::launch(&cfg)?;
    let extractor = DetailExtractor::new(browser, ExtractorSettings::from(&cfg));

    let crawler = OtodomCrawler::new(
        cfg,
        Arc::new(fetcher),
        extractor,
        IncrementalWriter::new(store),
    );

    let (corpus, summary) = crawler.run(corpus).await?;

    info!("\n✅ Crawled {} of {} pages", summary.pages_fetched, summary.pages_total);
    info!(
        "💾 {} new properties saved, {} duplicates skipped, {} in results",
        summary.records_saved,
        summary.duplicates_skipped,
        corpus.len()
    );
    if summary.records_unflushed > 0 {
        warn!(
            "{} saves failed; those properties are on disk only if a later save succeeded",
            summary.records_unflushed
        );
    }

    Ok(())
}
