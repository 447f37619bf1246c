//! Incremental scraper for house listings on otodom.pl.
//!
//! Results pages are fetched over HTTP, detail pages are rendered in headless
//! Chrome, and every new listing is appended to a JSON result store that also
//! serves as the dedup ledger for later runs.

pub mod models;
pub mod scrapers;
pub mod store;
