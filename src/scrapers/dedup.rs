use crate::store::CorpusState;
use tracing::debug;

/// Fetch-or-skip decision for a discovered detail link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDecision {
    Fetch,
    Skip,
}

/// Filters out links already present in the corpus.
///
/// Matching is exact string equality: URLs differing only by a trailing slash,
/// query order or scheme count as different listings.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkDeduplicator;

impl LinkDeduplicator {
    pub fn classify(&self, corpus: &CorpusState, link: &str) -> LinkDecision {
        if corpus.contains(link) {
            debug!("Duplicate link {}, skipped", link);
            LinkDecision::Skip
        } else {
            LinkDecision::Fetch
        }
    }

    /// Keep the links to fetch, preserving order; returns them with the number skipped
    pub fn filter(&self, corpus: &CorpusState, links: Vec<String>) -> (Vec<String>, usize) {
        let total = links.len();
        let fresh: Vec<String> = links
            .into_iter()
            .filter(|link| self.classify(corpus, link) == LinkDecision::Fetch)
            .collect();
        let skipped = total - fresh.len();
        (fresh, skipped)
    }
}
