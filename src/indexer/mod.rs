//! Incremental indexer
//!
//! Keeps the per-site inverted index consistent with page content:
//! - `Lemma.frequency` counts the pages of a site containing the lemma
//! - `Index.ranking` counts occurrences of a lemma within one page
//!
//! All writes for one page happen under a single storage lock, and rows that
//! may race between crawl tasks are created with conflict-ignoring inserts.

use crate::lemmatizer::Lemmatizer;
use crate::storage::{
    self, IndexWrite, NewPage, PageRecord, SharedStorage, Storage, StorageError,
};
use crate::Result;
use std::sync::Arc;
use tracing::debug;

/// Counters describing what indexing one page changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    /// Lemma rows created with frequency 1
    pub lemmas_created: u32,
    /// Existing lemma rows whose frequency was incremented
    pub frequency_bumps: u32,
    pub indexes_created: u32,
    pub indexes_updated: u32,
    pub indexes_unchanged: u32,
}

impl IndexSummary {
    /// Number of distinct lemmas found on the page
    pub fn lemma_count(&self) -> u32 {
        self.indexes_created + self.indexes_updated + self.indexes_unchanged
    }

    /// Returns true if indexing wrote nothing
    pub fn is_noop(&self) -> bool {
        self.lemmas_created == 0
            && self.frequency_bumps == 0
            && self.indexes_created == 0
            && self.indexes_updated == 0
    }
}

/// Writes lemma and index rows for stored pages
#[derive(Clone)]
pub struct Indexer {
    lemmatizer: Arc<Lemmatizer>,
    storage: SharedStorage,
}

impl Indexer {
    pub fn new(lemmatizer: Arc<Lemmatizer>, storage: SharedStorage) -> Self {
        Self {
            lemmatizer,
            storage,
        }
    }

    pub fn lemmatizer(&self) -> &Arc<Lemmatizer> {
        &self.lemmatizer
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// Stores a freshly fetched page and indexes it
    ///
    /// If a page with the same (site, path) already exists nothing is written
    /// and `None` is returned: the first writer wins.
    pub fn add_page(&self, page: NewPage) -> Result<Option<(PageRecord, IndexSummary)>> {
        let inserted = {
            let mut storage = storage::lock(&self.storage)?;
            let inserted = storage.insert_page_if_absent(&page)?;
            if inserted.is_some() {
                storage.touch_site(page.site_id)?;
            }
            inserted
        };

        let Some(record) = inserted else {
            debug!("Page {} already stored for site {}", page.path, page.site_id);
            return Ok(None);
        };

        let summary = self.index_page(&record, false)?;
        Ok(Some((record, summary)))
    }

    /// Stores a page that may already exist and indexes it
    ///
    /// An existing page gets the new status code and content and is indexed
    /// with `re_index = true`; otherwise the page is inserted and indexed like
    /// a freshly crawled one.
    pub fn upsert_page(&self, page: NewPage) -> Result<(PageRecord, IndexSummary)> {
        let (record, re_index) = {
            let mut storage = storage::lock(&self.storage)?;

            let mut existing = storage.find_page(page.site_id, &page.path)?;
            if existing.is_none() {
                if let Some(inserted) = storage.insert_page_if_absent(&page)? {
                    storage.touch_site(page.site_id)?;
                    drop(storage);
                    let summary = self.index_page(&inserted, false)?;
                    return Ok((inserted, summary));
                }
                // Lost a race with a crawl task
                existing = storage.find_page(page.site_id, &page.path)?;
            }

            let existing = existing.ok_or_else(|| {
                StorageError::PageNotFound(format!("{} (site {})", page.path, page.site_id))
            })?;
            storage.update_page(existing.id, page.code, &page.content)?;
            storage.touch_site(page.site_id)?;

            let record = PageRecord {
                code: page.code,
                content: page.content,
                ..existing
            };
            (record, true)
        };

        let summary = self.index_page(&record, re_index)?;
        Ok((record, summary))
    }

    /// Lemmatizes a stored page and records its lemmas
    ///
    /// With `re_index = false` every lemma of the page adds one to its site
    /// frequency. With `re_index = true` existing lemma rows keep their
    /// frequency and only rankings are refreshed; lemmas new to the site are
    /// still created with frequency 1.
    pub fn index_page(&self, page: &PageRecord, re_index: bool) -> Result<IndexSummary> {
        let text = self.lemmatizer.clear_text(&page.content);
        let mut lemmas: Vec<(String, u32)> = self.lemmatizer.lemmatize(&text).into_iter().collect();
        lemmas.sort();

        let mut summary = IndexSummary::default();
        let mut storage = storage::lock(&self.storage)?;

        for (lemma, count) in &lemmas {
            let upsert = storage.upsert_lemma(page.site_id, lemma, !re_index)?;
            if upsert.created {
                summary.lemmas_created += 1;
            }
            if upsert.bumped {
                summary.frequency_bumps += 1;
            }

            match storage.upsert_index(page.id, upsert.record.id, *count)? {
                IndexWrite::Created => summary.indexes_created += 1,
                IndexWrite::Updated => summary.indexes_updated += 1,
                IndexWrite::Unchanged => summary.indexes_unchanged += 1,
            }
        }

        debug!(
            "Indexed page {} (site {}, re_index={}): {:?}",
            page.path, page.site_id, re_index, summary
        );

        Ok(summary)
    }

    /// Records the ranking of one lemma on one page
    pub fn upsert_index(&self, page_id: i64, lemma_id: i64, ranking: u32) -> Result<IndexWrite> {
        let mut storage = storage::lock(&self.storage)?;
        Ok(storage.upsert_index(page_id, lemma_id, ranking)?)
    }
}
