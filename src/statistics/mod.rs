//! Index statistics
//!
//! Summarizes every configured site, plus any stored site that is no longer
//! configured, with its status and page and lemma counts.

use crate::config::SiteEntry;
use crate::state::SiteStatus;
use crate::storage::{SiteRecord, Storage};
use crate::Result;
use serde::Serialize;

/// Totals and per-site statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total: TotalStatistics,
    pub detailed: Vec<SiteStatistics>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TotalStatistics {
    pub sites: u64,
    pub pages: u64,
    pub lemmas: u64,
    /// Whether a crawl is currently running
    pub indexing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStatistics {
    pub url: String,
    pub name: String,
    pub status: String,
    /// Last status change, in milliseconds since the Unix epoch
    pub status_time: i64,
    pub error: Option<String>,
    pub pages: u64,
    pub lemmas: u64,
}

impl SiteStatistics {
    fn from_record(storage: &dyn Storage, site: &SiteRecord) -> Result<Self> {
        Ok(Self {
            url: site.url.clone(),
            name: site.name.clone(),
            status: site.status.to_db_string().to_string(),
            status_time: site.status_time.timestamp_millis(),
            error: site.last_error.clone(),
            pages: storage.count_pages(Some(site.id))?,
            lemmas: storage.count_lemmas(Some(site.id))?,
        })
    }

    /// A configured site that has never been stored
    fn missing(entry: &SiteEntry) -> Self {
        Self {
            url: entry.url.clone(),
            name: entry.name.clone(),
            status: SiteStatus::Failed.to_db_string().to_string(),
            status_time: 0,
            error: None,
            pages: 0,
            lemmas: 0,
        }
    }
}

/// Loads statistics from storage
///
/// Configured sites come first in configuration order, followed by stored
/// sites that are no longer configured. A configured site without a stored
/// row is reported as FAILED with zero counts.
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `sites` - The configured sites
/// * `indexing` - Whether a crawl is currently running
pub fn load_statistics(
    storage: &dyn Storage,
    sites: &[SiteEntry],
    indexing: bool,
) -> Result<Statistics> {
    let stored = storage.list_sites()?;
    let mut detailed = Vec::with_capacity(sites.len().max(stored.len()));

    for entry in sites {
        match stored.iter().find(|site| site.url == entry.url) {
            Some(site) => detailed.push(SiteStatistics::from_record(storage, site)?),
            None => detailed.push(SiteStatistics::missing(entry)),
        }
    }

    for site in &stored {
        if !sites.iter().any(|entry| entry.url == site.url) {
            detailed.push(SiteStatistics::from_record(storage, site)?);
        }
    }

    let total = TotalStatistics {
        sites: detailed.len() as u64,
        pages: storage.count_pages(None)?,
        lemmas: storage.count_lemmas(None)?,
        indexing,
    };

    Ok(Statistics { total, detailed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{NewPage, SqliteStorage};

    fn entry(url: &str, name: &str) -> SiteEntry {
        SiteEntry {
            url: url.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_empty_storage_reports_configured_sites_as_failed() {
        let storage = SqliteStorage::new_in_memory().unwrap();

        let stats = load_statistics(&storage, &[entry("https://a.com", "A")], false).unwrap();

        assert_eq!(stats.total.sites, 1);
        assert_eq!(stats.total.pages, 0);
        assert!(!stats.total.indexing);
        assert_eq!(stats.detailed[0].status, "FAILED");
        assert_eq!(stats.detailed[0].status_time, 0);
        assert_eq!(stats.detailed[0].name, "A");
    }

    #[test]
    fn test_counts_per_site_and_totals() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let a = storage
            .insert_site("https://a.com", "A", SiteStatus::Indexed)
            .unwrap();
        let b = storage
            .insert_site("https://b.com", "B", SiteStatus::Indexing)
            .unwrap();
        for (site_id, path) in [(a.id, "/"), (a.id, "/x"), (b.id, "/")] {
            storage
                .insert_page_if_absent(&NewPage {
                    site_id,
                    path: path.to_string(),
                    code: 200,
                    content: String::new(),
                })
                .unwrap();
        }
        storage.upsert_lemma(a.id, "cat", true).unwrap();

        let stats = load_statistics(
            &storage,
            &[entry("https://b.com", "B"), entry("https://a.com", "A")],
            true,
        )
        .unwrap();

        assert_eq!(stats.total.pages, 3);
        assert_eq!(stats.total.lemmas, 1);
        assert!(stats.total.indexing);
        assert_eq!(stats.detailed[0].url, "https://b.com");
        assert_eq!(stats.detailed[0].status, "INDEXING");
        assert_eq!(stats.detailed[1].pages, 2);
        assert_eq!(stats.detailed[1].lemmas, 1);
        assert_eq!(stats.detailed[1].status_time, a.status_time.timestamp_millis());
    }

    #[test]
    fn test_unconfigured_stored_site_listed_last() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .insert_site("https://old.com", "Old", SiteStatus::Failed)
            .unwrap();

        let stats = load_statistics(&storage, &[entry("https://a.com", "A")], false).unwrap();

        assert_eq!(stats.total.sites, 2);
        assert_eq!(stats.detailed[1].url, "https://old.com");
    }

    #[test]
    fn test_serializes_camel_case() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let stats = load_statistics(&storage, &[entry("https://a.com", "A")], false).unwrap();

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["detailed"][0]["statusTime"], 0);
        assert_eq!(json["total"]["indexing"], false);
    }
}
