//! Crawl coordination
//!
//! `IndexingService` owns the lifecycle of crawl sessions:
//! - Resetting every configured site and spawning one crawl task per site
//! - Fanning out one task per discovered link, bounded by the session semaphore
//! - Settling each site as INDEXED or FAILED and clearing the running flag
//!   once no site is left INDEXING
//! - Re-indexing single pages outside of any session

use crate::config::Config;
use crate::crawler::{build_http_client, extract_links, fetch_page, CrawlSession, FetchedPage};
use crate::indexer::Indexer;
use crate::search::SearchCache;
use crate::state::SiteStatus;
use crate::storage::{self, NewPage, SiteRecord, Storage};
use crate::url::{is_crawlable, is_within_site, normalize_link, page_path, parse_http_url};
use crate::{LexiError, Result};
use reqwest::Client;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

/// Error recorded on sites whose crawl was stopped on request
pub const STOPPED_BY_USER: &str = "Indexing stopped by user";

/// Error recorded on sites left INDEXING by a previous process
pub const INTERRUPTED: &str = "Indexing interrupted by shutdown";

/// Starts, stops and tracks crawls of the configured sites
pub struct IndexingService {
    config: Arc<Config>,
    indexer: Indexer,
    client: Client,
    cache: Arc<SearchCache>,
    session: Mutex<Option<Arc<CrawlSession>>>,
}

impl IndexingService {
    /// Creates the service and its HTTP client
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built from the crawler settings.
    pub fn new(config: Arc<Config>, indexer: Indexer, cache: Arc<SearchCache>) -> Result<Self> {
        let client = build_http_client(&config.crawler)?;

        Ok(Self {
            config,
            indexer,
            client,
            cache,
            session: Mutex::new(None),
        })
    }

    /// Returns true while the current crawl session is running
    pub fn is_running(&self) -> bool {
        self.session_slot()
            .as_ref()
            .map(|session| session.is_running())
            .unwrap_or(false)
    }

    /// The most recently started session, if any
    pub fn current_session(&self) -> Option<Arc<CrawlSession>> {
        self.session_slot().clone()
    }

    /// Resets all configured sites and starts crawling them
    ///
    /// Existing data of every configured site is deleted and a fresh site row
    /// with status INDEXING is created before this returns. The crawl itself
    /// runs in background tasks; the returned handle may be awaited or
    /// dropped.
    ///
    /// # Errors
    ///
    /// `LexiError::Validation` if the previous session is still running or
    /// has sites that have not settled yet.
    pub fn start_indexing(&self) -> Result<CrawlHandle> {
        let mut slot = self.session_slot();
        if slot.as_ref().is_some_and(|session| session.is_busy()) {
            return Err(LexiError::Validation("Indexing is already running".to_string()));
        }

        let sites = self.reset_sites()?;
        for site in &sites {
            self.cache.invalidate_site(&site.url);
        }

        let session = Arc::new(CrawlSession::new(
            self.config.crawler.max_concurrent_fetches as usize,
        ));
        info!("Starting indexing of {} site(s)", sites.len());

        let mut tasks = Vec::with_capacity(sites.len());
        for site in sites {
            let crawl = SiteCrawl {
                site_id: site.id,
                site_url: site.url,
                config: self.config.clone(),
                indexer: self.indexer.clone(),
                client: self.client.clone(),
                session: session.clone(),
            };
            session.site_started();
            tasks.push(tokio::spawn(crawl.run()));
        }

        *slot = Some(session.clone());
        Ok(CrawlHandle { session, tasks })
    }

    /// Asks the running crawl to stop
    ///
    /// Fetches already in flight complete and their pages are kept; no new
    /// links are followed.
    ///
    /// # Errors
    ///
    /// `LexiError::Validation` if no crawl is running.
    pub fn stop_indexing(&self) -> Result<()> {
        match self.session_slot().as_ref() {
            Some(session) if session.stop() => {
                info!("Indexing stop requested");
                Ok(())
            }
            _ => Err(LexiError::Validation("Indexing is not running".to_string())),
        }
    }

    /// Fetches and (re-)indexes a single page in the background
    ///
    /// The URL must lie under a stored or configured site. A configured site
    /// without a stored row is created as INDEXED. The URL is normalized like
    /// a crawled link, so `/page/` updates the page stored as `/page`. Runs
    /// independently of any crawl session.
    ///
    /// # Errors
    ///
    /// `LexiError::Validation` for malformed URLs and URLs outside every site.
    pub fn index_page(&self, url: &str) -> Result<JoinHandle<()>> {
        let url = url.trim().to_string();
        parse_http_url(&url)
            .map_err(|e| LexiError::Validation(format!("Invalid URL {}: {}", url, e)))?;

        let site = self.resolve_site(&url)?;
        let url = normalize_link(&url, &site.url);
        let path = page_path(&url)?;

        let indexer = self.indexer.clone();
        let client = self.client.clone();
        let cache = self.cache.clone();

        info!("Indexing single page {}", url);
        Ok(tokio::spawn(async move {
            let page = match fetch_page(&client, &url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Could not index {}: {}", url, e);
                    return;
                }
            };

            let new_page = NewPage {
                site_id: site.id,
                path,
                code: page.status,
                content: page.body,
            };

            match tokio::task::spawn_blocking(move || indexer.upsert_page(new_page)).await {
                Ok(Ok((record, summary))) => {
                    cache.invalidate_site(&site.url);
                    info!(
                        "Indexed page {} of {}: {} lemma(s)",
                        record.path,
                        site.url,
                        summary.lemma_count()
                    );
                }
                Ok(Err(e)) => error!("Failed to index {}: {}", url, e),
                Err(e) => error!("Indexing task for {} failed: {}", url, e),
            }
        }))
    }

    /// Marks sites left INDEXING by a previous run as FAILED
    ///
    /// Returns the number of sites changed.
    pub fn recover_interrupted(&self) -> Result<usize> {
        let mut storage = storage::lock(self.indexer.storage())?;

        let interrupted: Vec<SiteRecord> = storage
            .list_sites()?
            .into_iter()
            .filter(|site| site.status == SiteStatus::Indexing)
            .collect();

        for site in &interrupted {
            warn!("Site {} was left indexing, marking it failed", site.url);
            storage.update_site_status(site.id, SiteStatus::Failed, Some(INTERRUPTED))?;
        }

        Ok(interrupted.len())
    }

    /// Deletes and recreates every configured site with status INDEXING
    fn reset_sites(&self) -> Result<Vec<SiteRecord>> {
        let mut storage = storage::lock(self.indexer.storage())?;
        let mut sites = Vec::with_capacity(self.config.sites.len());

        for entry in &self.config.sites {
            let reset = storage
                .delete_site_by_url(&entry.url)
                .and_then(|_| storage.insert_site(&entry.url, &entry.name, SiteStatus::Indexing));

            match reset {
                Ok(site) => sites.push(site),
                Err(e) => {
                    let message = e.to_string();
                    for site in &sites {
                        if let Err(e) =
                            storage.update_site_status(site.id, SiteStatus::Failed, Some(&message))
                        {
                            error!("Failed to mark {} as failed: {}", site.url, e);
                        }
                    }
                    return Err(e.into());
                }
            }
        }

        Ok(sites)
    }

    /// Finds the stored site owning `url`, creating it from configuration if needed
    fn resolve_site(&self, url: &str) -> Result<SiteRecord> {
        let mut storage = storage::lock(self.indexer.storage())?;

        if let Some(site) = storage
            .list_sites()?
            .into_iter()
            .find(|site| is_within_site(&site.url, url))
        {
            return Ok(site);
        }

        match self.config.site_for_url(url) {
            Some(entry) => {
                info!("Creating site {} for single page indexing", entry.url);
                Ok(storage.insert_site(&entry.url, &entry.name, SiteStatus::Indexed)?)
            }
            None => Err(LexiError::Validation(format!(
                "URL {} is outside the configured sites",
                url
            ))),
        }
    }

    // Only ever replaced whole, so a poisoned slot is still consistent
    fn session_slot(&self) -> MutexGuard<'_, Option<Arc<CrawlSession>>> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The site crawl tasks of one session
#[derive(Debug)]
pub struct CrawlHandle {
    session: Arc<CrawlSession>,
    tasks: Vec<JoinHandle<()>>,
}

impl CrawlHandle {
    pub fn session(&self) -> &Arc<CrawlSession> {
        &self.session
    }

    /// Waits until every site of the session has settled
    pub async fn wait(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                error!("Site crawl task failed: {}", e);
            }
        }
    }
}

/// Everything one site's crawl needs, cloned into each of its tasks
#[derive(Clone)]
struct SiteCrawl {
    site_id: i64,
    site_url: String,
    config: Arc<Config>,
    indexer: Indexer,
    client: Client,
    session: Arc<CrawlSession>,
}

impl SiteCrawl {
    /// Crawls the site and records its final status
    async fn run(self) {
        // A separate task turns panics anywhere in the crawl into a failed site
        let outcome = match tokio::spawn(self.clone().crawl()).await {
            Ok(outcome) => outcome,
            Err(e) => Err(LexiError::Task(e.to_string())),
        };

        if let Err(e) = self.settle(outcome) {
            error!("Failed to record final status of {}: {}", self.site_url, e);
        }
        self.session.site_finished();
    }

    /// Walks the link graph from the site root, one task per page
    async fn crawl(self) -> Result<()> {
        let mut visited = HashSet::new();
        let mut tasks = JoinSet::new();

        visited.insert(self.site_url.clone());
        tasks.spawn(self.clone().crawl_page(self.site_url.clone()));

        while let Some(joined) = tasks.join_next().await {
            let links = joined.map_err(|e| LexiError::Task(e.to_string()))?;

            for link in links {
                if !self.session.is_running() {
                    break;
                }
                if !visited.insert(link.clone()) {
                    continue;
                }
                if self.is_stored(&link)? {
                    continue;
                }
                tasks.spawn(self.clone().crawl_page(link));
            }
        }

        Ok(())
    }

    /// Fetches and stores one page, returning the links worth following
    async fn crawl_page(self, url: String) -> Vec<String> {
        let Some(_permit) = self.session.acquire().await else {
            return Vec::new();
        };
        if !self.session.is_running() {
            return Vec::new();
        }

        let path = match page_path(&url) {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping {}: {}", url, e);
                return Vec::new();
            }
        };

        let page = match fetch_page(&self.client, &url).await {
            Ok(page) => page,
            Err(LexiError::HttpStatus { status, .. }) => {
                debug!("{} answered {}, storing an empty page", url, status);
                self.ingest(url, path, status, String::new()).await;
                return Vec::new();
            }
            Err(e) => {
                warn!("Abandoning {}: {}", url, e);
                return Vec::new();
            }
        };

        let links = self.followable_links(&page);
        self.ingest(url, path, page.status, page.body).await;

        tokio::time::sleep(Duration::from_millis(
            self.config.crawler.politeness_delay_ms,
        ))
        .await;

        links
    }

    /// Extracts, normalizes and filters the links of a fetched page
    fn followable_links(&self, page: &FetchedPage) -> Vec<String> {
        let base = match ::url::Url::parse(&page.url) {
            Ok(base) => base,
            Err(e) => {
                warn!("Cannot resolve links of {}: {}", page.url, e);
                return Vec::new();
            }
        };

        extract_links(&page.body, &base)
            .iter()
            .map(|link| normalize_link(link, &self.site_url))
            .filter(|link| {
                is_crawlable(
                    &self.site_url,
                    link,
                    &self.config.crawler.excluded_extensions,
                )
            })
            .collect()
    }

    /// Stores and indexes a page off the async runtime
    async fn ingest(&self, url: String, path: String, code: u16, content: String) {
        let indexer = self.indexer.clone();
        let page = NewPage {
            site_id: self.site_id,
            path,
            code,
            content,
        };

        match tokio::task::spawn_blocking(move || indexer.add_page(page)).await {
            Ok(Ok(Some((record, summary)))) => debug!(
                "Stored {} ({}): {} lemma(s)",
                url,
                record.code,
                summary.lemma_count()
            ),
            Ok(Ok(None)) => debug!("{} was already stored", url),
            Ok(Err(e)) => error!("Failed to store {}: {}", url, e),
            Err(e) => error!("Storing {} panicked: {}", url, e),
        }
    }

    fn is_stored(&self, link: &str) -> Result<bool> {
        let Ok(path) = page_path(link) else {
            return Ok(true);
        };
        let storage = storage::lock(self.indexer.storage())?;
        Ok(storage.find_page(self.site_id, &path)?.is_some())
    }

    /// Records the site's final status and clears the running flag when no
    /// site is left INDEXING
    fn settle(&self, outcome: Result<()>) -> Result<()> {
        let mut storage = storage::lock(self.indexer.storage())?;

        match outcome {
            Ok(()) if self.session.is_running() => {
                storage.update_site_status(self.site_id, SiteStatus::Indexed, None)?;
                info!("Site {} indexed", self.site_url);
            }
            Ok(()) => {
                storage.update_site_status(self.site_id, SiteStatus::Failed, Some(STOPPED_BY_USER))?;
                info!("Site {} stopped", self.site_url);
            }
            Err(e) => {
                let message = e.to_string();
                storage.update_site_status(self.site_id, SiteStatus::Failed, Some(&message))?;
                error!("Site {} failed: {}", self.site_url, message);
            }
        }

        let any_indexing = storage
            .list_sites()?
            .iter()
            .any(|site| site.status == SiteStatus::Indexing);
        if !any_indexing && self.session.stop() {
            info!("All sites settled, indexing finished");
        }

        Ok(())
    }
}
