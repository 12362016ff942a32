//! Query ranking
//!
//! For every site in scope the query lemmas present on that site are ordered
//! rarest first. Candidate pages start as the pages of the rarest lemma and
//! are narrowed by intersecting with the pages of each following lemma, but
//! only while more than a handful of candidates remain. Each candidate scores
//! the sum of its rankings over the matched lemmas; scores are normalized by
//! the best score across all sites.

use crate::lemmatizer::Lemmatizer;
use crate::search::{build_snippet, RankedPage, SearchCache, SearchHit, SearchRequest, SearchResults};
use crate::storage::{self, LemmaRecord, SharedStorage, SiteRecord, SqliteStorage, Storage};
use crate::text::page_title;
use crate::url::normalize_site_url;
use crate::{LexiError, Result};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Candidate sets at or below this size are no longer intersected
pub const CANDIDATE_INTERSECTION_THRESHOLD: usize = 3;

/// Answers search requests from the stored index
pub struct SearchEngine {
    storage: SharedStorage,
    lemmatizer: Arc<Lemmatizer>,
    cache: Arc<SearchCache>,
    snippet_length: usize,
}

impl SearchEngine {
    pub fn new(
        storage: SharedStorage,
        lemmatizer: Arc<Lemmatizer>,
        cache: Arc<SearchCache>,
        snippet_length: usize,
    ) -> Self {
        Self {
            storage,
            lemmatizer,
            cache,
            snippet_length,
        }
    }

    pub fn cache(&self) -> &Arc<SearchCache> {
        &self.cache
    }

    /// Runs a search and returns one page of results
    ///
    /// # Errors
    ///
    /// `LexiError::Validation` for a blank query, for a site that is unknown
    /// or not indexed, and when no site is indexed at all.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(LexiError::Validation("Query must not be empty".to_string()));
        }

        let site_key = request.site.as_deref().map(normalize_site_url);
        let sites = self.resolve_scope(site_key.as_deref())?;

        let mut query_lemmas: Vec<String> = self.lemmatizer.lemmatize(query).into_keys().collect();
        query_lemmas.sort();

        let ranked = match self.cache.get(query, site_key.as_deref()) {
            Some(ranked) => {
                debug!("Search cache hit for '{}'", query);
                ranked
            }
            None => {
                let ranked = Arc::new(self.rank(&sites, &query_lemmas)?);
                self.cache.insert(query, site_key.as_deref(), ranked.clone());
                ranked
            }
        };

        let count = ranked.len();
        if request.offset >= count {
            return Ok(SearchResults {
                count,
                data: Vec::new(),
            });
        }

        let end = count.min(request.offset.saturating_add(request.limit));
        let data = ranked[request.offset..end]
            .iter()
            .map(|page| self.build_hit(page, &query_lemmas))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Search '{}' over {} site(s): {} result(s), returning {}",
            query,
            sites.len(),
            count,
            data.len()
        );

        Ok(SearchResults { count, data })
    }

    /// Resolves the sites a search runs over
    fn resolve_scope(&self, site_url: Option<&str>) -> Result<Vec<SiteRecord>> {
        let storage = storage::lock(&self.storage)?;

        match site_url {
            Some(url) => match storage.find_site_by_url(url)? {
                Some(site) if site.status.is_searchable() => Ok(vec![site]),
                Some(site) => Err(LexiError::Validation(format!(
                    "Site {} is not indexed (status {})",
                    url, site.status
                ))),
                None => Err(LexiError::Validation(format!("Site {} is not indexed", url))),
            },
            None => {
                let sites: Vec<SiteRecord> = storage
                    .list_sites()?
                    .into_iter()
                    .filter(|site| site.status.is_searchable())
                    .collect();

                if sites.is_empty() {
                    return Err(LexiError::Validation("No indexed sites available".to_string()));
                }
                Ok(sites)
            }
        }
    }

    /// Ranks matching pages across all sites, best first
    fn rank(&self, sites: &[SiteRecord], query_lemmas: &[String]) -> Result<Vec<RankedPage>> {
        let mut ranked = Vec::new();
        {
            let storage = storage::lock(&self.storage)?;
            for site in sites {
                ranked.extend(rank_site(&storage, site, query_lemmas)?);
            }
        }

        let max = ranked.iter().map(|page| page.relevance).fold(0.0_f64, f64::max);
        if max > 0.0 {
            for page in &mut ranked {
                page.relevance /= max;
            }
        }

        ranked.sort_by(|a, b| {
            b.relevance
                .total_cmp(&a.relevance)
                .then_with(|| a.path.cmp(&b.path))
                .then_with(|| a.site_url.cmp(&b.site_url))
        });

        Ok(ranked)
    }

    fn build_hit(&self, page: &RankedPage, query_lemmas: &[String]) -> Result<SearchHit> {
        let content = {
            let storage = storage::lock(&self.storage)?;
            storage.get_page(page.page_id)?.content
        };

        let text = self.lemmatizer.clear_text(&content);

        Ok(SearchHit {
            site: page.site_url.clone(),
            site_name: page.site_name.clone(),
            uri: page.path.clone(),
            title: page_title(&content),
            snippet: build_snippet(&text, query_lemmas, &self.lemmatizer, self.snippet_length),
            relevance: page.relevance,
        })
    }
}

/// Scores the candidate pages of one site with absolute relevance
fn rank_site(
    storage: &SqliteStorage,
    site: &SiteRecord,
    query_lemmas: &[String],
) -> Result<Vec<RankedPage>> {
    let mut matched: Vec<LemmaRecord> = query_lemmas
        .iter()
        .filter_map(|lemma| storage.find_lemma(site.id, lemma).transpose())
        .collect::<std::result::Result<_, _>>()?;

    if matched.is_empty() {
        return Ok(Vec::new());
    }

    matched.sort_by(|a, b| {
        a.frequency
            .cmp(&b.frequency)
            .then_with(|| a.lemma.cmp(&b.lemma))
    });

    let mut rankings: Vec<HashMap<i64, u32>> = Vec::with_capacity(matched.len());
    for lemma in &matched {
        let postings = storage.postings(lemma.id)?;
        rankings.push(postings.into_iter().map(|p| (p.page_id, p.ranking)).collect());
    }

    let page_sets: Vec<Vec<i64>> = rankings
        .iter()
        .map(|pages| pages.keys().copied().collect())
        .collect();
    let candidates = select_candidates(&page_sets, CANDIDATE_INTERSECTION_THRESHOLD);

    let mut ranked = Vec::with_capacity(candidates.len());
    for page_id in candidates {
        let relevance: u64 = rankings
            .iter()
            .map(|pages| u64::from(pages.get(&page_id).copied().unwrap_or(0)))
            .sum();
        let page = storage.get_page(page_id)?;

        ranked.push(RankedPage {
            site_id: site.id,
            site_url: site.url.clone(),
            site_name: site.name.clone(),
            page_id,
            path: page.path,
            relevance: relevance as f64,
        });
    }

    debug!(
        "Site {}: {} matched lemma(s), {} candidate page(s)",
        site.url,
        matched.len(),
        ranked.len()
    );

    Ok(ranked)
}

/// Narrows page sets given rarest first to the candidate pages
///
/// The first set is taken whole. Each following set is intersected in only
/// while the candidates number more than `threshold`, so the result is always
/// a subset of the first set. Returned IDs are sorted.
pub fn select_candidates(page_sets: &[Vec<i64>], threshold: usize) -> Vec<i64> {
    let Some((rarest, rest)) = page_sets.split_first() else {
        return Vec::new();
    };

    let mut candidates: BTreeSet<i64> = rarest.iter().copied().collect();
    for pages in rest {
        if candidates.len() > threshold {
            let pages: HashSet<i64> = pages.iter().copied().collect();
            candidates.retain(|id| pages.contains(id));
        }
    }

    candidates.into_iter().collect()
}
