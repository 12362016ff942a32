//! Integration tests for search and the HTTP API
//!
//! Pages are indexed straight into an in-memory database; the API tests serve
//! the router on an ephemeral port and talk to it with reqwest.

use lexicrawl::api::{router, AppState};
use lexicrawl::config::{Config, SiteEntry};
use lexicrawl::crawler::IndexingService;
use lexicrawl::indexer::Indexer;
use lexicrawl::lemmatizer::Lemmatizer;
use lexicrawl::morphology::{DictionaryMorphology, Language, Morphology};
use lexicrawl::search::{SearchCache, SearchEngine, SearchRequest};
use lexicrawl::state::SiteStatus;
use lexicrawl::storage::{self, into_shared, NewPage, SharedStorage, SqliteStorage, Storage};
use std::sync::Arc;

const SITE: &str = "https://pets.example";

struct TestIndex {
    storage: SharedStorage,
    lemmatizer: Arc<Lemmatizer>,
    indexer: Indexer,
    site_id: i64,
}

impl TestIndex {
    fn new() -> Self {
        let russian = DictionaryMorphology::parse(
            Language::Russian,
            "test-ru",
            "кошки\tкошка\tС жр мн им\nкошку\tкошка\tС жр ед вн\nи\tи\tСОЮЗ\n",
        )
        .expect("Failed to parse Russian dictionary");
        let english = DictionaryMorphology::parse(
            Language::English,
            "test-en",
            "the\tthe\tARTICLE\ncats\tcat\tVERB\ndogs\tdog\tVERB\n",
        )
        .expect("Failed to parse English dictionary");
        let languages: Vec<Box<dyn Morphology>> = vec![Box::new(russian), Box::new(english)];
        let lemmatizer = Arc::new(Lemmatizer::new(languages, ["СОЮЗ", "ARTICLE"]));

        let mut db = SqliteStorage::new_in_memory().expect("Failed to open storage");
        let site_id = db.insert_site(SITE, "Pets", SiteStatus::Indexed).unwrap().id;
        let storage = into_shared(db);

        Self {
            indexer: Indexer::new(lemmatizer.clone(), storage.clone()),
            storage,
            lemmatizer,
            site_id,
        }
    }

    fn add(&self, path: &str, body: &str) {
        self.add_to(self.site_id, path, body);
    }

    fn add_site(&self, url: &str, name: &str) -> i64 {
        storage::lock(&self.storage)
            .unwrap()
            .insert_site(url, name, SiteStatus::Indexed)
            .unwrap()
            .id
    }

    fn add_to(&self, site_id: i64, path: &str, body: &str) {
        self.indexer
            .add_page(NewPage {
                site_id,
                path: path.to_string(),
                code: 200,
                content: format!(
                    "<html><head><title>{}</title></head><body>{}</body></html>",
                    path, body
                ),
            })
            .unwrap()
            .expect("Page should be new");
    }

    fn engine(&self) -> SearchEngine {
        SearchEngine::new(
            self.storage.clone(),
            self.lemmatizer.clone(),
            Arc::new(SearchCache::new(60, 16)),
            200,
        )
    }
}

#[test]
fn test_candidates_start_from_rarest_lemma() {
    let index = TestIndex::new();

    // cat is on two pages, dog on fifty
    index.add("/cat-and-dog", "cats dogs");
    index.add("/cat-only", "cats");
    for i in 0..49 {
        index.add(&format!("/dog/{}", i), "dogs dogs");
    }

    let results = index.engine().search(&SearchRequest::new("cat dog")).unwrap();

    let uris: Vec<&str> = results.data.iter().map(|hit| hit.uri.as_str()).collect();
    assert_eq!(results.count, 2);
    assert_eq!(uris, vec!["/cat-and-dog", "/cat-only"]);
}

#[test]
fn test_large_candidate_set_is_intersected() {
    let index = TestIndex::new();

    // Five cat pages keep the candidate set above the threshold, so it is
    // narrowed to the pages that also mention dogs
    for i in 0..5 {
        index.add(&format!("/cat/{}", i), "cats");
    }
    index.add("/cat/5", "cats dogs");
    index.add("/cat/6", "cats dogs dogs");
    for i in 0..10 {
        index.add(&format!("/dog/{}", i), "dogs");
    }

    let results = index.engine().search(&SearchRequest::new("cat dog")).unwrap();

    let uris: Vec<&str> = results.data.iter().map(|hit| hit.uri.as_str()).collect();
    assert_eq!(uris, vec!["/cat/6", "/cat/5"]);
    assert_eq!(results.data[0].relevance, 1.0);
    assert!((results.data[1].relevance - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_relevance_bounds_and_order() {
    let index = TestIndex::new();
    index.add("/a", "cats");
    index.add("/b", "cats cats cats");
    index.add("/c", "cats cats");
    index.add("/d", "cats");

    let results = index.engine().search(&SearchRequest::new("cats")).unwrap();

    assert_eq!(results.count, 4);
    assert!(results
        .data
        .iter()
        .all(|hit| (0.0..=1.0).contains(&hit.relevance)));
    assert!(results.data.iter().any(|hit| hit.relevance == 1.0));

    let uris: Vec<&str> = results.data.iter().map(|hit| hit.uri.as_str()).collect();
    assert_eq!(uris, vec!["/b", "/c", "/a", "/d"]);
}

#[test]
fn test_relevance_normalized_across_all_searched_sites() {
    let index = TestIndex::new();
    let birds = index.add_site("https://birds.example", "Birds");

    index.add("/best", "cats cats cats cats");
    index.add_to(birds, "/top", "cats cats");
    index.add_to(birds, "/low", "cats");

    let results = index.engine().search(&SearchRequest::new("cats")).unwrap();

    let hits: Vec<(&str, &str, f64)> = results
        .data
        .iter()
        .map(|hit| (hit.site.as_str(), hit.uri.as_str(), hit.relevance))
        .collect();
    assert_eq!(
        hits,
        vec![
            (SITE, "/best", 1.0),
            ("https://birds.example", "/top", 0.5),
            ("https://birds.example", "/low", 0.25),
        ]
    );

    // Scoped to one site, its own best page is the maximum
    let scoped = SearchRequest::new("cats").with_site("https://birds.example");
    let results = index.engine().search(&scoped).unwrap();
    assert_eq!(results.count, 2);
    assert_eq!(results.data[0].uri, "/top");
    assert_eq!(results.data[0].relevance, 1.0);
    assert_eq!(results.data[1].relevance, 0.5);
}

#[test]
fn test_offset_beyond_total_returns_count_only() {
    let index = TestIndex::new();
    for i in 0..5 {
        index.add(&format!("/p{}", i), "cats");
    }

    let results = index
        .engine()
        .search(&SearchRequest::new("cat").with_page(100, 20))
        .unwrap();

    assert_eq!(results.count, 5);
    assert!(results.data.is_empty());
}

#[test]
fn test_russian_query_matches_inflected_forms() {
    let index = TestIndex::new();
    index.add("/ru", "Мы видели кошку и кошки спали");

    let results = index.engine().search(&SearchRequest::new("кошки")).unwrap();

    assert_eq!(results.count, 1);
    let hit = &results.data[0];
    assert_eq!(hit.title, "/ru");
    assert_eq!(hit.site_name, "Pets");
    assert_eq!(
        hit.snippet,
        "Мы видели <b>кошку</b> и <b>кошки</b> спали"
    );
}

#[test]
fn test_invalid_requests_rejected() {
    let index = TestIndex::new();
    index.add("/a", "cats");
    let engine = index.engine();

    assert!(engine.search(&SearchRequest::new("")).unwrap_err().is_validation());

    let unknown = SearchRequest::new("cats").with_site("https://unknown.example");
    assert!(engine.search(&unknown).unwrap_err().is_validation());

    storage::lock(&index.storage)
        .unwrap()
        .update_site_status(index.site_id, SiteStatus::Indexing, None)
        .unwrap();
    assert!(engine.search(&SearchRequest::new("cats")).unwrap_err().is_validation());
}

async fn json_body(response: reqwest::Response) -> serde_json::Value {
    let text = response.text().await.unwrap();
    serde_json::from_str(&text).expect("Response should be JSON")
}

async fn serve(index: &TestIndex) -> String {
    let config = Arc::new(Config {
        sites: vec![SiteEntry {
            url: SITE.to_string(),
            name: "Pets".to_string(),
        }],
        ..Config::default()
    });
    let cache = Arc::new(SearchCache::new(60, 16));

    let indexing = IndexingService::new(config.clone(), index.indexer.clone(), cache.clone())
        .expect("Failed to create indexing service");
    let search = SearchEngine::new(index.storage.clone(), index.lemmatizer.clone(), cache, 200);

    let app = router(Arc::new(AppState {
        config,
        storage: index.storage.clone(),
        indexing: Arc::new(indexing),
        search: Arc::new(search),
    }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_api_search_and_statistics() {
    let index = TestIndex::new();
    index.add("/a", "cats");
    index.add("/b", "cats cats");
    let base = serve(&index).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/search?query=cats&limit=1", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body = json_body(response).await;
    assert_eq!(body["result"], true);
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["uri"], "/b");
    assert_eq!(body["data"][0]["siteName"], "Pets");
    assert_eq!(body["data"][0]["site"], SITE);

    let response = client
        .get(format!("{}/api/statistics", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body = json_body(response).await;
    assert_eq!(body["result"], true);
    assert_eq!(body["statistics"]["total"]["pages"], 2);
    assert_eq!(body["statistics"]["total"]["indexing"], false);
    assert_eq!(body["statistics"]["detailed"][0]["status"], "INDEXED");
}

#[tokio::test]
async fn test_api_errors() {
    let index = TestIndex::new();
    let base = serve(&index).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/search?query=", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body = json_body(response).await;
    assert_eq!(body["result"], false);
    assert!(body["error"].as_str().unwrap().contains("empty"));

    let response = client
        .get(format!("{}/api/stopIndexing", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = client
        .post(format!("{}/api/indexPage?url=https://elsewhere.example/x", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body = json_body(response).await;
    assert_eq!(body["result"], false);
}
