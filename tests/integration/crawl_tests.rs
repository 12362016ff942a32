//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use lexicrawl::config::{Config, CrawlerConfig, SiteEntry};
use lexicrawl::crawler::{IndexingService, STOPPED_BY_USER};
use lexicrawl::indexer::Indexer;
use lexicrawl::lemmatizer::Lemmatizer;
use lexicrawl::morphology::{DictionaryMorphology, Language, Morphology};
use lexicrawl::search::SearchCache;
use lexicrawl::state::SiteStatus;
use lexicrawl::storage::{self, into_shared, SharedStorage, SqliteStorage, Storage};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the given sites
fn create_test_config(sites: &[&str]) -> Config {
    Config {
        crawler: CrawlerConfig {
            politeness_delay_ms: 10, // Very short for testing
            request_timeout_secs: 5,
            ..CrawlerConfig::default()
        },
        sites: sites
            .iter()
            .enumerate()
            .map(|(i, url)| SiteEntry {
                url: url.to_string(),
                name: format!("Site {}", i),
            })
            .collect(),
        ..Config::default()
    }
}

fn create_service(config: Config) -> (IndexingService, SharedStorage) {
    let english = DictionaryMorphology::parse(
        Language::English,
        "test",
        "the\tthe\tARTICLE\ncats\tcat\tVERB\ndogs\tdog\tVERB\nbirds\tbird\tVERB\n",
    )
    .expect("Failed to parse dictionary");
    let languages: Vec<Box<dyn Morphology>> = vec![Box::new(english)];
    let lemmatizer = Arc::new(Lemmatizer::new(languages, ["ARTICLE"]));

    let storage = into_shared(SqliteStorage::new_in_memory().expect("Failed to open storage"));
    let service = IndexingService::new(
        Arc::new(config),
        Indexer::new(lemmatizer, storage.clone()),
        Arc::new(SearchCache::new(60, 16)),
    )
    .expect("Failed to create indexing service");

    (service, storage)
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Test</title></head><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Home links to B and C, C links back home. Links that must not be
    // followed are mixed in.
    mount_page(
        &mock_server,
        "/",
        &format!(
            r#"<a href="/b">B</a>
            <a href="{base}/c/">C</a>
            <a href="/missing">Missing</a>
            <a href="/report.pdf">Report</a>
            <a href="/b?page=2">Query</a>
            <a href="/c#top">Fragment</a>
            <a href="https://other.example/x">Elsewhere</a>"#,
            base = base_url
        ),
    )
    .await;
    mount_page(&mock_server, "/b", "dogs and cats").await;
    mount_page(&mock_server, "/c", r#"cats <a href="/">Home</a>"#).await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    // Excluded extensions are never requested
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (service, storage) = create_service(create_test_config(&[&base_url]));

    let handle = service.start_indexing().expect("Failed to start indexing");
    assert!(service.is_running());
    handle.wait().await;

    assert!(!service.is_running());

    let storage = storage::lock(&storage).unwrap();
    let site = storage
        .find_site_by_url(&base_url)
        .unwrap()
        .expect("Site should exist");
    assert_eq!(site.status, SiteStatus::Indexed);
    assert!(site.last_error.is_none());

    // Home, B, C and the 404 page, each exactly once
    assert_eq!(storage.count_pages(Some(site.id)).unwrap(), 4);
    for page in ["/", "/b", "/c"] {
        let stored = storage.find_page(site.id, page).unwrap();
        assert_eq!(stored.map(|p| p.code), Some(200), "page {}", page);
    }

    let missing = storage.find_page(site.id, "/missing").unwrap().unwrap();
    assert_eq!(missing.code, 404);
    assert!(missing.content.is_empty());

    // cat is on B and C, dog only on B
    assert_eq!(storage.find_lemma(site.id, "cat").unwrap().unwrap().frequency, 2);
    assert_eq!(storage.find_lemma(site.id, "dog").unwrap().unwrap().frequency, 1);
    assert!(storage.find_lemma(site.id, "the").unwrap().is_none());
}

#[tokio::test]
async fn test_restart_replaces_site_data() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_page(&mock_server, "/", "cats").await;

    let (service, storage) = create_service(create_test_config(&[&base_url]));

    service.start_indexing().unwrap().wait().await;
    let first_id = storage::lock(&storage)
        .unwrap()
        .find_site_by_url(&base_url)
        .unwrap()
        .unwrap()
        .id;

    service.start_indexing().unwrap().wait().await;

    let storage = storage::lock(&storage).unwrap();
    let sites = storage.list_sites().unwrap();
    assert_eq!(sites.len(), 1);
    assert_ne!(sites[0].id, first_id);
    assert_eq!(sites[0].status, SiteStatus::Indexed);
    assert_eq!(storage.count_pages(None).unwrap(), 1);
    assert_eq!(storage.count_lemmas(None).unwrap(), 1);
}

#[tokio::test]
async fn test_stop_marks_all_sites_failed() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    for server in [&first, &second] {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                html(r#"<a href="/next">Next</a>"#).set_delay(Duration::from_millis(300)),
            )
            .mount(server)
            .await;

        // Never reached: the crawl is stopped before links are followed
        Mock::given(method("GET"))
            .and(path("/next"))
            .respond_with(html("dogs"))
            .expect(0)
            .mount(server)
            .await;
    }

    let first_url = first.uri();
    let second_url = second.uri();
    let (service, storage) = create_service(create_test_config(&[&first_url, &second_url]));

    let handle = service.start_indexing().unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    service.stop_indexing().expect("Stop should succeed while running");
    assert!(!service.is_running());
    assert!(service.stop_indexing().unwrap_err().is_validation());

    // Sites are still settling, so a new crawl cannot start yet
    assert!(service.start_indexing().unwrap_err().is_validation());

    handle.wait().await;

    {
        let storage = storage::lock(&storage).unwrap();
        for url in [&first_url, &second_url] {
            let site = storage.find_site_by_url(url).unwrap().unwrap();
            assert_eq!(site.status, SiteStatus::Failed, "site {}", url);
            assert_eq!(site.last_error.as_deref(), Some(STOPPED_BY_USER));

            // The fetch in flight when stopping completed and was kept
            assert_eq!(storage.count_pages(Some(site.id)).unwrap(), 1);
        }
    }

    assert!(!service.is_running());
    assert!(!service.current_session().unwrap().is_busy());
}

#[tokio::test]
async fn test_index_page_reindexes_without_bumping_frequency() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(html("dogs"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(html("dogs dogs birds"))
        .mount(&mock_server)
        .await;

    let (service, storage) = create_service(create_test_config(&[&base_url]));
    let url = format!("{}/article", base_url);

    service.index_page(&url).unwrap().await.unwrap();

    let (site_id, page_id) = {
        let storage = storage::lock(&storage).unwrap();
        let site = storage.find_site_by_url(&base_url).unwrap().unwrap();
        assert_eq!(site.status, SiteStatus::Indexed);

        let page = storage.find_page(site.id, "/article").unwrap().unwrap();
        assert_eq!(storage.find_lemma(site.id, "dog").unwrap().unwrap().frequency, 1);
        (site.id, page.id)
    };

    service.index_page(&url).unwrap().await.unwrap();

    let storage = storage::lock(&storage).unwrap();
    assert_eq!(storage.count_pages(Some(site_id)).unwrap(), 1);

    let dog = storage.find_lemma(site_id, "dog").unwrap().unwrap();
    let bird = storage.find_lemma(site_id, "bird").unwrap().unwrap();
    assert_eq!(dog.frequency, 1);
    assert_eq!(bird.frequency, 1);
    assert_eq!(
        storage.find_index(page_id, dog.id).unwrap().unwrap().ranking,
        2
    );
}

#[tokio::test]
async fn test_index_page_trailing_slash_updates_same_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_page(&mock_server, "/article", "dogs").await;

    let (service, storage) = create_service(create_test_config(&[&base_url]));

    service
        .index_page(&format!("{}/article", base_url))
        .unwrap()
        .await
        .unwrap();
    service
        .index_page(&format!("{}/article/", base_url))
        .unwrap()
        .await
        .unwrap();

    let storage = storage::lock(&storage).unwrap();
    let site = storage.find_site_by_url(&base_url).unwrap().unwrap();
    assert_eq!(storage.count_pages(Some(site.id)).unwrap(), 1);
    assert!(storage.find_page(site.id, "/article").unwrap().is_some());
    assert!(storage.find_page(site.id, "/article/").unwrap().is_none());
    assert_eq!(storage.find_lemma(site.id, "dog").unwrap().unwrap().frequency, 1);
}

#[tokio::test]
async fn test_index_page_http_error_stores_nothing() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&mock_server)
        .await;

    let (service, storage) = create_service(create_test_config(&[&base_url]));
    service
        .index_page(&format!("{}/gone", base_url))
        .unwrap()
        .await
        .unwrap();

    let storage = storage::lock(&storage).unwrap();
    assert_eq!(storage.count_pages(None).unwrap(), 0);
}

#[tokio::test]
async fn test_index_page_outside_sites_rejected() {
    let mock_server = MockServer::start().await;
    let (service, _storage) = create_service(create_test_config(&[&mock_server.uri()]));

    let err = service
        .index_page("https://unrelated.example/page")
        .unwrap_err();
    assert!(err.is_validation());
}
