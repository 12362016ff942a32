use serde::Deserialize;

/// Main configuration structure for Lexicrawl
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub morphology: MorphologyConfig,
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
}

impl Config {
    /// Finds the configured site whose URL is a prefix of `url`
    pub fn site_for_url(&self, url: &str) -> Option<&SiteEntry> {
        self.sites
            .iter()
            .find(|site| crate::url::is_within_site(&site.url, url))
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the API server binds to
    #[serde(rename = "bind-address", default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Referer header sent with every request
    #[serde(default = "default_referrer")]
    pub referrer: String,

    /// Delay after each successful fetch (milliseconds)
    #[serde(rename = "politeness-delay-ms", default = "default_politeness_delay_ms")]
    pub politeness_delay_ms: u64,

    /// Maximum number of concurrent page fetches per crawl session
    #[serde(
        rename = "max-concurrent-fetches",
        default = "default_max_concurrent_fetches"
    )]
    pub max_concurrent_fetches: u32,

    /// Per-request timeout (seconds)
    #[serde(
        rename = "request-timeout-secs",
        default = "default_request_timeout_secs"
    )]
    pub request_timeout_secs: u64,

    /// File extensions (without the dot) whose links are never followed
    #[serde(
        rename = "excluded-extensions",
        default = "default_excluded_extensions"
    )]
    pub excluded_extensions: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            referrer: default_referrer(),
            politeness_delay_ms: default_politeness_delay_ms(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            request_timeout_secs: default_request_timeout_secs(),
            excluded_extensions: default_excluded_extensions(),
        }
    }
}

/// Search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Target snippet length in characters
    #[serde(rename = "snippet-length", default = "default_snippet_length")]
    pub snippet_length: usize,

    /// How long a cached result list stays valid (seconds)
    #[serde(rename = "cache-ttl-secs", default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached result lists; 0 disables the cache
    #[serde(rename = "cache-capacity", default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            snippet_length: default_snippet_length(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// Morphology dictionaries and word class filtering
#[derive(Debug, Clone, Deserialize)]
pub struct MorphologyConfig {
    /// Directory holding the compiled OpenCorpora dictionary for Russian
    #[serde(rename = "russian-dictionary", default = "default_russian_dictionary")]
    pub russian_dictionary: String,

    /// Optional `form<TAB>normal form<TAB>tags` file consulted before the
    /// Russian analyzer
    #[serde(rename = "russian-overrides", default)]
    pub russian_overrides: Option<String>,

    /// Optional override file for English; the built-in list of function
    /// words and irregular forms is used when unset
    #[serde(rename = "english-overrides", default)]
    pub english_overrides: Option<String>,

    /// Morphological tags whose words are dropped during lemmatization
    #[serde(rename = "excluded-tags", default = "default_excluded_tags")]
    pub excluded_tags: Vec<String>,
}

impl Default for MorphologyConfig {
    fn default() -> Self {
        Self {
            russian_dictionary: default_russian_dictionary(),
            russian_overrides: None,
            english_overrides: None,
            excluded_tags: default_excluded_tags(),
        }
    }
}

/// A site to crawl
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SiteEntry {
    /// Root URL of the site
    pub url: String,

    /// Human-readable site name
    pub name: String,
}

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_database_path() -> String {
    "./lexicrawl.db".to_string()
}

fn default_user_agent() -> String {
    "LexicrawlBot/1.0".to_string()
}

fn default_referrer() -> String {
    "http://www.google.com".to_string()
}

fn default_politeness_delay_ms() -> u64 {
    200
}

fn default_max_concurrent_fetches() -> u32 {
    8
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_snippet_length() -> usize {
    200
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_capacity() -> usize {
    256
}

fn default_russian_dictionary() -> String {
    rsmorphy_dict_ru::DICT_PATH.to_string()
}

/// Extensions of documents and media that are never crawled
pub fn default_excluded_extensions() -> Vec<String> {
    [
        "pdf", "txt", "djv", "djvu", "chm", "doc", "docx", "csv", "xls", "xlsx", "zip", "nc",
        "jpg", "ppt", "fig", "m", "png", "tiff", "bmp", "jpeg", "rar", "7z", "xml", "mp4", "gif",
        "ics", "sig", "pptx", "rtf", "dot",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Function-word classes dropped by the lemmatizer
///
/// Russian tags follow OpenCorpora: prepositions, conjunctions,
/// interjections, particles, pronoun-nouns, pronoun-adjectives (`Apro`) and
/// parenthetical words (`Prnt`). English tags come from the override
/// dictionary: particles, interjections, pronouns, articles and nouns.
pub fn default_excluded_tags() -> Vec<String> {
    [
        "PREP", "CONJ", "INTJ", "PRCL", "NPRO", "Apro", "Prnt", "PART", "INT", "PN", "PN_ADJ",
        "ARTICLE", "NOUN",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
