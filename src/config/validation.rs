use crate::config::types::{
    Config, CrawlerConfig, MorphologyConfig, SearchConfig, ServerConfig, SiteEntry,
    StorageConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use std::net::SocketAddr;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_server_config(&config.server)?;
    validate_storage_config(&config.storage)?;
    validate_crawler_config(&config.crawler)?;
    validate_search_config(&config.search)?;
    validate_morphology_config(&config.morphology)?;
    validate_sites(&config.sites)?;
    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config.bind_address.parse::<SocketAddr>().map_err(|e| {
        ConfigError::Validation(format!(
            "bind_address '{}' is not a valid socket address: {}",
            config.bind_address, e
        ))
    })?;
    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 100, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.politeness_delay_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "politeness_delay_ms must be <= 60000ms, got {}ms",
            config.politeness_delay_ms
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    for extension in &config.excluded_extensions {
        if extension.is_empty() || extension.contains('.') || extension.contains('/') {
            return Err(ConfigError::Validation(format!(
                "excluded extension '{}' must be a bare extension such as 'pdf'",
                extension
            )));
        }
    }

    Ok(())
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.snippet_length < 10 {
        return Err(ConfigError::Validation(format!(
            "snippet_length must be >= 10, got {}",
            config.snippet_length
        )));
    }
    Ok(())
}

fn validate_morphology_config(config: &MorphologyConfig) -> Result<(), ConfigError> {
    let overrides = [&config.russian_overrides, &config.english_overrides];
    if config.russian_dictionary.is_empty()
        || overrides.iter().any(|path| path.as_deref() == Some(""))
    {
        return Err(ConfigError::Validation(
            "dictionary paths cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates site entries: at least one, valid HTTP(S) URLs, unique
fn validate_sites(sites: &[SiteEntry]) -> Result<(), ConfigError> {
    if sites.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[sites]] entry is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for site in sites {
        if site.name.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Site '{}' must have a name",
                site.url
            )));
        }

        let url = Url::parse(&site.url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid site URL '{}': {}", site.url, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Site URL '{}' must use HTTP or HTTPS",
                site.url
            )));
        }

        if url.query().is_some() || url.fragment().is_some() {
            return Err(ConfigError::Validation(format!(
                "Site URL '{}' cannot contain a query or fragment",
                site.url
            )));
        }

        if !seen.insert(site.url.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Site URL '{}' is listed more than once",
                site.url
            )));
        }
    }

    Ok(())
}
