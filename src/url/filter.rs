/// Checks whether a normalized link should be followed while crawling a site
///
/// A link is followed only when it:
/// - uses an HTTP(S) scheme,
/// - lies under the site URL (the prefix must end at a path boundary),
/// - has no fragment and no query component,
/// - does not end with one of the excluded file extensions.
///
/// Whether the page was already stored is checked separately by the crawler.
///
/// # Arguments
///
/// * `site_url` - The normalized site URL (no trailing slash)
/// * `link` - The normalized link
/// * `excluded_extensions` - File extensions (without the dot) to skip
pub fn is_crawlable(site_url: &str, link: &str, excluded_extensions: &[String]) -> bool {
    if !link.starts_with("http") {
        return false;
    }

    if !is_within_site(site_url, link) {
        return false;
    }

    if link.contains('#') || link.contains('?') {
        return false;
    }

    !has_excluded_extension(link, excluded_extensions)
}

/// Returns true if `url` is the site URL itself or lies below it
pub fn is_within_site(site_url: &str, url: &str) -> bool {
    match url.strip_prefix(site_url) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Checks the extension of the last path segment, case-insensitively
fn has_excluded_extension(link: &str, excluded_extensions: &[String]) -> bool {
    let after_scheme = link.split_once("://").map(|(_, rest)| rest).unwrap_or(link);

    // The host alone never carries a file extension
    let Some((_, path)) = after_scheme.split_once('/') else {
        return false;
    };

    let last_segment = path.rsplit('/').next().unwrap_or(path);
    let Some((_, extension)) = last_segment.rsplit_once('.') else {
        return false;
    };

    excluded_extensions
        .iter()
        .any(|excluded| excluded.eq_ignore_ascii_case(extension))
}
