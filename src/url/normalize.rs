/// Characters that are percent-encoded in discovered links
const ENCODED_CHARS: &[(char, &str)] = &[
    (' ', "%20"),
    ('[', "%5B"),
    (']', "%5D"),
    ('{', "%7B"),
    ('}', "%7D"),
];

/// Normalizes a discovered link so it can be compared against a site URL
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Remove a single trailing slash
/// 3. If the site URL uses a `www.` host and the link does not, insert `www.`
///    right after the scheme separator
/// 4. Percent-encode spaces, square brackets and curly braces
///
/// # Arguments
///
/// * `link` - The absolute link as resolved from the page
/// * `site_url` - The URL of the site being crawled
///
/// # Examples
///
/// ```
/// use lexicrawl::url::normalize_link;
///
/// let link = normalize_link("https://example.com/a b/", "https://www.example.com");
/// assert_eq!(link, "https://www.example.com/a%20b");
/// ```
pub fn normalize_link(link: &str, site_url: &str) -> String {
    let trimmed = link.trim();
    let mut normalized = trimmed.strip_suffix('/').unwrap_or(trimmed).to_string();

    if site_url.contains("://www.") && !normalized.contains("://www.") {
        normalized = normalized.replacen("://", "://www.", 1);
    }

    let mut encoded = String::with_capacity(normalized.len());
    for c in normalized.chars() {
        match ENCODED_CHARS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => encoded.push_str(to),
            None => encoded.push(c),
        }
    }

    encoded
}

/// Normalizes a configured or stored site URL: trimmed, without trailing slashes
pub fn normalize_site_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
