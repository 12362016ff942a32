/// Site status definitions for tracking indexing progress
///
/// A site moves to `Indexing` when a crawl of it starts, and ends up either
/// `Indexed` (crawl finished normally) or `Failed` (error or user stop).
use std::fmt;

/// Represents the current indexing state of a site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteStatus {
    /// A crawl of the site is in progress
    Indexing,

    /// The last crawl completed normally
    Indexed,

    /// The last crawl failed or was stopped by the user
    Failed,
}

impl SiteStatus {
    /// Returns true if this is a terminal state (no crawl in progress)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Indexing)
    }

    /// Returns true if the site can be searched
    pub fn is_searchable(&self) -> bool {
        matches!(self, Self::Indexed)
    }

    /// Converts the status to a database string representation
    ///
    /// The same string is reported by the statistics endpoint.
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Indexing => "INDEXING",
            Self::Indexed => "INDEXED",
            Self::Failed => "FAILED",
        }
    }

    /// Parses a status from a database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "INDEXING" => Some(Self::Indexing),
            "INDEXED" => Some(Self::Indexed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![Self::Indexing, Self::Indexed, Self::Failed]
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!SiteStatus::Indexing.is_terminal());
        assert!(SiteStatus::Indexed.is_terminal());
        assert!(SiteStatus::Failed.is_terminal());
    }

    #[test]
    fn test_is_searchable() {
        assert!(SiteStatus::Indexed.is_searchable());
        assert!(!SiteStatus::Indexing.is_searchable());
        assert!(!SiteStatus::Failed.is_searchable());
    }

    #[test]
    fn test_from_db_string() {
        assert_eq!(
            SiteStatus::from_db_string("INDEXING"),
            Some(SiteStatus::Indexing)
        );
        assert_eq!(
            SiteStatus::from_db_string("INDEXED"),
            Some(SiteStatus::Indexed)
        );
        assert_eq!(SiteStatus::from_db_string("FAILED"), Some(SiteStatus::Failed));
        assert_eq!(SiteStatus::from_db_string("indexed"), None);
    }

    #[test]
    fn test_roundtrip_db_string() {
        for status in SiteStatus::all_statuses() {
            let parsed = SiteStatus::from_db_string(status.to_db_string());
            assert_eq!(Some(status), parsed, "Failed roundtrip for {:?}", status);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", SiteStatus::Indexed), "INDEXED");
    }
}
