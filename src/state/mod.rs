//! State module for tracking indexing progress
//!
//! # Components
//!
//! - `SiteStatus`: the per-site indexing state (indexing, indexed, failed)

mod site_status;

// Re-export main types
pub use site_status::SiteStatus;
