//! URL handling module for Trawl
//!
//! This module provides relative URL resolution, scheme+host extraction,
//! whitelist matching with subdomain awareness, and unwrapping of the
//! redirect links search engines put in their result listings.

mod domain;
mod matcher;
mod redirect;
mod resolve;

// Re-export main functions
pub use domain::{base_domain, extract_host, strip_www};
pub use matcher::{domain_matches_whitelist, host_matches_entry};
pub use redirect::{is_http_url, parse_http_url, unwrap_redirect};
pub use resolve::resolve;
