//! Configuration module for Trawl
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, plus the plain-text keyword and whitelist files.
//!
//! # Example
//!
//! ```no_run
//! use trawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("trawl.toml")).unwrap();
//! println!("Walking at most {} pages per keyword", config.search.max_pages);
//! ```

mod lists;
mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, FetchConfig, InputConfig, OutputConfig, PolitenessConfig, SearchConfig,
};

// Re-export parser functions
pub use lists::{load_keywords, load_whitelist, parse_lines};
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
