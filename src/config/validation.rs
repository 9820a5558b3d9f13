use crate::config::types::{
    BrowserConfig, Config, FetchConfig, InputConfig, OutputConfig, PolitenessConfig, SearchConfig,
};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Upper bound for keywords walked in parallel
const MAX_CONCURRENCY: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_search_config(&config.search)?;
    validate_fetch_config(&config.fetch)?;
    validate_politeness_config(&config.politeness)?;
    validate_browser_config(&config.browser)?;
    validate_input_config(&config.input)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates search configuration
fn validate_search_config(config: &SearchConfig) -> ConfigResult<()> {
    if config.results_per_keyword < 1 {
        return Err(ConfigError::Validation(
            "results_per_keyword must be >= 1".to_string(),
        ));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1".to_string(),
        ));
    }

    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::Validation(format!("Invalid base_url: {}", e)))?;
    if !matches!(base.scheme(), "http" | "https") || base.host_str().is_none() {
        return Err(ConfigError::Validation(format!(
            "base_url must be an http(s) URL with a host, got '{}'",
            config.base_url
        )));
    }

    if config.language.trim().is_empty() || config.region.trim().is_empty() {
        return Err(ConfigError::Validation(
            "language and region cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> ConfigResult<()> {
    if config.request_timeout_secs == 0 || config.article_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request and article timeouts must be > 0".to_string(),
        ));
    }

    if let Some(code) = config
        .retry_http_codes
        .iter()
        .find(|c| !(100..=599).contains(*c))
    {
        return Err(ConfigError::Validation(format!(
            "retry_http_codes contains invalid status {}",
            code
        )));
    }

    Ok(())
}

/// Validates politeness configuration
fn validate_politeness_config(config: &PolitenessConfig) -> ConfigResult<()> {
    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min_delay ({}ms) cannot exceed max_delay ({}ms)",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.start_delay_ms < config.min_delay_ms || config.start_delay_ms > config.max_delay_ms
    {
        return Err(ConfigError::Validation(format!(
            "start_delay ({}ms) must lie between min_delay ({}ms) and max_delay ({}ms)",
            config.start_delay_ms, config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.slow_response_ms == 0 {
        return Err(ConfigError::Validation(
            "slow_response must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates browser configuration
fn validate_browser_config(config: &BrowserConfig) -> ConfigResult<()> {
    if config.page_load_timeout_secs == 0 || config.wait_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "browser timeouts must be > 0".to_string(),
        ));
    }

    if config.challenge_poll_ms == 0 {
        return Err(ConfigError::Validation(
            "challenge_poll must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates input configuration
fn validate_input_config(config: &InputConfig) -> ConfigResult<()> {
    if config.keywords_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "keywords_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
