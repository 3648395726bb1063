use crate::config::types::{Config, FetcherConfig, SiteConfig, StorageConfig, ID_PLACEHOLDER};
use crate::encoding::lookup_label;
use crate::extract::Extractor;
use crate::sequence::{Cursor, IdScheme};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_storage_config(&config.storage)?;

    let mut seen = HashSet::new();
    for site in &config.sites {
        if !seen.insert(site.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate site id '{}'",
                site.id
            )));
        }
        validate_site(site)?;
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates a single site entry
fn validate_site(site: &SiteConfig) -> Result<(), ConfigError> {
    if site.id.trim().is_empty() {
        return Err(ConfigError::Validation("site id cannot be empty".to_string()));
    }

    validate_url_template(&site.id, "page-url", &site.page_url)?;
    if let Some(api_url) = &site.api_url {
        validate_url_template(&site.id, "api-url", api_url)?;
    }

    validate_scheme(&site.id, &site.scheme)?;

    let start = parse_boundary(site, "start-id", &site.start_id)?;
    if let Some(end_id) = &site.end_id {
        let end = parse_boundary(site, "end-id", end_id)?;
        if site.scheme.is_beyond(&start, &end, site.direction) {
            return Err(ConfigError::Validation(format!(
                "Site '{}': end-id '{}' lies before start-id '{}' for a {} crawl",
                site.id, end_id, site.start_id, site.direction
            )));
        }
    }

    if site.breaker_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "Site '{}': breaker-threshold must be >= 1",
            site.id
        )));
    }

    if let Some(label) = &site.encoding {
        if lookup_label(label).is_none() {
            return Err(ConfigError::Validation(format!(
                "Site '{}': unknown encoding '{}'",
                site.id, label
            )));
        }
    }

    if site.max_name_chars == 0 {
        return Err(ConfigError::Validation(format!(
            "Site '{}': max-name-chars must be >= 1",
            site.id
        )));
    }

    // Compiles every selector and pattern once
    Extractor::new(site)?;

    Ok(())
}

/// Validates a URL template containing the id placeholder
fn validate_url_template(site_id: &str, field: &str, template: &str) -> Result<(), ConfigError> {
    if !template.contains(ID_PLACEHOLDER) {
        return Err(ConfigError::InvalidUrl(format!(
            "Site '{}': {} must contain {}",
            site_id, field, ID_PLACEHOLDER
        )));
    }

    let url = Url::parse(&template.replace(ID_PLACEHOLDER, "0")).map_err(|e| {
        ConfigError::InvalidUrl(format!("Site '{}': invalid {}: {}", site_id, field, e))
    })?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "Site '{}': {} must use http or https",
            site_id, field
        )));
    }

    Ok(())
}

/// Validates the bounds of an identifier scheme
fn validate_scheme(site_id: &str, scheme: &IdScheme) -> Result<(), ConfigError> {
    match scheme {
        IdScheme::Numeric { min, max, .. } => {
            if min > max {
                return Err(ConfigError::InvalidScheme(format!(
                    "Site '{}': min {} is greater than max {}",
                    site_id, min, max
                )));
            }
        }
        IdScheme::Dated {
            max_per_date,
            earliest,
            latest,
            date_format,
            ..
        } => {
            if *max_per_date < 1 {
                return Err(ConfigError::InvalidScheme(format!(
                    "Site '{}': max-per-date must be >= 1",
                    site_id
                )));
            }
            if let Some(latest) = latest {
                if latest < earliest {
                    return Err(ConfigError::InvalidScheme(format!(
                        "Site '{}': latest {} is before earliest {}",
                        site_id, latest, earliest
                    )));
                }
            }
            if date_format.is_empty() {
                return Err(ConfigError::InvalidScheme(format!(
                    "Site '{}': date-format cannot be empty",
                    site_id
                )));
            }
        }
    }
    Ok(())
}

/// Parses a configured boundary identifier against the site's scheme
fn parse_boundary(site: &SiteConfig, field: &str, id: &str) -> Result<Cursor, ConfigError> {
    site.scheme
        .parse_strict(id)
        .map_err(|e| ConfigError::InvalidScheme(format!("Site '{}': {}: {}", site.id, field, e)))
}
