use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

pub const CONFIG_FILENAME: &str = "nrcat.json";

/// On-disk configuration, every field optional.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub num_sims_to_crawl: Option<usize>,
    #[serde(default)]
    pub acceptable_scraping_fraction: Option<f64>,
    #[serde(default)]
    pub possible_res: Option<Vec<u32>>,
    #[serde(default)]
    pub max_id_in_name: Option<u8>,
    #[serde(default)]
    pub use_cache: Option<bool>,
    #[serde(default)]
    pub download: Option<bool>,
}

/// Resolved crawl configuration.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Upper bound of the identifier space to probe.
    pub num_sims_to_crawl: usize,
    /// Minimum completeness ratio before an existing snapshot is trusted.
    pub acceptable_scraping_fraction: f64,
    /// Resolution candidates, probed in reverse order (highest first).
    pub possible_res: Vec<u32>,
    /// Exclusive upper bound on the id digit probed per resolution.
    pub max_id_in_name: u8,
    /// Whether the disk tier is consulted before remote fetches.
    pub use_cache: bool,
    /// Opt-in for the full remote crawl when the cache is incomplete.
    pub download: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            num_sims_to_crawl: 2000,
            acceptable_scraping_fraction: 0.7,
            possible_res: vec![100, 120, 144],
            max_id_in_name: 6,
            use_cache: true,
            download: false,
        }
    }
}

impl CrawlConfig {
    /// Number of records a snapshot must hold before it is trusted.
    pub fn required_count(&self) -> usize {
        (self.acceptable_scraping_fraction * self.num_sims_to_crawl as f64).ceil() as usize
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Resolves the crawl configuration. An explicit path must exist; the
    /// default `nrcat.json` falls back to defaults when absent.
    pub fn resolve(path: Option<&str>) -> Result<CrawlConfig, CatalogError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(CONFIG_FILENAME),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(CrawlConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| CatalogError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| CatalogError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> CrawlConfig {
        let defaults = CrawlConfig::default();
        CrawlConfig {
            num_sims_to_crawl: config.num_sims_to_crawl.unwrap_or(defaults.num_sims_to_crawl),
            acceptable_scraping_fraction: config
                .acceptable_scraping_fraction
                .unwrap_or(defaults.acceptable_scraping_fraction),
            possible_res: config
                .possible_res
                .filter(|res| !res.is_empty())
                .unwrap_or(defaults.possible_res),
            max_id_in_name: config
                .max_id_in_name
                .filter(|max| *max > 0)
                .unwrap_or(defaults.max_id_in_name),
            use_cache: config.use_cache.unwrap_or(defaults.use_cache),
            download: config.download.unwrap_or(defaults.download),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_applied() {
        let resolved = ConfigLoader::resolve_config(Config::default());
        assert_eq!(resolved.num_sims_to_crawl, 2000);
        assert_eq!(resolved.acceptable_scraping_fraction, 0.7);
        assert_eq!(resolved.possible_res, vec![100, 120, 144]);
        assert!(resolved.use_cache);
        assert!(!resolved.download);
    }

    #[test]
    fn partial_file_overrides() {
        let config: Config =
            serde_json::from_str(r#"{"num_sims_to_crawl": 100, "possible_res": [100, 200]}"#)
                .unwrap();
        let resolved = ConfigLoader::resolve_config(config);
        assert_eq!(resolved.num_sims_to_crawl, 100);
        assert_eq!(resolved.possible_res, vec![100, 200]);
        assert_eq!(resolved.max_id_in_name, 6);
    }

    #[test]
    fn required_count_rounds_up() {
        let config = CrawlConfig {
            num_sims_to_crawl: 100,
            acceptable_scraping_fraction: 0.7,
            ..CrawlConfig::default()
        };
        assert_eq!(config.required_count(), 70);

        let config = CrawlConfig {
            num_sims_to_crawl: 3,
            acceptable_scraping_fraction: 0.5,
            ..CrawlConfig::default()
        };
        assert_eq!(config.required_count(), 2);
    }

    #[test]
    fn empty_resolution_list_falls_back() {
        let config: Config = serde_json::from_str(r#"{"possible_res": []}"#).unwrap();
        let resolved = ConfigLoader::resolve_config(config);
        assert_eq!(resolved.possible_res, vec![100, 120, 144]);
    }
}
