use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::Config;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub search: Option<SearchConfig>,
    pub concurrency: Option<ConcurrencyConfig>,
    pub narrowing: Option<NarrowingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    pub api_base: Option<String>,
    pub max_hits: Option<u32>,
    pub record_format: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    pub num_workers: Option<usize>,
    pub http_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NarrowingConfig {
    pub narrow_divisor: Option<usize>,
    pub min_query_tokens: Option<usize>,
}

/// Platform config directory path: `<config_dir>/bibfetch/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("bibfetch").join("config.toml"))
}

/// Load config by cascading CWD `.bibfetch.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(&PathBuf::from(".bibfetch.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &PathBuf) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        search: Some(SearchConfig {
            api_base: overlay
                .search
                .as_ref()
                .and_then(|s| s.api_base.clone())
                .or_else(|| base.search.as_ref().and_then(|s| s.api_base.clone())),
            max_hits: overlay
                .search
                .as_ref()
                .and_then(|s| s.max_hits)
                .or_else(|| base.search.as_ref().and_then(|s| s.max_hits)),
            record_format: overlay
                .search
                .as_ref()
                .and_then(|s| s.record_format.clone())
                .or_else(|| base.search.as_ref().and_then(|s| s.record_format.clone())),
        }),
        concurrency: Some(ConcurrencyConfig {
            num_workers: overlay
                .concurrency
                .as_ref()
                .and_then(|c| c.num_workers)
                .or_else(|| base.concurrency.as_ref().and_then(|c| c.num_workers)),
            http_timeout_secs: overlay
                .concurrency
                .as_ref()
                .and_then(|c| c.http_timeout_secs)
                .or_else(|| base.concurrency.as_ref().and_then(|c| c.http_timeout_secs)),
            max_retries: overlay
                .concurrency
                .as_ref()
                .and_then(|c| c.max_retries)
                .or_else(|| base.concurrency.as_ref().and_then(|c| c.max_retries)),
        }),
        narrowing: Some(NarrowingConfig {
            narrow_divisor: overlay
                .narrowing
                .as_ref()
                .and_then(|n| n.narrow_divisor)
                .or_else(|| base.narrowing.as_ref().and_then(|n| n.narrow_divisor)),
            min_query_tokens: overlay
                .narrowing
                .as_ref()
                .and_then(|n| n.min_query_tokens)
                .or_else(|| base.narrowing.as_ref().and_then(|n| n.min_query_tokens)),
        }),
    }
}

impl ConfigFile {
    /// Overlay this file's values onto a runtime [`Config`].
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(search) = &self.search {
            if let Some(api_base) = &search.api_base {
                config.api_base = api_base.clone();
            }
            if let Some(max_hits) = search.max_hits {
                config.max_hits = max_hits;
            }
            if let Some(record_format) = &search.record_format {
                config.record_format = record_format.clone();
            }
        }
        if let Some(concurrency) = &self.concurrency {
            if let Some(num_workers) = concurrency.num_workers {
                config.num_workers = num_workers;
            }
            if let Some(http_timeout_secs) = concurrency.http_timeout_secs {
                config.http_timeout_secs = http_timeout_secs;
            }
            if let Some(max_retries) = concurrency.max_retries {
                config.max_retries = max_retries;
            }
        }
        if let Some(narrowing) = &self.narrowing {
            if let Some(narrow_divisor) = narrowing.narrow_divisor {
                config.narrow_divisor = narrow_divisor;
            }
            if let Some(min_query_tokens) = narrowing.min_query_tokens {
                config.min_query_tokens = min_query_tokens;
            }
        }
    }
}
