use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::alliance::DEFAULT_SYNC_INTERVAL;
use crate::fetch::DEFAULT_MAX_CONCURRENT_FETCHES;
use crate::record::ColumnAliases;
use crate::scoring::{validate_scoring, ScoringRules};

fn default_timeout_secs() -> u64 {
    30
}

fn default_sync_interval() -> String {
    humantime::format_duration(DEFAULT_SYNC_INTERVAL).to_string()
}

fn default_max_concurrent_fetches() -> usize {
    DEFAULT_MAX_CONCURRENT_FETCHES
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL of the scouting server, e.g. http://localhost:5000
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub backend: BackendConfig,

    /// Our own team; the default for `recommend`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_number: Option<u32>,

    /// Local rule table. When absent the backend's game config is used,
    /// falling back to the built-in table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring: Option<ScoringRules>,

    /// Extra aliases per canonical metric; replaces the built-in list for that metric.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub column_aliases: BTreeMap<String, Vec<String>>,

    /// How often `alliance sync` polls, as a humantime string ("10s", "1m").
    #[serde(default = "default_sync_interval")]
    pub sync_interval: String,

    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

impl Config {
    pub fn new(url: &str) -> Self {
        Self {
            backend: BackendConfig {
                url: url.to_string(),
                timeout_secs: default_timeout_secs(),
            },
            team_number: None,
            scoring: None,
            column_aliases: BTreeMap::new(),
            sync_interval: default_sync_interval(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    pub fn sync_interval(&self) -> anyhow::Result<Duration> {
        humantime::parse_duration(self.sync_interval.trim())
            .map_err(|e| anyhow::anyhow!("Invalid sync_interval '{}': {}", self.sync_interval, e))
    }

    pub fn aliases(&self) -> ColumnAliases {
        let mut table: BTreeMap<String, Vec<String>> = ColumnAliases::default()
            .iter()
            .map(|(canonical, aliases)| (canonical.clone(), aliases.clone()))
            .collect();
        for (canonical, aliases) in &self.column_aliases {
            table.insert(canonical.clone(), aliases.clone());
        }
        ColumnAliases::new(table)
    }

    /// Validate the whole config, reporting every problem at once.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let url = self.backend.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!("backend.url: '{}' must start with http:// or https://", url));
        }
        if self.backend.timeout_secs == 0 {
            errors.push("backend.timeout_secs: must be at least 1".to_string());
        }
        if let Some(team) = self.team_number {
            if !(1..=9999).contains(&team) {
                errors.push(format!("team_number: {} is not a valid team number", team));
            }
        }
        match self.sync_interval() {
            Ok(d) if d.is_zero() => errors.push("sync_interval: must be greater than zero".to_string()),
            Ok(_) => {}
            Err(e) => errors.push(format!("sync_interval: {}", e)),
        }
        if self.max_concurrent_fetches == 0 {
            errors.push("max_concurrent_fetches: must be at least 1".to_string());
        }
        for (canonical, aliases) in &self.column_aliases {
            if aliases.iter().any(|a| a == canonical) {
                errors.push(format!("column_aliases.\"{}\": a metric cannot alias itself", canonical));
            }
        }
        if let Some(rules) = &self.scoring {
            if let Err(scoring_errors) = validate_scoring(rules) {
                errors.extend(scoring_errors);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
