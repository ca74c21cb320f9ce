//! Config file loading.
//!
//! One TOML file lists the monitored sources. Paths may carry a `{date}`
//! placeholder that resolves to the current day, matching chat exporters
//! that write one file per day per room.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use ledgertap_pipeline::{ResolvePolicy, RuleTable, SourceSpec, DEFAULT_CONTEXT_WINDOW};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// SQLite path; defaults to ~/.ledgertap/data/ledgertap.sqlite3
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,
}

/// Which rule table a source classifies with.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Broad table for opportunistic live monitoring
    #[default]
    Live,
    /// Exact-document-keyword table for review-gated imports
    Strict,
}

#[derive(Debug, Deserialize)]
pub struct SourceConfig {
    pub key: String,
    /// Transcript path; `{date}` expands to today (YYYY-MM-DD)
    pub path: String,
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub policy: ResolvePolicy,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_context_window() -> usize {
    DEFAULT_CONTEXT_WINDOW
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        let mut keys: Vec<&str> = config.sources.iter().map(|s| s.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        if keys.len() != config.sources.len() {
            bail!("Duplicate source keys in config - each source needs its own cursor");
        }

        Ok(config)
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| ledgertap_logging::data_dir().join("ledgertap.sqlite3"))
    }
}

impl SourceConfig {
    /// Materialize the spec for a given day, expanding `{date}`.
    pub fn to_spec(&self, today: NaiveDate) -> SourceSpec {
        let path = self
            .path
            .replace("{date}", &today.format("%Y-%m-%d").to_string());
        let rules = match self.profile {
            Profile::Live => RuleTable::live_monitor(),
            Profile::Strict => RuleTable::strict_import(),
        };
        let mut spec = SourceSpec::new(&self.key, path, rules).with_policy(self.policy);
        spec.context_window = self.context_window;
        spec
    }
}

/// Default config location: ~/.ledgertap/config.toml
pub fn default_config_path() -> PathBuf {
    ledgertap_logging::ledgertap_home().join("config.toml")
}

const STARTER_CONFIG: &str = r#"# Ledgertap configuration
#
# db_path = "/path/to/ledgertap.sqlite3"

[[source]]
key = "korea_room"
# {date} expands to today's date, for exporters writing one file per day
path = "/var/chatlogs/korea-room/{date}.txt"
profile = "live"          # live | strict
policy = "auto_create"    # auto_create | confirm
poll_interval_secs = 30
context_window = 5

# [[source]]
# key = "manual_import"
# path = "/var/imports/dump.txt"
# profile = "strict"
# policy = "confirm"
"#;

/// Write the starter config, refusing to clobber an existing file.
pub fn write_starter_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("Config already exists: {}", path.display());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, STARTER_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote starter config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn starter_config_parses() {
        let config: Config = toml::from_str(STARTER_CONFIG).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].key, "korea_room");
        assert_eq!(config.sources[0].profile, Profile::Live);
        assert_eq!(config.sources[0].policy, ResolvePolicy::AutoCreate);
    }

    #[test]
    fn date_placeholder_expands() {
        let source = SourceConfig {
            key: "korea_room".to_string(),
            path: "/logs/{date}.txt".to_string(),
            profile: Profile::Live,
            policy: ResolvePolicy::AutoCreate,
            poll_interval_secs: 30,
            context_window: 5,
        };
        let spec = source.to_spec(NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
        assert_eq!(spec.path, PathBuf::from("/logs/2025-01-10.txt"));
    }

    #[test]
    fn confirm_policy_parses_from_toml() {
        let raw = r#"
[[source]]
key = "import"
path = "/tmp/import.txt"
profile = "strict"
policy = "confirm"
"#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.sources[0].policy, ResolvePolicy::Confirm);
        assert_eq!(config.sources[0].poll_interval_secs, 30);
    }
}
