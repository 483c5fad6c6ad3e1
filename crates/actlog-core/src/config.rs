//! Configuration types for actlog.
//!
//! [`Config::load`] layers, in order: the embedded defaults, a TOML file
//! (`--config PATH`, or `~/.config/actlog/config.toml`, created with the
//! defaults if it does not yet exist) and `ACTLOG__SECTION__KEY` environment
//! variables. [`Config::defaults`] returns the defaults without touching the
//! filesystem (useful in tests).

use crate::collector::CollectBudget;
use crate::types::StartPosition;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[collection]
max_duration_ms  = 30000
max_events       = 100000
start_position   = "earliest"
channel_capacity = 1024

[enrichment]
ignore_resource_id_case = false

[pipeline]
max_concurrent_subscriptions = 1

[sources]
events_dir    = "events"
directory_dir = "resources"
follow        = false
subscriptions = []

[report]
output_dir     = "reports"
name_prefix    = "ActivityLog_Report"
top_operations = 5
include_events = true
"#;

const ENV_PREFIX: &str = "ACTLOG";
const ENV_SEPARATOR: &str = "__";

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// `[collection]` section: the per-subscription ingestion budget.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionConfig {
    #[serde(default = "default_max_duration_ms")]
    pub max_duration_ms: u64,
    /// `0` disables the item limit; the duration still applies.
    #[serde(default = "default_max_events")]
    pub max_events: usize,
    #[serde(default)]
    pub start_position: StartPosition,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_max_duration_ms() -> u64 { 30_000 }
fn default_max_events() -> usize { 100_000 }
fn default_channel_capacity() -> usize { crate::collector::DEFAULT_CHANNEL_CAPACITY }

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            max_duration_ms: default_max_duration_ms(),
            max_events: default_max_events(),
            start_position: StartPosition::default(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl CollectionConfig {
    pub fn budget(&self) -> CollectBudget {
        CollectBudget::new(Duration::from_millis(self.max_duration_ms), self.max_events)
    }
}

/// `[enrichment]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrichmentConfig {
    /// Match resource ids regardless of ASCII case.
    #[serde(default)]
    pub ignore_resource_id_case: bool,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_max_concurrent_subscriptions")]
    pub max_concurrent_subscriptions: usize,
}

fn default_max_concurrent_subscriptions() -> usize { 1 }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_subscriptions: default_max_concurrent_subscriptions(),
        }
    }
}

/// `[sources]` section: where the file-backed collaborators read from.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_events_dir")]
    pub events_dir: PathBuf,
    #[serde(default = "default_directory_dir")]
    pub directory_dir: PathBuf,
    /// Keep streams open at end of file and wait for appended records.
    #[serde(default)]
    pub follow: bool,
    /// Explicit subscription ids. Empty means "discover from `events_dir`".
    #[serde(default)]
    pub subscriptions: Vec<String>,
}

fn default_events_dir() -> PathBuf { PathBuf::from("events") }
fn default_directory_dir() -> PathBuf { PathBuf::from("resources") }

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            events_dir: default_events_dir(),
            directory_dir: default_directory_dir(),
            follow: false,
            subscriptions: Vec::new(),
        }
    }
}

/// `[report]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    #[serde(default = "default_top_operations")]
    pub top_operations: usize,
    #[serde(default = "default_include_events")]
    pub include_events: bool,
}

fn default_output_dir() -> PathBuf { PathBuf::from("reports") }
fn default_name_prefix() -> String { "ActivityLog_Report".to_string() }
fn default_top_operations() -> usize { 5 }
fn default_include_events() -> bool { true }

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            name_prefix: default_name_prefix(),
            top_operations: default_top_operations(),
            include_events: default_include_events(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load the layered configuration. An explicit `path` must exist; without
    /// one the per-user file is used and created with defaults if missing.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => {
                let path = config_path();
                if !path.exists() {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, DEFAULT_CONFIG.trim_start())?;
                }
                config::File::from(path.as_path()).required(false)
            }
        };
        Self::build(Some(file), environment())
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }

    fn build(
        file: Option<config::File<config::FileSourceFile, config::FileFormat>>,
        env: config::Environment,
    ) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml));
        if let Some(file) = file {
            builder = builder.add_source(file);
        }
        let cfg: Config = builder.add_source(env).build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.collection.max_duration_ms > 0,
            "collection.max_duration_ms must be greater than zero"
        );
        anyhow::ensure!(
            self.pipeline.max_concurrent_subscriptions > 0,
            "pipeline.max_concurrent_subscriptions must be at least 1"
        );
        Ok(())
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("sources.subscriptions")
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("actlog")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
