//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.kpicompare.toml` files.

use crate::analysis::density::DEFAULT_PADDING;
use crate::analysis::SkewnessEstimator;
use crate::models::{Language, ScoreField};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".kpicompare.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset settings.
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Statistics settings.
    #[serde(default)]
    pub statistics: StatisticsConfig,

    /// Narration service settings.
    #[serde(default)]
    pub narration: NarrationConfig,

    /// Position keyword rules.
    #[serde(default)]
    pub levels: LevelsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default report path. Reports go to stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Language of user-facing notices.
    #[serde(default)]
    pub language: Language,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Dataset ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Field delimiter of the CSV file.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Score field compared by default.
    #[serde(default)]
    pub score_field: ScoreField,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            score_field: ScoreField::default(),
        }
    }
}

fn default_delimiter() -> char {
    ','
}

impl DatasetConfig {
    /// The delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8> {
        if !self.delimiter.is_ascii() {
            bail!("CSV delimiter must be an ASCII character, got '{}'", self.delimiter);
        }
        Ok(self.delimiter as u8)
    }
}

/// Statistics and chart settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsConfig {
    /// Skewness estimator.
    #[serde(default)]
    pub skewness: SkewnessEstimator,

    /// Number of points sampled along density curves.
    #[serde(default = "default_density_points")]
    pub density_points: usize,

    /// Padding on both sides of the score range for density curves.
    #[serde(default = "default_density_padding")]
    pub density_padding: f64,

    /// Number of histogram bins.
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            skewness: SkewnessEstimator::default(),
            density_points: default_density_points(),
            density_padding: default_density_padding(),
            histogram_bins: default_histogram_bins(),
        }
    }
}

fn default_density_points() -> usize {
    200
}

fn default_density_padding() -> f64 {
    DEFAULT_PADDING
}

fn default_histogram_bins() -> usize {
    10
}

/// Narration service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationConfig {
    /// Request commentary from the narration service.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Number of attempts before giving up.
    #[serde(default = "default_retries")]
    pub retries: usize,

    /// Language the commentary is written in.
    #[serde(default)]
    pub language: Language,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: default_model(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
            retries: default_retries(),
            language: Language::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_timeout() -> u64 {
    120
}

fn default_retries() -> usize {
    3
}

/// Keyword lists used to classify position titles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelsConfig {
    #[serde(default = "default_executive_keywords")]
    pub executive: Vec<String>,

    #[serde(default = "default_manager_keywords")]
    pub manager: Vec<String>,

    #[serde(default = "default_supervisor_keywords")]
    pub supervisor: Vec<String>,
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            executive: default_executive_keywords(),
            manager: default_manager_keywords(),
            supervisor: default_supervisor_keywords(),
        }
    }
}

fn default_executive_keywords() -> Vec<String> {
    vec!["direktur", "director", "ceo", "chief", "komisaris"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_manager_keywords() -> Vec<String> {
    vec!["manager", "manajer", "kepala", "head", "vice president", "vp"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_supervisor_keywords() -> Vec<String> {
    vec!["supervisor", "team lead", "koordinator", "pengawas"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if args.verbose {
            self.general.verbose = true;
        }

        let Some(command) = args.command.as_ref() else {
            return;
        };

        if let Some(output) = command.output() {
            self.general.output = Some(output.display().to_string());
        }

        if let Some(chart) = command.chart() {
            if let Some(field) = chart.field {
                self.dataset.score_field = field;
            }
            if let Some(points) = chart.points {
                self.statistics.density_points = points;
            }
            if let Some(bins) = chart.bins {
                self.statistics.histogram_bins = bins;
            }
        }

        if let Some(skewness) = command.skewness() {
            self.statistics.skewness = skewness;
        }

        if let Some(narration) = command.narration() {
            if narration.no_narrate {
                self.narration.enabled = false;
            }
            if let Some(ref model) = narration.model {
                self.narration.model = model.clone();
            }
            if let Some(ref url) = narration.ollama_url {
                self.narration.ollama_url = url.clone();
            }
            if let Some(temperature) = narration.temperature {
                self.narration.temperature = temperature;
            }
            if let Some(timeout) = narration.timeout {
                self.narration.timeout_seconds = timeout;
            }
        }
    }

    /// Check that the merged settings are usable.
    pub fn validate(&self) -> Result<()> {
        self.dataset.delimiter_byte()?;

        let statistics = &self.statistics;
        if statistics.density_points < 2 {
            bail!(
                "statistics.density_points must be at least 2, got {}",
                statistics.density_points
            );
        }
        if !statistics.density_padding.is_finite() || statistics.density_padding < 0.0 {
            bail!(
                "statistics.density_padding must be a non-negative number, got {}",
                statistics.density_padding
            );
        }
        if statistics.histogram_bins == 0 {
            bail!("statistics.histogram_bins must be at least 1");
        }

        let narration = &self.narration;
        if !narration.ollama_url.starts_with("http://")
            && !narration.ollama_url.starts_with("https://")
        {
            bail!(
                "narration.ollama_url must start with 'http://' or 'https://', got '{}'",
                narration.ollama_url
            );
        }
        if !(0.0..=1.0).contains(&narration.temperature) {
            bail!(
                "narration.temperature must be between 0.0 and 1.0, got {}",
                narration.temperature
            );
        }
        if narration.timeout_seconds == 0 {
            bail!("narration.timeout_seconds must be at least 1");
        }
        if narration.retries == 0 {
            bail!("narration.retries must be at least 1");
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
