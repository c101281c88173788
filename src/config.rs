use serde::Deserialize;
use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::str::FromStr;

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

fn default_queue_capacity() -> usize {
    64
}

/// Thresholds used by the sheet cleaner.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CleaningConfig {
    /// Columns with a smaller share of non-missing cells are dropped.
    pub min_column_coverage: f64,
    /// Rows with a smaller share of non-missing cells (over kept columns) are dropped.
    pub min_row_signal: f64,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            min_column_coverage: 0.12,
            min_row_signal: 0.18,
        }
    }
}

/// Knobs for column typing, outlier capping and the feature preview.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ProfilingConfig {
    /// A column is numeric only if strictly more than this share parses as a number...
    pub numeric_share_threshold: f64,
    /// ...and it has strictly more than this many distinct non-missing values.
    pub min_distinct_numeric: usize,
    pub iqr_multiplier: f64,
    pub feature_preview_rows: usize,
}

impl Default for ProfilingConfig {
    fn default() -> Self {
        Self {
            numeric_share_threshold: 0.6,
            min_distinct_numeric: 3,
            iqr_multiplier: 1.5,
            feature_preview_rows: 25,
        }
    }
}

/// Row caps for the three request flavours.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LimitsConfig {
    pub preview_sample_rows: usize,
    pub preview_max_rows: usize,
    pub normalize_rows: usize,
    /// Default cap for frame-mode loads that don't specify one.
    pub frame_max_rows: usize,
    pub ml_default_rows: usize,
    pub ml_min_rows: usize,
    pub ml_max_rows: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            preview_sample_rows: 50,
            preview_max_rows: 50_000,
            normalize_rows: 10_000,
            frame_max_rows: 5_000,
            ml_default_rows: 2_000,
            ml_min_rows: 50,
            ml_max_rows: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PipelineConfig {
    pub cleaning: CleaningConfig,
    pub profiling: ProfilingConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_addr: SocketAddr,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        let bind_addr = env_or("SHEET_WORKER_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?;
        let max_file_size = env_or("MAX_FILE_SIZE", default_max_file_size())?;
        let queue_capacity = env_or("QUEUE_CAPACITY", default_queue_capacity())?;

        let mut pipeline = PipelineConfig::default();
        pipeline.cleaning.min_column_coverage =
            env_or("MIN_COLUMN_COVERAGE", pipeline.cleaning.min_column_coverage)?;
        pipeline.cleaning.min_row_signal =
            env_or("MIN_ROW_SIGNAL", pipeline.cleaning.min_row_signal)?;

        if queue_capacity == 0 {
            anyhow::bail!("QUEUE_CAPACITY must be at least 1");
        }

        Ok(Config {
            bind_addr,
            max_file_size,
            queue_capacity,
            pipeline,
        })
    }
}

pub fn load_config() -> Result<Config> {
    let config = Config::from_env()?;
    tracing::info!(
        "Loaded config: addr={}, max_file_size={}B, queue_capacity={}",
        config.bind_addr,
        config.max_file_size,
        config.queue_capacity
    );
    Ok(config)
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Failed to parse {}={:?}", key, raw)),
        Err(_) => Ok(default),
    }
}
