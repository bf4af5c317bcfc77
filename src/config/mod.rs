use anyhow::{Context, Result};
use procctl_process::ShellConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub mod validation;

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Filter installed by `logging::init_from_config`
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Worker threads of the runtime that drains child pipes
    #[serde(default = "default_io_threads")]
    pub io_threads: usize,
    /// Interpreter for `execute` / `execute_async`
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub stdio: StdioConfig,
    /// Kill still-running async children when the engine is dropped
    #[serde(default = "default_enabled")]
    pub kill_on_drop: bool,
}

/// Standard-stream handling for executed children
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StdioConfig {
    #[serde(default = "default_buffer_limit")]
    pub buffer_limit: usize,
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,
    /// Merge stderr into the stdout buffer instead of inheriting it
    #[serde(default)]
    pub capture_stderr: bool,
    #[serde(
        default = "default_drain_timeout",
        with = "duration_serde"
    )]
    pub drain_timeout: Duration,
    #[serde(
        default = "default_stdin_write_timeout",
        with = "duration_serde"
    )]
    pub stdin_write_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            io_threads: default_io_threads(),
            shell: ShellConfig::default(),
            stdio: StdioConfig::default(),
            kill_on_drop: default_enabled(),
        }
    }
}

impl Default for StdioConfig {
    fn default() -> Self {
        Self {
            buffer_limit: default_buffer_limit(),
            read_chunk_size: default_read_chunk_size(),
            capture_stderr: false,
            drain_timeout: default_drain_timeout(),
            stdin_write_timeout: default_stdin_write_timeout(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::load_from_string(&content)
    }

    /// Load configuration from a YAML string
    pub fn load_from_string(content: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml::from_str(content)
            .context("Failed to parse YAML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_io_threads() -> usize {
    1
}

fn default_enabled() -> bool {
    true
}

fn default_buffer_limit() -> usize {
    procctl_stdio::DEFAULT_BUFFER_LIMIT
}

fn default_read_chunk_size() -> usize {
    procctl_stdio::DEFAULT_READ_CHUNK_SIZE
}

fn default_drain_timeout() -> Duration {
    Duration::from_millis(250)
}

fn default_stdin_write_timeout() -> Duration {
    Duration::from_secs(5)
}

// Custom serialization for Duration
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    // "ms" must be tested before "s".
    pub(super) fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        if let Some(num_str) = s.strip_suffix("ms") {
            let millis: u64 = num_str.trim().parse().map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_millis(millis))
        } else if let Some(num_str) = s.strip_suffix('s') {
            let secs: u64 = num_str.trim().parse().map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_secs(secs))
        } else {
            Err(format!("Duration must end with 's' or 'ms': {}", s))
        }
    }
}
