use super::*;
use anyhow::{anyhow, Result};

/// Validate the complete configuration
pub fn validate_config(config: &EngineConfig) -> Result<()> {
    validate_log_level(&config.log_level)?;

    if config.io_threads == 0 {
        return Err(anyhow!("io_threads must be greater than 0"));
    }

    if config.shell.program.trim().is_empty() {
        return Err(anyhow!("Shell program cannot be empty"));
    }

    validate_stdio_config(&config.stdio)
}

fn validate_log_level(level: &str) -> Result<()> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(anyhow!("Invalid log level: {}, must be one of: trace, debug, info, warn, error", level))
    }
}

/// Validate stdio configuration
fn validate_stdio_config(stdio: &StdioConfig) -> Result<()> {
    if stdio.read_chunk_size == 0 {
        return Err(anyhow!("Read chunk size must be greater than 0"));
    }

    if stdio.read_chunk_size > 1024 * 1024 {
        return Err(anyhow!("Read chunk size too large (max 1 MiB): {}", stdio.read_chunk_size));
    }

    if stdio.stdin_write_timeout.is_zero() {
        return Err(anyhow!("Stdin write timeout must be greater than 0"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_log_level() {
        let mut config = EngineConfig::default();
        assert!(validate_config(&config).is_ok());

        config.log_level = "WARN".to_string();
        assert!(validate_config(&config).is_ok());

        config.log_level = "verbose".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_stdio() {
        let mut config = EngineConfig::default();

        // A zero buffer limit is allowed: nothing is retained
        config.stdio.buffer_limit = 0;
        assert!(validate_config(&config).is_ok());

        config.stdio.read_chunk_size = 0;
        assert!(validate_config(&config).is_err());

        config.stdio.read_chunk_size = 8192;
        config.stdio.stdin_write_timeout = Duration::ZERO;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_runtime() {
        let mut config = EngineConfig::default();
        config.io_threads = 0;
        assert!(validate_config(&config).is_err());

        config.io_threads = 1;
        config.shell.program = " ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        assert!(EngineConfig::load_from_string("stdio: [not, a, map]").is_err());
        assert!(EngineConfig::load_from_string("stdio:\n  drain_timeout: soon\n").is_err());
    }
}
