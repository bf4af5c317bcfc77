//! Tracing subscriber setup.
//!
//! The engine only emits `tracing` events. Binaries embedding it call
//! [`init_from_config`] once at startup, before building a
//! [`ProcessEngine`](crate::ProcessEngine), so the configured `log_level`
//! takes effect.

use tracing::info;

use crate::config::EngineConfig;
use crate::errors::{EngineError, EngineResult};

/// Install a global fmt subscriber.
///
/// `RUST_LOG` overrides `level` when set. Fails if a global subscriber is
/// already installed.
pub fn init_tracing(level: &str) -> EngineResult<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| EngineError::runtime(format!("failed to install tracing subscriber: {}", e)))?;

    info!("Tracing initialized with level: {}", level);
    Ok(())
}

/// Validate `config` and install a subscriber at its `log_level`.
pub fn init_from_config(config: &EngineConfig) -> EngineResult<()> {
    config.validate()?;
    init_tracing(&config.log_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_is_rejected() {
        // Whichever call installs first, the global slot is taken afterwards.
        let _ = init_from_config(&EngineConfig::default());

        let err = init_tracing("debug").unwrap_err();
        assert!(matches!(err, EngineError::Runtime(_)));
        assert!(err.to_string().contains("tracing subscriber"));

        assert!(matches!(
            init_from_config(&EngineConfig::default()),
            Err(EngineError::Runtime(_))
        ));
    }

    #[test]
    fn test_invalid_level_is_rejected_before_install() {
        let config = EngineConfig {
            log_level: "chatty".to_string(),
            ..EngineConfig::default()
        };

        assert!(matches!(init_from_config(&config), Err(EngineError::Config(_))));
    }
}
