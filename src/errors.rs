use thiserror::Error;

/// Errors from building or configuring a [`crate::ProcessEngine`].
///
/// Process operations never surface these; the engine facade collapses
/// their failures to sentinels.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Process error: {0}")]
    Process(#[from] procctl_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub fn runtime(reason: impl Into<String>) -> Self {
        Self::Runtime(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let err: EngineError = anyhow::anyhow!("bad value").into();
        assert!(matches!(err, EngineError::Config(_)));
        assert_eq!(err.to_string(), "Configuration error: bad value");

        let err: EngineError = procctl_common::Error::unsupported("windows").into();
        assert!(matches!(err, EngineError::Process(_)));

        let err = EngineError::runtime("no threads");
        assert_eq!(err.to_string(), "Runtime error: no threads");
    }
}
