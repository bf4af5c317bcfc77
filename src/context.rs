//! Working directory and environment of the calling process.
//!
//! Both are process-wide OS state. [`ProcessContext`] is the engine's single
//! point of mutation, so writes go through `&mut self`. Children launched
//! afterwards inherit whatever is set here.

use procctl_common::{Error, Result, ResultExt};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::utils::{is_valid_env_name, is_valid_env_value};

#[derive(Debug, Default)]
pub struct ProcessContext {
    _private: (),
}

impl ProcessContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_dir(&self) -> Result<PathBuf> {
        Ok(std::env::current_dir()?)
    }

    pub fn set_current_dir(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::env::set_current_dir(path)
            .map_err(Error::from)
            .context(format!("chdir to {}", path.display()))?;
        debug!("Changed working directory to {}", path.display());
        Ok(())
    }

    /// Value of `name`, or `None` when unset or not valid Unicode.
    pub fn var(&self, name: &str) -> Option<String> {
        if !is_valid_env_name(name) {
            return None;
        }
        std::env::var(name).ok()
    }

    /// Whether `name` is set, even to an empty or non-Unicode value.
    pub fn var_exists(&self, name: &str) -> bool {
        is_valid_env_name(name) && std::env::var_os(name).is_some()
    }

    pub fn set_var(&mut self, name: &str, value: &str) -> Result<()> {
        if !is_valid_env_name(name) || !is_valid_env_value(value) {
            return Err(invalid_variable(name));
        }
        std::env::set_var(name, value);
        debug!("Set environment variable {}", name);
        Ok(())
    }

    /// Remove `name`. Removing an unset variable succeeds.
    pub fn remove_var(&mut self, name: &str) -> Result<()> {
        if !is_valid_env_name(name) {
            return Err(invalid_variable(name));
        }
        std::env::remove_var(name);
        debug!("Removed environment variable {}", name);
        Ok(())
    }

    pub fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }
}

fn invalid_variable(name: &str) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!("invalid environment variable '{}'", name.escape_debug()),
    ))
}
