//! Shell command construction.
//!
//! Commands are handed to the platform command interpreter untouched; this
//! module never parses or validates them.

use serde::{Deserialize, Serialize};
use std::process::Command;

use crate::platform::{Launch, Native};

/// The interpreter that runs command strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        default_shell()
    }
}

/// `/bin/sh -c` on Unix, `%ComSpec% /C` on Windows.
pub fn default_shell() -> ShellConfig {
    Native::default_shell()
}

/// Build a command that runs `command` through `shell`.
///
/// The returned command has default stdio; callers wire up pipes.
pub fn shell_command(shell: &ShellConfig, command: &str) -> Command {
    Native::shell_command(shell, command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shell_is_not_empty() {
        let shell = default_shell();
        assert!(!shell.program.is_empty());
        assert_eq!(shell.args.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_command_output() {
        let output = shell_command(&ShellConfig::default(), "echo hello | tr a-z A-Z")
            .output()
            .expect("shell should run");
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), "HELLO\n");
    }
}
