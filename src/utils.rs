// Utility functions and helpers

/// Whether `name` can be passed to the OS as an environment variable name.
pub fn is_valid_env_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('=') && !name.contains('\0')
}

/// Whether `value` can be passed to the OS as an environment variable value.
pub fn is_valid_env_value(value: &str) -> bool {
    !value.contains('\0')
}

/// Path rendered for the boundary; non-UTF-8 components are replaced.
pub fn path_to_string(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}
