//! Version command.

/// The current version of curator, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The line printed by `--version`.
pub fn version_line() -> String {
    format!("curator {}", VERSION)
}

/// Handle the --version command.
pub fn handle_version_command() {
    println!("{}", version_line());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_not_empty() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_version_line_names_binary() {
        let line = version_line();
        assert!(line.starts_with("curator "));
        // Version should be in semver format (e.g., "0.1.0")
        assert!(line.split('.').count() >= 2);
    }
}
