//! Cross-Platform Path Utilities
//!
//! Functions for resolving application directories across platforms.
//! Handles ~/.remote-assistant/, the temp-dir log file and `~` expansion.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Default log file name inside the system temp directory
pub const LOG_FILE_NAME: &str = "remote-assistant.log";

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the application directory (~/.remote-assistant/)
pub fn app_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".remote-assistant"))
}

/// Get the config file path (~/.remote-assistant/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(app_dir()?.join("config.json"))
}

/// Default log file (<tmp>/remote-assistant.log)
pub fn default_log_path() -> PathBuf {
    std::env::temp_dir().join(LOG_FILE_NAME)
}

/// Starting directory for the session: the process working directory, or
/// the filesystem root when it cannot be read.
pub fn start_dir() -> PathBuf {
    start_dir_from(std::env::current_dir())
}

fn start_dir_from(current: std::io::Result<PathBuf>) -> PathBuf {
    current.unwrap_or_else(|e| {
        tracing::warn!("[Paths] working directory unavailable ({}), starting at /", e);
        PathBuf::from("/")
    })
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Expand a leading `~` to the home directory. Other paths are returned as-is.
pub fn expand_home(input: &str) -> PathBuf {
    let home = dirs::home_dir();
    match (input, home) {
        ("~", Some(home)) => home,
        (s, Some(home)) if s.starts_with("~/") => home.join(&s[2..]),
        (s, _) => PathBuf::from(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_dir() {
        if let Ok(dir) = app_dir() {
            assert!(dir.to_string_lossy().contains(".remote-assistant"));
        }
    }

    #[test]
    fn test_config_path() {
        if let Ok(path) = config_path() {
            assert!(path.ends_with(".remote-assistant/config.json"));
        }
    }

    #[test]
    fn test_default_log_path_in_temp_dir() {
        let path = default_log_path();
        assert!(path.starts_with(std::env::temp_dir()));
        assert!(path.ends_with(LOG_FILE_NAME));
    }

    #[test]
    fn test_start_dir_is_process_working_dir() {
        assert_eq!(start_dir(), std::env::current_dir().unwrap());
    }

    #[test]
    fn test_start_dir_falls_back_to_root() {
        let gone = std::io::Error::new(std::io::ErrorKind::NotFound, "deleted");
        assert_eq!(start_dir_from(Err(gone)), PathBuf::from("/"));
        assert_eq!(
            start_dir_from(Ok(PathBuf::from("/srv"))),
            PathBuf::from("/srv")
        );
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/etc/hosts"), PathBuf::from("/etc/hosts"));
        assert_eq!(expand_home("relative/dir"), PathBuf::from("relative/dir"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~"), home);
            assert_eq!(expand_home("~/Music"), home.join("Music"));
        }
    }

    #[test]
    fn test_ensure_dir_creates_nested() {
        let temp = tempfile::tempdir().unwrap();
        let nested = temp.path().join("a/b/c");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
