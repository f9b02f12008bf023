//! Centralized path management for panemux.
//!
//! All application directories are lazily initialized and cached.
//! Use `set_*` functions before first access to override for testing.

use std::path::PathBuf;
use std::sync::OnceLock;

static CONFIG_DIR: OnceLock<PathBuf> = OnceLock::new();
static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();
static LOGS_DIR: OnceLock<PathBuf> = OnceLock::new();

/// ~/.config/panemux (or platform equivalent)
pub fn config_dir() -> &'static PathBuf {
    CONFIG_DIR.get_or_init(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("panemux")
    })
}

/// ~/Library/Application Support/panemux (or platform equivalent)
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("panemux")
    })
}

/// ~/Library/Logs/panemux (or platform equivalent)
pub fn logs_dir() -> &'static PathBuf {
    LOGS_DIR.get_or_init(|| {
        #[cfg(target_os = "macos")]
        {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Library")
                .join("Logs")
                .join("panemux")
        }
        #[cfg(not(target_os = "macos"))]
        {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("panemux")
                .join("logs")
        }
    })
}

/// Override config dir (must be called before first access). For testing.
pub fn set_config_dir(path: PathBuf) {
    let _ = CONFIG_DIR.set(path);
}

/// Override data dir (must be called before first access). For testing.
pub fn set_data_dir(path: PathBuf) {
    let _ = DATA_DIR.set(path);
}

/// Override logs dir (must be called before first access). For testing.
pub fn set_logs_dir(path: PathBuf) {
    let _ = LOGS_DIR.set(path);
}

/// Config file path: config_dir()/config.toml
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Persisted session topology: data_dir()/session.json
pub fn session_file() -> PathBuf {
    data_dir().join("session.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_dir_ends_with_panemux() {
        let dir = config_dir();
        assert!(
            dir.ends_with("panemux"),
            "config_dir should end with 'panemux': {:?}",
            dir
        );
    }

    #[test]
    fn config_file_is_toml() {
        let path = config_file();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("toml"));
    }

    #[test]
    fn session_file_is_json_in_data_dir() {
        let path = session_file();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));
        assert!(path.starts_with(data_dir()));
    }
}
