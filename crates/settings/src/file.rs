//! TOML config file support.
//!
//! Config location: `~/.config/panemux/config.toml`

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// User-facing config parsed from TOML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Shell to spawn in new panes. Defaults to `$SHELL`.
    pub shell: Option<String>,
    /// Windows: shell preference ("powershell", "pwsh", or "cmd").
    pub windows_shell: Option<String>,
    /// Value of `TERM` for spawned shells.
    pub term: String,
    /// Initial terminal width in columns.
    pub default_cols: u16,
    /// Initial terminal height in rows.
    pub default_rows: u16,
    /// Window (milliseconds) for coalescing resize requests to a process.
    pub resize_debounce_ms: u64,
    /// Restore the previous session's tabs and splits on startup.
    pub restore_session: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shell: None,
            windows_shell: None,
            term: crate::constants::terminal::TERM.to_string(),
            default_cols: crate::constants::terminal::DEFAULT_COLS,
            default_rows: crate::constants::terminal::DEFAULT_ROWS,
            resize_debounce_ms: crate::constants::timing::RESIZE_DEBOUNCE.as_millis() as u64,
            restore_session: true,
        }
    }
}

impl Config {
    /// Resolve the shell command for new panes.
    ///
    /// Priority: config `shell` → `$SHELL` → platform fallback.
    /// On Windows the `windows-shell` key wins over everything.
    pub fn resolve_shell(&self) -> String {
        #[cfg(target_os = "windows")]
        {
            if let Some(shell) = &self.windows_shell {
                return shell.clone();
            }
        }
        if let Some(shell) = &self.shell {
            return shell.clone();
        }
        std::env::var("SHELL")
            .unwrap_or_else(|_| crate::constants::process::FALLBACK_SHELL.to_string())
    }

    /// Resize debounce window as a `Duration`.
    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}

/// Default config file content with comments (generated on first launch).
const DEFAULT_CONFIG: &str = r#"# panemux Configuration

# Shell to spawn in new panes (defaults to $SHELL)
# shell = "/bin/zsh"

# Windows: shell — "powershell", "pwsh", or "cmd"
# windows-shell = "powershell"

# TERM environment variable for spawned shells
term = "xterm-256color"

# Initial terminal geometry
default-cols = 80
default-rows = 24

# Window (milliseconds) for coalescing rapid resize requests
resize-debounce-ms = 50

# Restore the previous session's tabs and splits on startup
restore-session = true
"#;

/// Return the config file path.
pub fn config_path() -> PathBuf {
    panemux_paths::config_file()
}

/// Ensure the config file exists, creating a default if missing.
/// Returns the path to the config file.
pub fn ensure_config_file() -> Option<PathBuf> {
    let path = config_path();
    if !path.exists() {
        let parent = path.parent()?;
        std::fs::create_dir_all(parent).ok()?;
        std::fs::write(&path, DEFAULT_CONFIG).ok()?;
        tracing::info!("Created default config at {:?}", path);
    }
    Some(path)
}

/// Load and parse the config file. Returns default on any error.
pub fn load_config() -> Config {
    let path = config_path();

    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to read config: {}", e);
            }
            return Config::default();
        }
    };

    // Size guard
    if content.len() > crate::constants::settings::MAX_FILE_SIZE as usize {
        tracing::warn!(
            "Config file too large ({} bytes), using defaults",
            content.len()
        );
        return Config::default();
    }

    match toml::from_str(&content) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!("Failed to parse config.toml: {}", e);
            Config::default()
        }
    }
}
