//! Centralized configuration constants for panemux.
//!
//! Compile-time defaults for terminal geometry, process handling, and
//! config-file validation, organized by component.

/// Terminal pane configuration.
pub mod terminal {
    /// Default terminal width in columns.
    pub const DEFAULT_COLS: u16 = 80;
    /// Default terminal height in rows.
    pub const DEFAULT_ROWS: u16 = 24;
    /// Minimum sane terminal dimension; smaller requests are clamped.
    pub const MIN_DIMENSION: u16 = 2;

    /// Value of the `TERM` environment variable for spawned shells.
    pub const TERM: &str = "xterm-256color";
}

/// Process / shell configuration.
pub mod process {
    /// Shell used when `$SHELL` is unset and no config override exists.
    #[cfg(not(target_os = "windows"))]
    pub const FALLBACK_SHELL: &str = "/bin/sh";

    /// Shell used on Windows when no config override exists.
    #[cfg(target_os = "windows")]
    pub const FALLBACK_SHELL: &str = "powershell";

    /// PTY read buffer size in bytes.
    pub const READ_BUFFER_SIZE: usize = 4096;
}

/// Timing configuration.
pub mod timing {
    use std::time::Duration;

    /// Default window for coalescing resize requests to a process.
    pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(50);
}

/// Settings file validation limits.
pub mod settings {
    /// Maximum settings file size in bytes (64 KB).
    /// Settings files should be tiny; anything larger is suspicious.
    pub const MAX_FILE_SIZE: u64 = 64 * 1024;
}

/// Session persistence limits.
pub mod persist {
    /// Maximum session snapshot size in bytes (1 MB).
    /// Even hundreds of panes serialize well under this.
    pub const MAX_FILE_SIZE: u64 = 1024 * 1024;
}

#[cfg(test)]
#[allow(clippy::assertions_on_constants)]
mod tests {
    use super::*;

    #[test]
    fn default_geometry_is_classic_80x24() {
        assert_eq!(terminal::DEFAULT_COLS, 80);
        assert_eq!(terminal::DEFAULT_ROWS, 24);
    }

    #[test]
    fn min_dimension_below_defaults() {
        assert!(terminal::MIN_DIMENSION < terminal::DEFAULT_COLS);
        assert!(terminal::MIN_DIMENSION < terminal::DEFAULT_ROWS);
    }

    #[test]
    fn resize_debounce_is_subsecond() {
        // A window longer than a second would make interactive resizes feel dead.
        assert!(timing::RESIZE_DEBOUNCE < std::time::Duration::from_secs(1));
    }

    #[test]
    fn snapshot_limit_exceeds_config_limit() {
        assert!(persist::MAX_FILE_SIZE > settings::MAX_FILE_SIZE);
    }
}
