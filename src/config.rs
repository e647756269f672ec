use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const APP_NAME: &str = "ClipVault";
pub const MAIN_WINDOW: &str = "main";
pub const TRAY_ID: &str = "clipvault-tray";
pub const DATABASE_FILE: &str = "vault.sqlite3";
pub const HOTKEY_LABEL: &str = "Ctrl+Space";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_TOPMOST_PULSE: Duration = Duration::from_millis(50);

const DATA_DIR_ENV: &str = "CLIPVAULT_DATA_DIR";
const POLL_MS_ENV: &str = "CLIPVAULT_POLL_MS";
const PLACEMENT_ENV: &str = "CLIPVAULT_PLACEMENT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Leave the window where the window manager put it.
    Fixed,
    NearCursor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub poll_interval: Duration,
    pub topmost_pulse: Duration,
    pub placement: Placement,
    /// Replaces the platform app-data directory when set.
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            topmost_pulse: DEFAULT_TOPMOST_PULSE,
            placement: Placement::NearCursor,
            data_dir: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let poll_ms = std::env::var(POLL_MS_ENV).ok();
        let placement = std::env::var(PLACEMENT_ENV).ok();
        let data_dir = std::env::var_os(DATA_DIR_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Self {
            poll_interval: parse_poll_interval(poll_ms.as_deref()),
            placement: parse_placement(placement.as_deref()),
            data_dir,
            ..Self::default()
        }
    }
}

pub fn parse_poll_interval(raw: Option<&str>) -> Duration {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return DEFAULT_POLL_INTERVAL;
    };

    match raw.parse::<u64>() {
        Ok(ms) => Duration::from_millis(ms).max(MIN_POLL_INTERVAL),
        Err(err) => {
            warn!("ignoring {POLL_MS_ENV}={raw:?}: {err}");
            DEFAULT_POLL_INTERVAL
        }
    }
}

pub fn parse_placement(raw: Option<&str>) -> Placement {
    match raw.map(str::trim) {
        None | Some("") => Placement::NearCursor,
        Some(value) if value.eq_ignore_ascii_case("cursor") => Placement::NearCursor,
        Some(value) if value.eq_ignore_ascii_case("fixed") => Placement::Fixed,
        Some(value) => {
            warn!("ignoring {PLACEMENT_ENV}={value:?}, expected `cursor` or `fixed`");
            Placement::NearCursor
        }
    }
}
