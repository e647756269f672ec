//! Tauri-facing adapters: the real window, tray icon and global hotkey.

pub mod hotkey;
pub mod placement;
pub mod tray;
pub mod window;
