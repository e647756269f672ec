use thiserror::Error;

pub mod system;

pub use system::SystemClipboard;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard holds no text")]
    NoText,
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
}

/// Text access to the OS clipboard.
///
/// Implementations are owned by a single loop, so methods take `&mut self` and carry no
/// `Send`/`Sync` requirement.
pub trait ClipboardService {
    fn read_text(&mut self) -> Result<String, ClipboardError>;
    fn write_text(&mut self, content: &str) -> Result<(), ClipboardError>;
}
