use arboard::Clipboard;
use tracing::debug;

use super::{ClipboardError, ClipboardService};

/// `arboard`-backed clipboard. The handle is created lazily and recreated after a failure, so a
/// clipboard that is unavailable at startup is picked up on a later poll.
#[derive(Default)]
pub struct SystemClipboard {
    handle: Option<Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> Result<&mut Clipboard, ClipboardError> {
        if self.handle.is_none() {
            let clipboard =
                Clipboard::new().map_err(|err| ClipboardError::Unavailable(err.to_string()))?;
            debug!("clipboard handle opened");
            self.handle = Some(clipboard);
        }
        self.handle
            .as_mut()
            .ok_or_else(|| ClipboardError::Unavailable("clipboard handle missing".to_string()))
    }

    fn map_error(&mut self, err: arboard::Error) -> ClipboardError {
        match err {
            arboard::Error::ContentNotAvailable => ClipboardError::NoText,
            other => {
                self.handle = None;
                ClipboardError::Unavailable(other.to_string())
            }
        }
    }
}

impl ClipboardService for SystemClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        let result = self.handle()?.get_text();
        result.map_err(|err| self.map_error(err))
    }

    fn write_text(&mut self, content: &str) -> Result<(), ClipboardError> {
        let result = self.handle()?.set_text(content.to_owned());
        result.map_err(|err| self.map_error(err))
    }
}
