use tracing::{debug, trace, warn};

use crate::clipboard::{ClipboardError, ClipboardService};
use crate::db::{ClipStore, InsertOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Clipboard could not be read as text; the cycle was skipped.
    Unreadable,
    Unchanged,
    /// A new clip was stored.
    Stored(String),
    AlreadyStored,
    Blank,
    /// The store failed; the same value is retried on the next cycle.
    StoreFailed,
}

/// Detects clipboard changes and feeds new text into the store.
///
/// Owns the last value it observed, so a tick that sees the same clipboard does nothing.
pub struct ClipboardPoller<C: ClipboardService> {
    clipboard: C,
    last_seen: String,
}

impl<C: ClipboardService> ClipboardPoller<C> {
    pub fn new(clipboard: C) -> Self {
        Self {
            clipboard,
            last_seen: String::new(),
        }
    }

    #[cfg(test)]
    pub fn last_seen(&self) -> &str {
        &self.last_seen
    }

    #[cfg(test)]
    pub fn clipboard_mut(&mut self) -> &mut C {
        &mut self.clipboard
    }

    pub fn poll(&mut self, store: &ClipStore) -> PollOutcome {
        let current = match self.clipboard.read_text() {
            Ok(text) => text,
            Err(err) => {
                trace!("clipboard read skipped: {err}");
                return PollOutcome::Unreadable;
            }
        };

        if current == self.last_seen {
            return PollOutcome::Unchanged;
        }

        match store.insert(&current) {
            Ok(outcome) if outcome.is_inserted() => {
                debug!(chars = current.chars().count(), "stored new clip");
                self.last_seen = current.clone();
                PollOutcome::Stored(current)
            }
            Ok(InsertOutcome::Blank) => {
                self.last_seen = current;
                PollOutcome::Blank
            }
            Ok(_) => {
                self.last_seen = current;
                PollOutcome::AlreadyStored
            }
            Err(err) => {
                warn!("clipboard ingestion failed: {err}");
                PollOutcome::StoreFailed
            }
        }
    }

    /// Puts `content` on the clipboard and marks it as seen so the next poll ignores it.
    pub fn copy(&mut self, content: &str) -> Result<(), ClipboardError> {
        self.clipboard.write_text(content)?;
        self.last_seen = content.to_string();
        Ok(())
    }
}
