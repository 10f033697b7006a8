//! Clipboard bridge
//!
//! Copies the emulator selection to the system clipboard and reads text back
//! for paste. Failures are logged and otherwise ignored.

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard access failed: {0}")]
    Access(#[from] arboard::Error),
}

/// Text clipboard backend
pub trait ClipboardBackend {
    fn get_text(&mut self) -> Result<String, ClipboardError>;
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// System clipboard, opened on first use
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> Result<&mut arboard::Clipboard, ClipboardError> {
        if self.inner.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            self.inner = Some(clipboard);
        }
        self.inner
            .as_mut()
            .ok_or_else(|| ClipboardError::Unavailable("not initialized".to_string()))
    }
}

impl ClipboardBackend for SystemClipboard {
    fn get_text(&mut self) -> Result<String, ClipboardError> {
        Ok(self.handle()?.get_text()?)
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        Ok(self.handle()?.set_text(text)?)
    }
}

pub struct ClipboardBridge {
    backend: Box<dyn ClipboardBackend>,
}

impl ClipboardBridge {
    pub fn new(backend: Box<dyn ClipboardBackend>) -> Self {
        Self { backend }
    }

    pub fn system() -> Self {
        Self::new(Box::new(SystemClipboard::new()))
    }

    /// Write a selection to the clipboard. Empty or missing selections are
    /// left alone. Returns true when something was copied.
    pub fn copy(&mut self, selection: Option<String>) -> bool {
        let Some(text) = selection.filter(|t| !t.is_empty()) else {
            return false;
        };
        match self.backend.set_text(&text) {
            Ok(()) => {
                debug!("Copied {} bytes to clipboard", text.len());
                true
            }
            Err(e) => {
                warn!("Copy failed: {}", e);
                false
            }
        }
    }

    /// Read clipboard text for paste
    pub fn paste(&mut self) -> Option<String> {
        match self.backend.get_text() {
            Ok(text) if !text.is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                warn!("Paste failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// In-memory backend shared with the test body
    #[derive(Clone, Default)]
    pub(crate) struct MemoryClipboard {
        pub text: Rc<RefCell<Option<String>>>,
        pub broken: bool,
    }

    impl ClipboardBackend for MemoryClipboard {
        fn get_text(&mut self) -> Result<String, ClipboardError> {
            if self.broken {
                return Err(ClipboardError::Unavailable("broken".to_string()));
            }
            Ok(self.text.borrow().clone().unwrap_or_default())
        }

        fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.broken {
                return Err(ClipboardError::Unavailable("broken".to_string()));
            }
            *self.text.borrow_mut() = Some(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_copy_and_paste() {
        let memory = MemoryClipboard::default();
        let mut bridge = ClipboardBridge::new(Box::new(memory.clone()));

        assert!(bridge.copy(Some("ls -la".to_string())));
        assert_eq!(memory.text.borrow().as_deref(), Some("ls -la"));
        assert_eq!(bridge.paste(), Some("ls -la".to_string()));
    }

    #[test]
    fn test_empty_selection_is_not_copied() {
        let memory = MemoryClipboard::default();
        let mut bridge = ClipboardBridge::new(Box::new(memory.clone()));

        assert!(!bridge.copy(None));
        assert!(!bridge.copy(Some(String::new())));
        assert_eq!(*memory.text.borrow(), None);
        assert_eq!(bridge.paste(), None);
    }

    #[test]
    fn test_failures_degrade_to_noop() {
        let memory = MemoryClipboard {
            broken: true,
            ..Default::default()
        };
        let mut bridge = ClipboardBridge::new(Box::new(memory));
        assert!(!bridge.copy(Some("x".to_string())));
        assert_eq!(bridge.paste(), None);
    }
}
