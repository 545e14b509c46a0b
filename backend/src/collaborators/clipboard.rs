//! System clipboard access via arboard
//!
//! arboard is synchronous, so every call runs on the blocking pool.

use crate::collaborators::{Clipboard, ServiceError};
use async_trait::async_trait;

/// [`Clipboard`] backed by the OS clipboard
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl SystemClipboard {
    /// Create a clipboard handle
    pub fn new() -> Self {
        Self
    }
}

fn open() -> Result<arboard::Clipboard, ServiceError> {
    arboard::Clipboard::new().map_err(|e| ServiceError::Clipboard(e.to_string()))
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn read_text(&self) -> Result<Option<String>, ServiceError> {
        tokio::task::spawn_blocking(|| {
            let mut clipboard = open()?;
            match clipboard.get_text() {
                Ok(text) => Ok(Some(text)),
                Err(arboard::Error::ContentNotAvailable) => Ok(None),
                Err(e) => Err(ServiceError::Clipboard(e.to_string())),
            }
        })
        .await
        .map_err(|e| ServiceError::Clipboard(format!("Clipboard task failed: {}", e)))?
    }

    async fn write_text(&self, text: &str) -> Result<(), ServiceError> {
        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            let mut clipboard = open()?;
            clipboard
                .set_text(text)
                .map_err(|e| ServiceError::Clipboard(e.to_string()))
        })
        .await
        .map_err(|e| ServiceError::Clipboard(format!("Clipboard task failed: {}", e)))?
    }
}
