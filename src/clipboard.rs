use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard is unavailable: {0}")]
    Unavailable(String),
    #[error("failed to read clipboard text: {0}")]
    Read(String),
    #[error("failed to write clipboard text: {0}")]
    Write(String),
}

pub type ClipboardResult<T> = std::result::Result<T, ClipboardError>;

pub trait ClipboardBackend {
    fn read_text(&mut self) -> ClipboardResult<String>;
    fn write_text(&mut self, text: &str) -> ClipboardResult<()>;
}

/// The platform clipboard. On X11/Wayland the selection is served by the
/// owning process, so the handle is kept alive for the app's lifetime.
#[derive(Default)]
pub struct SystemClipboard {
    #[cfg(not(windows))]
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(not(windows))]
    fn handle(&mut self) -> ClipboardResult<&mut arboard::Clipboard> {
        if self.inner.is_none() {
            let cb = arboard::Clipboard::new()
                .map_err(|err| ClipboardError::Unavailable(err.to_string()))?;
            self.inner = Some(cb);
        }
        self.inner
            .as_mut()
            .ok_or_else(|| ClipboardError::Unavailable("no clipboard handle".to_string()))
    }
}

#[cfg(windows)]
impl ClipboardBackend for SystemClipboard {
    fn read_text(&mut self) -> ClipboardResult<String> {
        clipboard_win::get_clipboard_string().map_err(|err| ClipboardError::Read(err.to_string()))
    }

    fn write_text(&mut self, text: &str) -> ClipboardResult<()> {
        clipboard_win::set_clipboard_string(text)
            .map_err(|err| ClipboardError::Write(err.to_string()))
    }
}

#[cfg(not(windows))]
impl ClipboardBackend for SystemClipboard {
    fn read_text(&mut self) -> ClipboardResult<String> {
        self.handle()?
            .get_text()
            .map_err(|err| ClipboardError::Read(err.to_string()))
    }

    fn write_text(&mut self, text: &str) -> ClipboardResult<()> {
        self.handle()?
            .set_text(text.to_owned())
            .map_err(|err| ClipboardError::Write(err.to_string()))
    }
}
