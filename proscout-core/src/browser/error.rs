use thiserror::Error;

pub type BrowserResult<T> = Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("chromium launch failed: {0}")]
    Launch(String),
    #[error("cdp error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("page did not finish loading: {0}")]
    NavigationTimeout(String),
    #[error("timeout waiting for element {0}")]
    ElementTimeout(String),
    #[error("browser session lost: {0}")]
    SessionLost(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl BrowserError {
    /// Errors that end the whole run rather than a single field or profile.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BrowserError::Launch(_) | BrowserError::SessionLost(_))
    }
}

impl From<tokio::task::JoinError> for BrowserError {
    fn from(err: tokio::task::JoinError) -> Self {
        BrowserError::Unexpected(err.to_string())
    }
}
