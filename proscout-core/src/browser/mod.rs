mod automation;
mod error;
mod fingerprint;

pub use automation::{BrowserSession, SessionLauncher, ViewportSpec};
pub use error::{BrowserError, BrowserResult};
pub use fingerprint::FingerprintMasker;
