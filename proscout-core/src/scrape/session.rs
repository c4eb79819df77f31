use std::time::Duration;

use async_trait::async_trait;

use crate::browser::{BrowserResult, BrowserSession, SessionLauncher};

/// The page-level capabilities the scrape engine needs from a browser.
/// Production uses [`BrowserSession`]; tests substitute mocks.
#[async_trait(?Send)]
pub trait ProfileSession {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()>;
    async fn current_url(&mut self) -> BrowserResult<String>;
    async fn wait_for(&mut self, selector: &str, wait: Duration) -> BrowserResult<()>;
    async fn type_into(&mut self, selector: &str, text: &str) -> BrowserResult<()>;
    async fn click(&mut self, selector: &str) -> BrowserResult<()>;
    async fn text_of(&mut self, selector: &str) -> BrowserResult<Option<String>>;
    async fn texts_of(&mut self, selector: &str) -> BrowserResult<Vec<String>>;
    async fn scroll_into_view(&mut self, selector: &str) -> BrowserResult<()>;
    async fn execute(&mut self, script: &str) -> BrowserResult<serde_json::Value>;
    /// Must be idempotent; the orchestrator guarantees exactly one effective
    /// close per run but may call this again on teardown paths.
    async fn close(&mut self) -> BrowserResult<()>;
}

#[async_trait(?Send)]
pub trait SessionFactory: Send + Sync {
    async fn create(&self) -> BrowserResult<Box<dyn ProfileSession>>;
}

#[async_trait(?Send)]
impl ProfileSession for BrowserSession {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        BrowserSession::navigate(self, url).await
    }

    async fn current_url(&mut self) -> BrowserResult<String> {
        BrowserSession::current_url(self).await
    }

    async fn wait_for(&mut self, selector: &str, wait: Duration) -> BrowserResult<()> {
        BrowserSession::wait_for(self, selector, wait).await
    }

    async fn type_into(&mut self, selector: &str, text: &str) -> BrowserResult<()> {
        BrowserSession::type_into(self, selector, text).await
    }

    async fn click(&mut self, selector: &str) -> BrowserResult<()> {
        BrowserSession::click(self, selector).await
    }

    async fn text_of(&mut self, selector: &str) -> BrowserResult<Option<String>> {
        BrowserSession::text_of(self, selector).await
    }

    async fn texts_of(&mut self, selector: &str) -> BrowserResult<Vec<String>> {
        BrowserSession::texts_of(self, selector).await
    }

    async fn scroll_into_view(&mut self, selector: &str) -> BrowserResult<()> {
        BrowserSession::scroll_into_view(self, selector).await
    }

    async fn execute(&mut self, script: &str) -> BrowserResult<serde_json::Value> {
        BrowserSession::execute(self, script).await
    }

    async fn close(&mut self) -> BrowserResult<()> {
        BrowserSession::close(self).await
    }
}

/// Launches real Chromium sessions from the configured launcher.
pub struct LiveSessionFactory {
    launcher: SessionLauncher,
}

impl LiveSessionFactory {
    pub fn new(launcher: SessionLauncher) -> Self {
        Self { launcher }
    }
}

#[async_trait(?Send)]
impl SessionFactory for LiveSessionFactory {
    async fn create(&self) -> BrowserResult<Box<dyn ProfileSession>> {
        let session = self.launcher.launch().await?;
        Ok(Box::new(session))
    }
}
