pub mod browser;
pub mod config;
pub mod error;
pub mod scrape;

pub use browser::{BrowserError, BrowserResult, BrowserSession, SessionLauncher};
pub use config::{load_scraper_config, ScraperConfig};
pub use error::{ConfigError, Result};
pub use scrape::{
    Credentials, LiveSessionFactory, ProfileRecord, ProfileTarget, RecordStatus, ScrapeEvent,
    ScrapeObserver, ScrapeOrchestrator, ScrapeRun,
};
