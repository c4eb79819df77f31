mod auth;
mod extract;
mod orchestrator;
mod pacing;
mod record;
mod session;
mod targets;

pub use auth::Authenticator;
pub use extract::{select_heading, truncate_chars, ProfileExtractor};
pub use orchestrator::{
    AbortReason, CancelHandle, LogLevel, RunOutcome, RunState, ScrapeEvent, ScrapeObserver,
    ScrapeOrchestrator, ScrapeRun,
};
pub use pacing::DelayPolicy;
pub use record::{Credentials, ProfileRecord, ProfileTarget, RecordStatus};
pub use session::{LiveSessionFactory, ProfileSession, SessionFactory};
pub use targets::{load_targets_file, parse_target_lines};
