use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::auth::Authenticator;
use super::extract::ProfileExtractor;
use super::pacing::DelayPolicy;
use super::record::{Credentials, ProfileRecord, ProfileTarget, RecordStatus};
use super::session::{ProfileSession, SessionFactory};
use crate::config::ScraperConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    SessionStarting,
    Authenticating,
    Scraping,
    Completed,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    SessionStart(String),
    LoginFailed,
    SessionLost(String),
    Cancelled,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::SessionStart(detail) => write!(f, "session start failed: {detail}"),
            AbortReason::LoginFailed => f.write_str("login failed"),
            AbortReason::SessionLost(detail) => write!(f, "session lost: {detail}"),
            AbortReason::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    InProgress,
    Completed { succeeded: usize, failed: usize },
    Aborted(AbortReason),
}

/// Everything one orchestrator invocation produced. Partial record sets are
/// preserved on every abort path, so the caller can always export whatever
/// was scraped before things went wrong.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeRun {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub records: Vec<ProfileRecord>,
    pub outcome: RunOutcome,
}

impl ScrapeRun {
    pub fn begin() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            finished_at: None,
            records: Vec::new(),
            outcome: RunOutcome::InProgress,
        }
    }

    pub fn finish(&mut self, outcome: RunOutcome) {
        self.finished_at = Some(Utc::now());
        self.outcome = outcome;
    }

    pub fn succeeded(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.status.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.succeeded()
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.outcome, RunOutcome::Aborted(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Typed events pushed to observers. Emitted, never stored; any buffer
/// belongs to the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScrapeEvent {
    Progress {
        index: usize,
        total: usize,
        url: String,
        status: RecordStatus,
    },
    Log {
        level: LogLevel,
        message: String,
        timestamp: DateTime<Utc>,
    },
    Summary {
        total: usize,
        succeeded: usize,
        failed: usize,
    },
}

/// Push-only subscription point. Observers must not block: the orchestrator
/// calls them inline on its single thread of control.
pub trait ScrapeObserver: Send + Sync {
    fn on_event(&self, event: &ScrapeEvent);
}

#[derive(Debug, Default)]
struct CancelInner {
    flag: AtomicBool,
    notify: Notify,
}

/// Cooperative cancellation shared between the orchestrator and its caller.
/// Cancelling interrupts the run at the next suspension point. Cancellation
/// is permanent: a cancelled handle never resets, so an orchestrator whose
/// handle fired aborts any later `run()` immediately. Build a fresh
/// orchestrator for a fresh run.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    inner: Arc<CancelInner>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            let mut notified = std::pin::pin!(self.inner.notify.notified());
            // Register before the re-check so a cancel landing in between
            // cannot be missed.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Sequential state machine over one scrape run:
/// `Idle → SessionStarting → Authenticating → Scraping → Completed`, with
/// `Aborted` reachable from any non-idle state. Owns exactly one session for
/// the duration of the run and guarantees it is closed exactly once.
pub struct ScrapeOrchestrator {
    factory: Arc<dyn SessionFactory>,
    authenticator: Authenticator,
    extractor: ProfileExtractor,
    pacing: DelayPolicy,
    observers: Vec<Arc<dyn ScrapeObserver>>,
    cancel: CancelHandle,
    state: RunState,
}

impl ScrapeOrchestrator {
    pub fn new(factory: Arc<dyn SessionFactory>, config: &ScraperConfig) -> Self {
        let pacing = DelayPolicy::new(config.pacing.clone());
        let authenticator = Authenticator::new(
            config.site.clone(),
            config.selectors.clone(),
            config.timeouts.clone(),
            pacing.clone(),
        );
        let extractor = ProfileExtractor::new(
            config.selectors.clone(),
            config.timeouts.clone(),
            pacing.clone(),
        );
        Self {
            factory,
            authenticator,
            extractor,
            pacing,
            observers: Vec::new(),
            cancel: CancelHandle::default(),
            state: RunState::Idle,
        }
    }

    pub fn subscribe(&mut self, observer: Arc<dyn ScrapeObserver>) {
        self.observers.push(observer);
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub async fn run(&mut self, credentials: &Credentials, targets: &[ProfileTarget]) -> ScrapeRun {
        let mut run = ScrapeRun::begin();
        info!(run_id = %run.run_id, targets = targets.len(), "starting scrape run");

        self.state = RunState::SessionStarting;
        let mut session = match self.factory.create().await {
            Ok(session) => session,
            Err(err) => {
                error!(error = %err, "browser session could not be started");
                self.log(LogLevel::Error, format!("session start failed: {err}"));
                return self.abort(run, None, AbortReason::SessionStart(err.to_string()))
                    .await;
            }
        };

        self.state = RunState::Authenticating;
        if !self.authenticator.login(session.as_mut(), credentials).await {
            self.log(LogLevel::Error, "login failed".to_string());
            return self
                .abort(run, Some(&mut session), AbortReason::LoginFailed)
                .await;
        }
        self.log(LogLevel::Info, "login successful".to_string());

        self.state = RunState::Scraping;
        let total = targets.len();
        let cancel = self.cancel.clone();
        for (idx, target) in targets.iter().enumerate() {
            if cancel.is_cancelled() {
                self.log(LogLevel::Warn, "run cancelled".to_string());
                return self
                    .abort(run, Some(&mut session), AbortReason::Cancelled)
                    .await;
            }
            if idx > 0 {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        self.log(LogLevel::Warn, "run cancelled during pacing delay".to_string());
                        return self
                            .abort(run, Some(&mut session), AbortReason::Cancelled)
                            .await;
                    }
                    waited = self.pacing.between_profiles() => {
                        info!(delay_ms = waited, url = %target, "pacing before next profile");
                    }
                }
            }

            let extracted = tokio::select! {
                _ = cancel.cancelled() => {
                    self.log(LogLevel::Warn, "run cancelled during extraction".to_string());
                    return self
                        .abort(run, Some(&mut session), AbortReason::Cancelled)
                        .await;
                }
                result = self.extractor.extract(session.as_mut(), target.as_str()) => result,
            };

            match extracted {
                Ok(record) => {
                    let status = record.status.clone();
                    run.records.push(record);
                    self.emit(&ScrapeEvent::Progress {
                        index: idx + 1,
                        total,
                        url: target.as_str().to_string(),
                        status,
                    });
                }
                Err(err) => {
                    error!(url = %target, error = %err, "session lost during scrape");
                    self.log(LogLevel::Error, format!("session lost: {err}"));
                    return self
                        .abort(run, Some(&mut session), AbortReason::SessionLost(err.to_string()))
                        .await;
                }
            }
        }

        self.close_session(&mut session).await;
        self.state = RunState::Completed;
        let (succeeded, failed) = (run.succeeded(), run.failed());
        run.finish(RunOutcome::Completed { succeeded, failed });
        self.emit(&ScrapeEvent::Summary {
            total,
            succeeded,
            failed,
        });
        info!(
            run_id = %run.run_id,
            total,
            succeeded,
            failed,
            "scrape run completed"
        );
        run
    }

    /// Single abort path: teardown, preserve partial records, report.
    async fn abort(
        &mut self,
        mut run: ScrapeRun,
        session: Option<&mut Box<dyn ProfileSession>>,
        reason: AbortReason,
    ) -> ScrapeRun {
        if let Some(session) = session {
            self.close_session(session).await;
        }
        self.state = RunState::Aborted;
        warn!(run_id = %run.run_id, reason = %reason, records = run.records.len(), "scrape run aborted");
        let (succeeded, failed) = (run.succeeded(), run.failed());
        self.emit(&ScrapeEvent::Summary {
            total: run.records.len(),
            succeeded,
            failed,
        });
        run.finish(RunOutcome::Aborted(reason));
        run
    }

    async fn close_session(&self, session: &mut Box<dyn ProfileSession>) {
        if let Err(err) = session.close().await {
            warn!(error = %err, "session teardown reported an error");
        }
    }

    fn emit(&self, event: &ScrapeEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }

    fn log(&self, level: LogLevel, message: String) {
        self.emit(&ScrapeEvent::Log {
            level,
            message,
            timestamp: Utc::now(),
        });
    }
}
