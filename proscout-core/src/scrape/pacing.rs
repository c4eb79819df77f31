use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::config::PacingSection;

/// Owns every randomized wait in the pipeline. The pacing is a deliberate
/// rate-limiting and fingerprinting-evasion policy, so it is configurable
/// rather than hard-coded at the call sites. Each wait reports the
/// milliseconds actually slept; a `[0, 0]` range sleeps nothing.
#[derive(Debug, Clone)]
pub struct DelayPolicy {
    pacing: PacingSection,
}

impl DelayPolicy {
    pub fn new(pacing: PacingSection) -> Self {
        Self { pacing }
    }

    /// Pause after opening the login page, before touching the form.
    pub async fn login_warmup(&self) -> u64 {
        Self::wait(self.pacing.login_warmup_ms).await
    }

    /// Human-like gap between typing the identifier and the secret.
    pub async fn credential_gap(&self) -> u64 {
        Self::wait(self.pacing.credential_gap_ms).await
    }

    /// Settle period after submitting the login form.
    pub async fn post_submit(&self) -> u64 {
        Self::wait(self.pacing.post_submit_ms).await
    }

    /// Rendering wait after a profile page navigation.
    pub async fn page_settle(&self) -> u64 {
        Self::wait(self.pacing.page_settle_ms).await
    }

    /// Pause after scrolling to the page midpoint.
    pub async fn post_scroll(&self) -> u64 {
        Self::wait(self.pacing.post_scroll_ms).await
    }

    /// Fixed pause after scrolling the about anchor into view.
    pub async fn about_reveal(&self) -> u64 {
        Self::wait(self.pacing.about_reveal_ms).await
    }

    /// Inter-request delay, applied before every target after the first.
    pub async fn between_profiles(&self) -> u64 {
        Self::wait(self.pacing.between_profiles_ms).await
    }

    async fn wait(range: [u64; 2]) -> u64 {
        if range[0] == 0 && range[1] == 0 {
            return 0;
        }
        let lower = range[0].min(range[1]);
        let upper = range[0].max(range[1]);
        let delay = {
            let mut rng = rand::thread_rng();
            rng.gen_range(lower..=upper)
        };
        sleep(Duration::from_millis(delay)).await;
        delay
    }
}
