use std::time::Duration;

use tracing::{info, warn};

use crate::browser::BrowserResult;
use crate::config::{SelectorSection, SiteSection, TimeoutSection};

use super::pacing::DelayPolicy;
use super::record::Credentials;
use super::session::ProfileSession;

/// Drives the login flow. Login failure is an outcome, not an error: every
/// transport or timeout problem is logged and reported as `false` so the
/// caller can abort the run cleanly.
pub struct Authenticator {
    site: SiteSection,
    selectors: SelectorSection,
    timeouts: TimeoutSection,
    pacing: DelayPolicy,
}

impl Authenticator {
    pub fn new(
        site: SiteSection,
        selectors: SelectorSection,
        timeouts: TimeoutSection,
        pacing: DelayPolicy,
    ) -> Self {
        Self {
            site,
            selectors,
            timeouts,
            pacing,
        }
    }

    pub async fn login(
        &self,
        session: &mut dyn ProfileSession,
        credentials: &Credentials,
    ) -> bool {
        match self.try_login(session, credentials).await {
            Ok(confirmed) => confirmed,
            Err(err) => {
                warn!(error = %err, "login attempt failed");
                false
            }
        }
    }

    async fn try_login(
        &self,
        session: &mut dyn ProfileSession,
        credentials: &Credentials,
    ) -> BrowserResult<bool> {
        info!(url = %self.site.login_url, "opening login page");
        session.navigate(&self.site.login_url).await?;
        self.pacing.login_warmup().await;

        session
            .wait_for(
                &self.selectors.email_field,
                Duration::from_secs(self.timeouts.login_field_secs),
            )
            .await?;
        session
            .type_into(&self.selectors.email_field, &credentials.email)
            .await?;
        self.pacing.credential_gap().await;
        session
            .type_into(&self.selectors.password_field, &credentials.password)
            .await?;
        session.click(&self.selectors.submit_button).await?;
        self.pacing.post_submit().await;

        let landed = session.current_url().await?;
        let confirmed = self
            .site
            .authenticated_markers
            .iter()
            .any(|marker| landed.contains(marker.as_str()));
        if confirmed {
            info!("login confirmed");
        } else {
            // Covers bad credentials and redirects to verification pages.
            warn!(url = %landed, "login did not reach an authenticated area");
        }
        Ok(confirmed)
    }
}
