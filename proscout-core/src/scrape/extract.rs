use std::time::Duration;

use tracing::{debug, info, warn};

use crate::browser::{BrowserError, BrowserResult};
use crate::config::{SelectorSection, TimeoutSection};

use super::pacing::DelayPolicy;
use super::record::{ProfileRecord, RecordStatus};
use super::session::ProfileSession;

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 100;
const ABOUT_MAX_CHARS: usize = 500;

const SCROLL_MIDPOINT_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight / 2);";

/// Extracts the four profile fields from one loaded page. Field extraction
/// steps are independent: the target site's markup shifts per-field, so a
/// broken locator degrades that field to empty instead of failing the
/// profile. Only session-fatal errors propagate.
pub struct ProfileExtractor {
    selectors: SelectorSection,
    timeouts: TimeoutSection,
    pacing: DelayPolicy,
}

impl ProfileExtractor {
    pub fn new(selectors: SelectorSection, timeouts: TimeoutSection, pacing: DelayPolicy) -> Self {
        Self {
            selectors,
            timeouts,
            pacing,
        }
    }

    pub async fn extract(
        &self,
        session: &mut dyn ProfileSession,
        url: &str,
    ) -> BrowserResult<ProfileRecord> {
        info!(url, "scraping profile");

        match session.navigate(url).await {
            Ok(()) => {}
            Err(BrowserError::NavigationTimeout(_)) => {
                warn!(url, "timeout while loading profile");
                return Ok(ProfileRecord::unreachable(url, RecordStatus::Timeout));
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                warn!(url, error = %err, "profile navigation failed");
                return Ok(ProfileRecord::unreachable(
                    url,
                    RecordStatus::Error(err.to_string()),
                ));
            }
        }

        // Rendering waits; best-effort and never retried.
        self.pacing.page_settle().await;
        if let Err(err) = session.execute(SCROLL_MIDPOINT_SCRIPT).await {
            if err.is_fatal() {
                return Err(err);
            }
            debug!(url, error = %err, "midpoint scroll failed");
        }
        self.pacing.post_scroll().await;

        let mut record = ProfileRecord::empty(url);

        match session.texts_of(&self.selectors.name_headings).await {
            Ok(headings) => match select_heading(&headings) {
                Some(name) => {
                    debug!(url, name = %name, "found name");
                    record.name = name;
                }
                None => warn!(url, "no qualifying heading for name"),
            },
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => warn!(url, error = %err, "name extraction failed"),
        }

        match session.text_of(&self.selectors.headline).await {
            Ok(Some(headline)) => record.headline = headline,
            Ok(None) => warn!(url, "could not extract headline"),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => warn!(url, error = %err, "headline extraction failed"),
        }

        match session.text_of(&self.selectors.location).await {
            Ok(Some(location)) => record.location = location,
            Ok(None) => warn!(url, "could not extract location"),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => warn!(url, error = %err, "location extraction failed"),
        }

        if let Some(about) = self.about_section(session, url).await? {
            record.about = truncate_chars(&about, ABOUT_MAX_CHARS);
        }

        Ok(record)
    }

    /// The about text sits below the fold behind an anchor; every step here
    /// shares the per-field policy, so a miss at any point yields `None`.
    async fn about_section(
        &self,
        session: &mut dyn ProfileSession,
        url: &str,
    ) -> BrowserResult<Option<String>> {
        let anchor_wait = Duration::from_secs(self.timeouts.element_secs);
        match session
            .wait_for(&self.selectors.about_anchor, anchor_wait)
            .await
        {
            Ok(()) => {}
            Err(err) if err.is_fatal() => return Err(err),
            Err(_) => {
                warn!(url, "could not locate about anchor");
                return Ok(None);
            }
        }
        match session.scroll_into_view(&self.selectors.about_anchor).await {
            Ok(()) => {}
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                warn!(url, error = %err, "could not reveal about section");
                return Ok(None);
            }
        }
        self.pacing.about_reveal().await;
        match session.text_of(&self.selectors.about_section).await {
            Ok(Some(text)) => Ok(Some(text)),
            Ok(None) => {
                warn!(url, "could not extract about section");
                Ok(None)
            }
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                warn!(url, error = %err, "about lookup failed");
                Ok(None)
            }
        }
    }
}

/// First heading whose trimmed text is a plausible person name: non-empty,
/// length within bounds, and not URL-shaped.
pub fn select_heading(headings: &[String]) -> Option<String> {
    headings
        .iter()
        .map(|text| text.trim())
        .find(|text| {
            let len = text.chars().count();
            (NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) && !looks_like_url(text)
        })
        .map(str::to_string)
}

fn looks_like_url(text: &str) -> bool {
    if text.starts_with("http") {
        return true;
    }
    url::Url::parse(text)
        .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Character-boundary-safe truncation; byte slicing would panic on
/// multibyte text.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_selection_skips_url_shaped_text() {
        let headings = vec![
            "https://www.linkedin.com/in/someone-12/".to_string(),
            "Ana".to_string(),
        ];
        assert_eq!(select_heading(&headings), Some("Ana".to_string()));
    }

    #[test]
    fn heading_selection_enforces_length_bounds() {
        let long = "x".repeat(101);
        let headings = vec!["A".to_string(), long, "Valid Name".to_string()];
        assert_eq!(select_heading(&headings), Some("Valid Name".to_string()));
    }

    #[test]
    fn heading_selection_trims_before_judging() {
        let headings = vec!["   ".to_string(), "  Bo  ".to_string()];
        assert_eq!(select_heading(&headings), Some("Bo".to_string()));
    }

    #[test]
    fn no_qualifying_heading_yields_none() {
        let headings = vec!["h".to_string(), "http://a.example/b".to_string()];
        assert_eq!(select_heading(&headings), None);
    }

    #[test]
    fn truncation_is_char_safe() {
        let text = "é".repeat(600);
        let truncated = truncate_chars(&text, 500);
        assert_eq!(truncated.chars().count(), 500);
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_chars("hello", 500), "hello");
    }
}
