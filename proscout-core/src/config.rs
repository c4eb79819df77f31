use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Top-level configuration for one scraping run. Every section has working
/// defaults so a partial (or absent) TOML file still yields a usable config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub chromium: ChromiumSection,
    pub flags: FlagsSection,
    pub user_agents: UserAgentSection,
    pub viewport: ViewportSection,
    pub fingerprint: FingerprintSection,
    pub timeouts: TimeoutSection,
    pub pacing: PacingSection,
    pub site: SiteSection,
    pub selectors: SelectorSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChromiumSection {
    /// Explicit chromium binary; `None` lets chromiumoxide autodetect.
    pub executable_path: Option<String>,
    pub headless: bool,
    pub sandbox: bool,
    pub disable_gpu: bool,
    pub request_timeout_secs: Option<u64>,
}

impl Default for ChromiumSection {
    fn default() -> Self {
        Self {
            executable_path: None,
            headless: true,
            sandbox: false,
            disable_gpu: true,
            request_timeout_secs: Some(60),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlagsSection {
    pub no_first_run: bool,
    pub disable_automation_controlled: bool,
    pub disable_blink_features: Vec<String>,
    pub start_maximized: bool,
    pub lang: Option<String>,
    pub accept_language: Option<String>,
}

impl Default for FlagsSection {
    fn default() -> Self {
        Self {
            no_first_run: true,
            disable_automation_controlled: true,
            disable_blink_features: vec!["AutomationControlled".to_string()],
            start_maximized: true,
            lang: None,
            accept_language: Some("en-US,en;q=0.9".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentSection {
    pub pool: Vec<String>,
}

impl Default for UserAgentSection {
    fn default() -> Self {
        Self {
            pool: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewportSection {
    pub resolutions: Vec<[u32; 2]>,
    pub jitter_pixels: u32,
    pub device_scale_factor: f64,
}

impl Default for ViewportSection {
    fn default() -> Self {
        Self {
            resolutions: vec![[1920, 1080]],
            jitter_pixels: 0,
            device_scale_factor: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FingerprintSection {
    pub override_webdriver: bool,
    pub mask_languages: bool,
    pub languages: Vec<String>,
    pub mask_plugins: bool,
}

impl Default for FingerprintSection {
    fn default() -> Self {
        Self {
            override_webdriver: true,
            mask_languages: true,
            languages: vec!["en-US".to_string(), "en".to_string()],
            mask_plugins: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutSection {
    pub navigation_secs: u64,
    pub element_secs: u64,
    pub login_field_secs: u64,
}

impl Default for TimeoutSection {
    fn default() -> Self {
        Self {
            navigation_secs: 30,
            element_secs: 5,
            login_field_secs: 10,
        }
    }
}

/// Randomized wait ranges in milliseconds, `[lower, upper]` inclusive.
/// A `[0, 0]` range disables the wait entirely, which tests rely on.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingSection {
    pub login_warmup_ms: [u64; 2],
    pub credential_gap_ms: [u64; 2],
    pub post_submit_ms: [u64; 2],
    pub page_settle_ms: [u64; 2],
    pub post_scroll_ms: [u64; 2],
    pub about_reveal_ms: [u64; 2],
    pub between_profiles_ms: [u64; 2],
}

impl Default for PacingSection {
    fn default() -> Self {
        Self {
            login_warmup_ms: [2_000, 4_000],
            credential_gap_ms: [1_000, 2_000],
            post_submit_ms: [5_000, 7_000],
            page_settle_ms: [3_000, 5_000],
            post_scroll_ms: [2_000, 3_000],
            about_reveal_ms: [1_000, 1_000],
            between_profiles_ms: [5_000, 10_000],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteSection {
    pub login_url: String,
    /// Substrings of the post-login URL that confirm an authenticated area.
    pub authenticated_markers: Vec<String>,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            login_url: "https://www.linkedin.com/login".to_string(),
            authenticated_markers: vec!["feed".to_string(), "mynetwork".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorSection {
    pub email_field: String,
    pub password_field: String,
    pub submit_button: String,
    pub name_headings: String,
    pub headline: String,
    pub location: String,
    pub about_anchor: String,
    pub about_section: String,
}

impl Default for SelectorSection {
    fn default() -> Self {
        Self {
            email_field: "#username".to_string(),
            password_field: "#password".to_string(),
            submit_button: "button[type='submit']".to_string(),
            name_headings: "h1".to_string(),
            headline: "div.text-body-medium".to_string(),
            location: "span.text-body-small.inline.t-black--light.break-words".to_string(),
            about_anchor: "#about".to_string(),
            about_section: "section.artdeco-card div.display-flex.ph5.pv3 span".to_string(),
        }
    }
}

pub fn load_scraper_config<P: AsRef<Path>>(path: P) -> Result<ScraperConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        source,
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn load_fixture_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../configs/proscout.toml");
        let config = load_scraper_config(path).expect("fixture config should parse");
        assert!(config.user_agents.pool.len() >= 2);
        assert_eq!(config.site.authenticated_markers, vec!["feed", "mynetwork"]);
        assert_eq!(config.pacing.about_reveal_ms, [1_000, 1_000]);
        assert_eq!(config.selectors.email_field, "#username");
    }

    #[test]
    fn defaults_cover_every_section() {
        let config: ScraperConfig = toml::from_str("").expect("empty config should parse");
        assert!(config.chromium.headless);
        assert!(config.fingerprint.override_webdriver);
        assert_eq!(config.timeouts.navigation_secs, 30);
        assert_eq!(config.pacing.between_profiles_ms, [5_000, 10_000]);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: ScraperConfig = toml::from_str(
            r#"
            [timeouts]
            navigation_secs = 12

            [pacing]
            between_profiles_ms = [5000, 5000]
            "#,
        )
        .expect("partial config should parse");
        assert_eq!(config.timeouts.navigation_secs, 12);
        assert_eq!(config.timeouts.element_secs, 5);
        assert_eq!(config.pacing.between_profiles_ms, [5_000, 5_000]);
        assert_eq!(config.pacing.page_settle_ms, [3_000, 5_000]);
    }
}
