use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::Page;

use crate::config::FingerprintSection;

use super::error::{BrowserError, BrowserResult};

const WEBDRIVER_OVERRIDE: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

/// Injects scripts that hide the usual automation tells before any page
/// script runs, plus once more after load for pages that probe early.
#[derive(Debug, Clone)]
pub struct FingerprintMasker {
    config: FingerprintSection,
}

impl FingerprintMasker {
    pub fn new(config: FingerprintSection) -> Self {
        Self { config }
    }

    pub async fn apply(&self, page: &Page) -> BrowserResult<()> {
        if self.config.override_webdriver {
            self.inject(page, WEBDRIVER_OVERRIDE.to_string()).await?;
        }
        if self.config.mask_languages && !self.config.languages.is_empty() {
            self.inject(page, self.languages_script()).await?;
        }
        if self.config.mask_plugins {
            self.inject(page, Self::plugins_script()).await?;
        }
        Ok(())
    }

    /// Re-applies the webdriver override on an already-loaded document.
    pub async fn reapply(&self, page: &Page) -> BrowserResult<()> {
        if self.config.override_webdriver {
            page.evaluate(WEBDRIVER_OVERRIDE).await?;
        }
        Ok(())
    }

    async fn inject(&self, page: &Page, script: String) -> BrowserResult<()> {
        page.evaluate_on_new_document(
            AddScriptToEvaluateOnNewDocumentParams::builder()
                .source(script)
                .build()
                .map_err(BrowserError::Configuration)?,
        )
        .await?;
        Ok(())
    }

    fn languages_script(&self) -> String {
        let primary = &self.config.languages[0];
        let list = self
            .config
            .languages
            .iter()
            .map(|lang| format!("'{lang}'"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Object.defineProperty(navigator, 'language', {{ get: () => '{primary}' }});\n\
             Object.defineProperty(navigator, 'languages', {{ get: () => [{list}] }});"
        )
    }

    fn plugins_script() -> String {
        r#"
(() => {
    if (navigator.plugins && navigator.plugins.length > 0) {
        return;
    }
    Object.defineProperty(navigator, 'plugins', {
        get: () => [1, 2, 3],
    });
})();
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn languages_script_lists_configured_pool() {
        let masker = FingerprintMasker::new(FingerprintSection {
            override_webdriver: true,
            mask_languages: true,
            languages: vec!["pt-BR".to_string(), "en".to_string()],
            mask_plugins: false,
        });
        let script = masker.languages_script();
        assert!(script.contains("'pt-BR', 'en'"));
        assert!(script.contains("navigator, 'language'"));
    }
}
