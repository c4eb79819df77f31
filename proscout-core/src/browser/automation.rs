use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig as ChromiumConfig};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::cdp::browser_protocol::target::CreateTargetParams;
use chromiumoxide::handler::viewport::Viewport as ChromiumViewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use rand::{seq::SliceRandom, Rng};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::config::{ScraperConfig, TimeoutSection, ViewportSection};

use super::error::{BrowserError, BrowserResult};
use super::fingerprint::FingerprintMasker;

#[derive(Debug, Clone)]
pub struct ViewportSpec {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
}

/// Builds configured Chromium instances. One launcher can open any number of
/// sessions; each `BrowserSession` owns exactly one browser process.
#[derive(Debug, Clone)]
pub struct SessionLauncher {
    config: Arc<ScraperConfig>,
    fingerprint: Arc<FingerprintMasker>,
}

impl SessionLauncher {
    pub fn new(config: ScraperConfig) -> Self {
        let fingerprint = Arc::new(FingerprintMasker::new(config.fingerprint.clone()));
        Self {
            config: Arc::new(config),
            fingerprint,
        }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub async fn launch(&self) -> BrowserResult<BrowserSession> {
        let viewport = self.select_viewport();
        let user_agent = self.select_user_agent();
        let chromium_config = self.build_chromium_config(&viewport, &user_agent)?;
        info!(
            ua = %user_agent,
            width = viewport.width,
            height = viewport.height,
            headless = self.config.chromium.headless,
            "launching chromium instance"
        );

        let (browser, mut handler) = Browser::launch(chromium_config)
            .await
            .map_err(|err| BrowserError::Launch(err.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(error = %err, "chromium handler reported error");
                }
            }
        });

        let page = browser
            .new_page(CreateTargetParams::new("about:blank"))
            .await?;
        page.enable_stealth_mode_with_agent(&user_agent).await?;
        self.fingerprint.apply(&page).await?;

        Ok(BrowserSession {
            browser: Some(browser),
            handler_task: Some(handler_task),
            page,
            fingerprint: Arc::clone(&self.fingerprint),
            timeouts: self.config.timeouts.clone(),
            user_agent,
            viewport,
        })
    }

    fn select_viewport(&self) -> ViewportSpec {
        let ViewportSection {
            resolutions,
            jitter_pixels,
            device_scale_factor,
        } = &self.config.viewport;

        let mut rng = rand::thread_rng();
        let base = resolutions.choose(&mut rng).cloned().unwrap_or([1366, 768]);
        let jitter = *jitter_pixels as i32;
        let (width, height) = if jitter > 0 {
            (
                (base[0] as i32 + rng.gen_range(-jitter..=jitter)).clamp(640, 2560) as u32,
                (base[1] as i32 + rng.gen_range(-jitter..=jitter)).clamp(480, 1600) as u32,
            )
        } else {
            (base[0], base[1])
        };
        ViewportSpec {
            width,
            height,
            device_scale_factor: *device_scale_factor,
        }
    }

    fn select_user_agent(&self) -> String {
        let mut rng = rand::thread_rng();
        self.config
            .user_agents
            .pool
            .choose(&mut rng)
            .cloned()
            .unwrap_or_else(|| {
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)"
                    .to_string()
            })
    }

    fn build_chromium_config(
        &self,
        viewport: &ViewportSpec,
        user_agent: &str,
    ) -> BrowserResult<ChromiumConfig> {
        let mut builder = ChromiumConfig::builder().viewport(ChromiumViewport {
            width: viewport.width,
            height: viewport.height,
            device_scale_factor: Some(viewport.device_scale_factor),
            emulating_mobile: false,
            is_landscape: viewport.width >= viewport.height,
            has_touch: false,
        });

        if let Some(path) = &self.config.chromium.executable_path {
            builder = builder.chrome_executable(path);
        }
        if !self.config.chromium.headless {
            builder = builder.with_head();
        }
        if !self.config.chromium.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(secs) = self.config.chromium.request_timeout_secs {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }

        let mut args = vec![
            format!("--user-agent={user_agent}"),
            format!("--window-size={},{}", viewport.width, viewport.height),
        ];
        if self.config.chromium.disable_gpu {
            args.push("--disable-gpu".into());
        }
        if self.config.flags.start_maximized {
            args.push("--start-maximized".into());
        }
        if self.config.flags.no_first_run {
            args.push("--no-first-run".into());
        }
        if self.config.flags.disable_automation_controlled {
            args.push("--disable-features=AutomationControlled".into());
        }
        for feature in &self.config.flags.disable_blink_features {
            args.push(format!("--disable-blink-features={feature}"));
        }
        if let Some(lang) = &self.config.flags.lang {
            args.push(format!("--lang={lang}"));
        }
        if let Some(accept) = &self.config.flags.accept_language {
            args.push(format!("--accept-lang={accept}"));
        }
        args.push("--disable-dev-shm-usage".into());

        builder = builder.args(args);
        builder.build().map_err(BrowserError::Configuration)
    }
}

/// One live Chromium process plus its single page. All waits are bounded by
/// the configured timeouts; `close` is idempotent.
#[derive(Debug)]
pub struct BrowserSession {
    browser: Option<Browser>,
    handler_task: Option<JoinHandle<()>>,
    page: Page,
    fingerprint: Arc<FingerprintMasker>,
    timeouts: TimeoutSection,
    user_agent: String,
    viewport: ViewportSpec,
}

impl BrowserSession {
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn viewport(&self) -> &ViewportSpec {
        &self.viewport
    }

    pub async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        let params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(BrowserError::Configuration)?;
        let load = async {
            self.page.goto(params).await?;
            self.page.wait_for_navigation().await?;
            Ok::<(), BrowserError>(())
        };
        match timeout(Duration::from_secs(self.timeouts.navigation_secs), load).await {
            Ok(result) => result?,
            Err(_) => return Err(BrowserError::NavigationTimeout(url.to_string())),
        }
        if let Err(err) = self.fingerprint.reapply(&self.page).await {
            debug!(error = %err, "post-load fingerprint reapply failed");
        }
        Ok(())
    }

    pub async fn current_url(&mut self) -> BrowserResult<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    pub async fn wait_for(&mut self, selector: &str, wait: Duration) -> BrowserResult<()> {
        let deadline = Instant::now() + wait;
        loop {
            if self.page.find_element(selector.to_string()).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::ElementTimeout(selector.to_string()));
            }
            sleep(Duration::from_millis(250)).await;
        }
    }

    /// Trimmed inner text of the first match; `None` when the element is
    /// missing or empty. Lookup failures are data, not errors.
    pub async fn text_of(&mut self, selector: &str) -> BrowserResult<Option<String>> {
        let element = match self.page.find_element(selector.to_string()).await {
            Ok(element) => element,
            Err(_) => return Ok(None),
        };
        match element.inner_text().await {
            Ok(Some(text)) => {
                let trimmed = text.trim().to_string();
                Ok((!trimmed.is_empty()).then_some(trimmed))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                debug!(selector, error = %err, "inner text lookup failed");
                Ok(None)
            }
        }
    }

    /// Trimmed inner texts of all matches, document order, empties skipped.
    pub async fn texts_of(&mut self, selector: &str) -> BrowserResult<Vec<String>> {
        let elements = match self.page.find_elements(selector.to_string()).await {
            Ok(elements) => elements,
            Err(_) => return Ok(Vec::new()),
        };
        let mut texts = Vec::with_capacity(elements.len());
        for element in elements {
            if let Ok(Some(text)) = element.inner_text().await {
                let trimmed = text.trim().to_string();
                if !trimmed.is_empty() {
                    texts.push(trimmed);
                }
            }
        }
        Ok(texts)
    }

    pub async fn type_into(&mut self, selector: &str, text: &str) -> BrowserResult<()> {
        let element = self
            .page
            .find_element(selector.to_string())
            .await
            .map_err(|_| BrowserError::ElementTimeout(selector.to_string()))?;
        element.click().await?;
        element.type_str(text).await?;
        Ok(())
    }

    pub async fn click(&mut self, selector: &str) -> BrowserResult<()> {
        let element = self
            .page
            .find_element(selector.to_string())
            .await
            .map_err(|_| BrowserError::ElementTimeout(selector.to_string()))?;
        element.click().await?;
        Ok(())
    }

    pub async fn scroll_into_view(&mut self, selector: &str) -> BrowserResult<()> {
        let script = format!(
            "(() => {{ const el = document.querySelector({selector:?}); if (el) el.scrollIntoView(true); }})()"
        );
        self.execute(&script).await.map(|_| ())
    }

    pub async fn execute(&mut self, script: &str) -> BrowserResult<serde_json::Value> {
        let result = self.page.evaluate(script).await?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    /// Idempotent teardown: closing an already-closed session is a no-op.
    pub async fn close(&mut self) -> BrowserResult<()> {
        if let Some(mut browser) = self.browser.take() {
            info!("closing browser session");
            if let Err(err) = browser.close().await {
                warn!(error = %err, "browser did not close gracefully");
                if let Some(handle) = &self.handler_task {
                    handle.abort();
                }
            }
            if let Some(handle) = self.handler_task.take() {
                if let Err(err) = handle.await {
                    if !err.is_cancelled() {
                        warn!(error = %err, "browser handler join error");
                    }
                }
            }
        }
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if self.browser.is_some() {
            warn!("BrowserSession dropped without explicit close");
            if let Some(handle) = &self.handler_task {
                handle.abort();
            }
        }
    }
}
