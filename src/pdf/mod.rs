//! PDF export pipeline: headless Chromium over CDP.
//!
//! Browser acquisition is a strategy chosen from configuration at
//! startup: a full local install for development, a pinned sandbox-less
//! binary for constrained serverless deployments. Rendering loads the
//! HTML, waits for the document to settle under a bounded timeout, and
//! prints to A4 with backgrounds and fixed margins. The browser is
//! closed on every exit path.

pub mod template;

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

use crate::config::{AppConfig, PdfEngineKind};
use crate::error::{Error, Result};

pub use template::ReportTemplate;

// A4 in inches, 16px margins at 96 dpi.
const A4_WIDTH_IN: f64 = 8.27;
const A4_HEIGHT_IN: f64 = 11.69;
const MARGIN_IN: f64 = 16.0 / 96.0;

const SETTLE_POLL: Duration = Duration::from_millis(50);

/// How to obtain a browser instance for one render pass.
pub trait BrowserProfile: Send + Sync {
    fn name(&self) -> &'static str;
    fn browser_config(&self) -> Result<BrowserConfig>;
}

/// Full local Chromium/Chrome install; the executable is auto-detected
/// unless overridden.
pub struct LocalChromium {
    pub executable: Option<PathBuf>,
}

impl BrowserProfile for LocalChromium {
    fn name(&self) -> &'static str {
        "local"
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder();
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(Error::RenderLaunch)
    }
}

/// Pinned Chromium binary for constrained environments: no sandbox, no
/// /dev/shm reliance, single process.
pub struct ServerlessChromium {
    pub executable: PathBuf,
}

impl BrowserProfile for ServerlessChromium {
    fn name(&self) -> &'static str {
        "serverless"
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        BrowserConfig::builder()
            .chrome_executable(&self.executable)
            .no_sandbox()
            .args(vec![
                "--disable-setuid-sandbox",
                "--disable-dev-shm-usage",
                "--single-process",
            ])
            .build()
            .map_err(Error::RenderLaunch)
    }
}

pub struct PdfRenderer {
    profile: Box<dyn BrowserProfile>,
    load_timeout: Duration,
}

impl PdfRenderer {
    pub fn new(profile: Box<dyn BrowserProfile>, load_timeout: Duration) -> Self {
        Self {
            profile,
            load_timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let profile: Box<dyn BrowserProfile> = match config.pdf_engine {
            PdfEngineKind::Local => Box::new(LocalChromium {
                executable: config.chromium_executable.clone(),
            }),
            PdfEngineKind::Serverless => {
                let executable = config.chromium_executable.clone().ok_or_else(|| {
                    Error::Config("serverless PDF engine requires CHROMIUM_PATH".to_string())
                })?;
                Box::new(ServerlessChromium { executable })
            }
        };
        Ok(Self::new(profile, config.pdf_load_timeout))
    }

    /// Render an HTML document to PDF bytes. The browser instance is
    /// released whatever the outcome.
    pub async fn render_html(&self, html: &str) -> Result<Vec<u8>> {
        let config = self.profile.browser_config()?;
        debug!(profile = self.profile.name(), "launching render engine");

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::RenderLaunch(e.to_string()))?;

        let driver = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let outcome = self.print_page(&browser, html).await;

        if let Err(e) = browser.close().await {
            warn!("render engine did not close cleanly: {e}");
        }
        let _ = browser.wait().await;
        driver.abort();

        outcome
    }

    async fn print_page(&self, browser: &Browser, html: &str) -> Result<Vec<u8>> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::Render(e.to_string()))?;

        timeout(self.load_timeout, page.set_content(html))
            .await
            .map_err(|_| Error::RenderTimeout(self.load_timeout))?
            .map_err(|e| Error::Render(e.to_string()))?;

        self.wait_until_settled(&page).await?;

        let params = PrintToPdfParams {
            print_background: Some(true),
            paper_width: Some(A4_WIDTH_IN),
            paper_height: Some(A4_HEIGHT_IN),
            margin_top: Some(MARGIN_IN),
            margin_bottom: Some(MARGIN_IN),
            margin_left: Some(MARGIN_IN),
            margin_right: Some(MARGIN_IN),
            ..Default::default()
        };

        page.pdf(params).await.map_err(|e| Error::Render(e.to_string()))
    }

    /// Poll the document until it reports complete, bounded by the load
    /// timeout so a stalled subresource fails the export instead of
    /// hanging it.
    async fn wait_until_settled(&self, page: &Page) -> Result<()> {
        let deadline = Instant::now() + self.load_timeout;
        loop {
            let ready = page
                .evaluate("document.readyState === 'complete'")
                .await
                .ok()
                .and_then(|result| result.into_value::<bool>().ok())
                .unwrap_or(false);
            if ready {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::RenderTimeout(self.load_timeout));
            }
            sleep(SETTLE_POLL).await;
        }
    }
}
