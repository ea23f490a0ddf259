//! Service configuration, read from the environment once at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Which browser-acquisition strategy the PDF pipeline uses.
///
/// `Serverless` points at a pinned, sandbox-less Chromium binary for
/// constrained deployments; `Local` relies on a full local install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfEngineKind {
    Local,
    Serverless,
}

impl PdfEngineKind {
    fn parse(raw: &str) -> Result<Self> {
        match raw {
            "local" => Ok(PdfEngineKind::Local),
            "serverless" => Ok(PdfEngineKind::Serverless),
            other => Err(Error::Config(format!(
                "PDF_ENGINE must be \"local\" or \"serverless\", got \"{other}\""
            ))),
        }
    }
}

/// Service configuration. Built once in `main` and carried inside the
/// application state; nothing else reads the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub notion_token: String,
    pub notion_database_id: String,
    pub roster_database_url: String,
    pub roster_pool_size: u32,
    pub pdf_engine: PdfEngineKind,
    /// Explicit Chromium binary. Required for `Serverless`, optional
    /// override for `Local`.
    pub chromium_executable: Option<PathBuf>,
    pub pdf_load_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|e| Error::Config(format!("invalid BIND_ADDR: {e}")))?;

        let notion_token = require("NOTION_API_KEY")?;
        let notion_database_id = require("NOTION_DATABASE_ID")?;
        let roster_database_url = require("ROSTER_DATABASE_URL")?;

        let roster_pool_size = std::env::var("ROSTER_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let pdf_engine = match std::env::var("PDF_ENGINE") {
            Ok(raw) => PdfEngineKind::parse(&raw)?,
            Err(_) => PdfEngineKind::Local,
        };

        let chromium_executable = std::env::var("CHROMIUM_PATH").ok().map(PathBuf::from);
        if pdf_engine == PdfEngineKind::Serverless && chromium_executable.is_none() {
            return Err(Error::Config(
                "PDF_ENGINE=serverless requires CHROMIUM_PATH".to_string(),
            ));
        }

        let pdf_load_timeout = std::env::var("PDF_LOAD_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        Ok(Self {
            bind_addr,
            notion_token,
            notion_database_id,
            roster_database_url,
            roster_pool_size,
            pdf_engine,
            chromium_executable,
            pdf_load_timeout,
        })
    }
}

fn require(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::Config(format!("{name} is not set")))
}
