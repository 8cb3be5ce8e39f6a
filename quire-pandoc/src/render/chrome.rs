//! Headless Chrome rasterizer.
//!
//! Shells out to Chrome/Chromium's `--screenshot` mode once per request. The
//! scratch directory holding page and screenshot files is created on the first
//! request and removed by [`Rasterizer::stop`]. Requests queue on an internal
//! mutex, so concurrent callers never race on the scratch files or see each
//! other's viewport.

use super::{Rasterizer, Screenshot, Viewport};
use crate::error::RpngError;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;
use tempfile::TempDir;
use url::Url;
use which::which;

/// Chrome screenshot handle, started lazily.
#[derive(Debug, Default)]
pub struct ChromeRasterizer {
    binary: Option<PathBuf>,
    viewport: Viewport,
    session: Mutex<Option<Session>>,
}

#[derive(Debug)]
struct Session {
    chrome: PathBuf,
    scratch: TempDir,
    renders: u64,
}

impl ChromeRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses this binary instead of searching for one.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// Window size for requests that do not name one.
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn is_started(&self) -> bool {
        self.session
            .lock()
            .map(|session| session.is_some())
            .unwrap_or(false)
    }

    fn start(&self) -> Result<Session, RpngError> {
        let chrome = match &self.binary {
            Some(binary) => binary.clone(),
            None => resolve_chrome_binary()?,
        };
        let scratch = tempfile::Builder::new().prefix("quire-chrome").tempdir()?;
        tracing::debug!(chrome = %chrome.display(), "starting chrome rasterizer");
        Ok(Session {
            chrome,
            scratch,
            renders: 0,
        })
    }
}

impl Rasterizer for ChromeRasterizer {
    fn screenshot(&self, request: &Screenshot) -> Result<Vec<u8>, RpngError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| RpngError::Raster("rasterizer lock poisoned".to_string()))?;
        if guard.is_none() {
            *guard = Some(self.start()?);
        }
        let session = guard
            .as_mut()
            .ok_or_else(|| RpngError::Raster("rasterizer not started".to_string()))?;

        session.renders += 1;
        let stem = format!("render-{}", session.renders);
        let html_path = session.scratch.path().join(format!("{stem}.html"));
        let png_path = session.scratch.path().join(format!("{stem}.png"));
        let page = pin_selected(&request.html, &request.selector);
        fs::write(&html_path, page)?;

        let viewport = request.viewport.unwrap_or(self.viewport);
        let result = run_chrome(&session.chrome, &html_path, &png_path, viewport);
        let _ = fs::remove_file(&html_path);
        result?;

        let bytes = fs::read(&png_path)?;
        let _ = fs::remove_file(&png_path);
        Ok(bytes)
    }

    fn stop(&self) {
        if let Ok(mut guard) = self.session.lock() {
            if guard.take().is_some() {
                tracing::debug!("stopped chrome rasterizer");
            }
        }
    }
}

impl Drop for ChromeRasterizer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_chrome(
    chrome: &Path,
    html_path: &Path,
    png_path: &Path,
    viewport: Viewport,
) -> Result<(), RpngError> {
    let file_url = Url::from_file_path(html_path).map_err(|_| {
        RpngError::Raster("failed to construct file:// URL for HTML input".to_string())
    })?;

    let status = Command::new(chrome)
        .arg("--headless")
        .arg("--disable-gpu")
        .arg("--no-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--hide-scrollbars")
        .arg(format!("--screenshot={}", png_path.display()))
        .arg(format!(
            "--window-size={},{}",
            viewport.width, viewport.height
        ))
        .arg(file_url.as_str())
        .status()
        .map_err(|e| {
            RpngError::Raster(format!(
                "failed to launch Chrome ({}): {e}",
                chrome.display()
            ))
        })?;

    if !status.success() {
        return Err(RpngError::Raster(format!(
            "Chrome exited with status {status}"
        )));
    }
    Ok(())
}

/// CLI screenshots capture the whole window, so the selected element is
/// pinned to the top-left corner.
fn pin_selected(html: &str, selector: &str) -> String {
    let style = format!(
        "<style data-quire-screenshot>\nbody {{ margin: 0; background: white; }}\n{selector} {{ display: inline-block; margin: 0; }}\n</style>"
    );
    if let Some(idx) = html.find("</head>") {
        let mut output = String::with_capacity(html.len() + style.len());
        output.push_str(&html[..idx]);
        output.push_str(&style);
        output.push_str(&html[idx..]);
        output
    } else {
        format!("{style}{html}")
    }
}

/// Locates a Chrome/Chromium binary.
///
/// Checks `QUIRE_CHROME_BIN`, `GOOGLE_CHROME_BIN` and `CHROME_BIN`, then the
/// usual executable names on `PATH`, then platform install locations.
pub fn resolve_chrome_binary() -> Result<PathBuf, RpngError> {
    for var in ["QUIRE_CHROME_BIN", "GOOGLE_CHROME_BIN", "CHROME_BIN"] {
        if let Some(path) = env::var_os(var) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
    }

    for candidate in [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
        "chrome",
        "msedge",
    ] {
        if let Ok(path) = which(candidate) {
            return Ok(path);
        }
    }

    #[cfg(target_os = "macos")]
    let candidates: &[&str] = &["/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"];
    #[cfg(target_os = "windows")]
    let candidates: &[&str] = &[
        r"C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe",
        r"C:\\Program Files (x86)\\Google\\Chrome\\Application\\chrome.exe",
    ];
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let candidates: &[&str] = &[
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium-browser",
        "/usr/bin/chromium",
    ];

    candidates
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
        .ok_or_else(|| {
            RpngError::Raster(
                "unable to locate a Chrome/Chromium binary; set QUIRE_CHROME_BIN to override the detection"
                    .to_string(),
            )
        })
}
