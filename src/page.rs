use std::path::Path;
use std::time::{Duration, Instant};

use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::Page as CrPage;
use chromiumoxide::page::ScreenshotParams;

use crate::element::Element;
use crate::error::{Error, Result};

/// How often bounded waits re-check the page.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Wrapper around a chromiumoxide Page with the queries and bounded waits
/// the form runner needs.
pub struct Page {
    inner: CrPage,
}

impl Page {
    pub(crate) fn new(inner: CrPage) -> Self {
        Self { inner }
    }

    /// Returns a reference to the underlying chromiumoxide Page.
    pub fn inner(&self) -> &CrPage {
        &self.inner
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Get the current page URL.
    pub async fn url(&self) -> Result<String> {
        self.inner
            .url()
            .await
            .map_err(|e| Error::NavigationError(e.to_string()))?
            .ok_or_else(|| Error::NavigationError("No URL found".into()))
    }

    /// Wait for the in-flight navigation to settle, bounded by `timeout`.
    pub async fn wait_for_load(&self, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.inner.wait_for_navigation()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(Error::NavigationError(e.to_string())),
            Err(_) => Err(Error::NavigationError(
                "page load did not settle within timeout".into(),
            )),
        }
    }

    // ── Element queries ─────────────────────────────────────────────

    /// Find an element matching the given CSS selector.
    pub async fn find_element(&self, selector: &str) -> Result<Element> {
        let el = self
            .inner
            .find_element(selector)
            .await
            .map_err(|e| Error::ElementNotFound(e.to_string()))?;
        Ok(Element::new(el))
    }

    /// Find all elements matching the given CSS selector.
    pub async fn find_elements(&self, selector: &str) -> Result<Vec<Element>> {
        let els = self
            .inner
            .find_elements(selector)
            .await
            .map_err(|e| Error::ElementNotFound(e.to_string()))?;
        Ok(els.into_iter().map(Element::new).collect())
    }

    /// Find the first element matching the given XPath expression,
    /// in document order.
    pub async fn find_xpath(&self, xpath: &str) -> Result<Element> {
        let el = self
            .inner
            .find_xpath(xpath)
            .await
            .map_err(|e| Error::ElementNotFound(e.to_string()))?;
        Ok(Element::new(el))
    }

    // ── Bounded waits ───────────────────────────────────────────────

    /// Wait for an element matching the CSS selector to appear.
    pub async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<Element> {
        let start = Instant::now();
        loop {
            match self.find_element(selector).await {
                Ok(el) => return Ok(el),
                Err(_) if start.elapsed() < timeout => {
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(_) => {
                    return Err(Error::Timeout(format!(
                        "Timed out waiting for selector: {selector}"
                    )));
                }
            }
        }
    }

    /// Wait for every element matching the CSS selector to leave the DOM.
    pub async fn wait_for_gone(&self, selector: &str, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        while self.find_element(selector).await.is_ok() {
            if start.elapsed() >= timeout {
                return Err(Error::Timeout(format!(
                    "Element still present after timeout: {selector}"
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        Ok(())
    }

    // ── Actions & observations ──────────────────────────────────────

    /// Press a key against the document (e.g. "Escape" to close a floating
    /// option list).
    pub async fn press_key(&self, key: &str) -> Result<()> {
        let el = self.find_element("body").await?;
        el.press_key(key).await
    }

    /// The page's visible text, as a user would read it.
    pub async fn visible_text(&self) -> Result<String> {
        let body = self.find_element("body").await?;
        body.inner_text().await
    }

    /// Point a file input at the given path via CDP.
    pub async fn set_input_files(&self, element: &Element, path: &Path) -> Result<()> {
        let params = SetFileInputFilesParams::builder()
            .files(vec![path.to_string_lossy().into_owned()])
            .backend_node_id(element.inner().backend_node_id.clone())
            .build()
            .map_err(Error::JsError)?;
        self.inner.execute(params).await.map_err(Error::CdpError)?;
        Ok(())
    }

    /// Take a full-page screenshot and save it as a PNG file.
    pub async fn screenshot_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.inner
            .save_screenshot(params, path)
            .await
            .map_err(|e| Error::ScreenshotError(e.to_string()))?;
        Ok(())
    }
}
