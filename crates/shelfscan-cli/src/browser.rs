//! Chromium-backed automation surface.
//!
//! Most lookups run as page scripts and come back as JSON; element handles
//! are only used where the engine needs to act on a located region.

use std::fmt::Display;
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::StreamExt as _;
use regex::Regex;
use serde::de::DeserializeOwned;
use shelfscan_core::AppConfig;
use shelfscan_scraper::{PageSurface, RegionHandle, SurfaceError};
use tokio::task::JoinHandle;
use tokio::time::Instant;

const TRIGGER_POLL: Duration = Duration::from_millis(100);
const QUIESCENCE_POLL: Duration = Duration::from_millis(250);

/// Finds and clicks the first visible element whose text matches
/// `__PATTERN__`: role-bearing controls first, then the innermost element
/// with matching text, then elements whose labelling attributes match.
const TRIGGER_JS: &str = r"(() => {
  const re = new RegExp(__PATTERN__, 'i');
  const visible = (el) => {
    const style = window.getComputedStyle(el);
    if (style.visibility === 'hidden' || style.display === 'none') return false;
    return el.getClientRects().length > 0;
  };
  const pick = (els, text) => Array.from(els).find((el) => visible(el) && re.test(text(el)));
  const roleText = (el) => (el.innerText || el.value || el.getAttribute('aria-label') || '').trim();
  const ownText = (el) => (el.innerText || '').trim();
  const attrText = (el) => ['aria-label', 'title', 'data-testid', 'name']
    .map((name) => el.getAttribute(name))
    .filter(Boolean)
    .join(' ');
  const innermost = Array.from(document.querySelectorAll('body *'))
    .filter((el) => !Array.from(el.children).some((child) => re.test(child.innerText || '')));
  const target =
    pick(document.querySelectorAll(
      'button, [role=button], a, [role=link], [role=tab], [role=menuitem], input[type=submit], input[type=button]'
    ), roleText) ||
    pick(innermost, ownText) ||
    pick(document.querySelectorAll('[aria-label], [title], [data-testid], [name]'), attrText);
  if (!target) return false;
  target.scrollIntoView({ block: 'center' });
  target.click();
  return true;
})()";

const ACTIVITY_JS: &str = r"(() => [
  document.readyState,
  performance.getEntriesByType('resource').length,
  document.getElementsByTagName('*').length,
  document.body ? document.body.innerText.length : 0
])()";

const BODY_TEXT_JS: &str = "document.body ? document.body.innerText : ''";

const SCROLL_PAGE_JS: &str =
    "(() => { window.scrollTo(0, document.body.scrollHeight); return true; })()";

const SCROLL_REGION_FN: &str =
    "function() { this.scrollTop = this.scrollHeight; return this.scrollHeight; }";

/// Launches Chromium and spawns its event handler loop.
///
/// # Errors
///
/// Returns an error if the browser configuration is invalid or Chromium
/// cannot be started.
pub async fn launch(config: &AppConfig) -> anyhow::Result<(Browser, JoinHandle<()>)> {
    let mut builder = BrowserConfig::builder()
        .request_timeout(config.navigation_timeout())
        .arg("--no-first-run")
        .arg("--no-default-browser-check");
    if !config.headless {
        builder = builder.with_head();
    }
    let browser_config = builder
        .build()
        .map_err(|e| anyhow::anyhow!("failed to configure browser: {e}"))?;

    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("failed to launch browser")?;
    let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });
    tracing::debug!(headless = config.headless, "browser launched");
    Ok((browser, handler_task))
}

fn backend(error: impl Display) -> SurfaceError {
    SurfaceError::Backend(error.to_string())
}

fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

/// A live browser tab.
pub struct ChromePage {
    page: Page,
    navigation_timeout: Duration,
}

impl ChromePage {
    #[must_use]
    pub fn new(page: Page, navigation_timeout: Duration) -> Self {
        Self {
            page,
            navigation_timeout,
        }
    }

    #[must_use]
    pub fn inner(&self) -> &Page {
        &self.page
    }

    /// Navigates to `url` and waits for the load to finish.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Timeout`] if navigation exceeds the
    /// configured timeout, or [`SurfaceError::Backend`] if it fails.
    pub async fn goto(&self, url: &str) -> Result<(), SurfaceError> {
        let navigation = self.page.goto(url);
        match tokio::time::timeout(self.navigation_timeout, navigation).await {
            Ok(Ok(_)) => {
                tracing::debug!(url, "navigated");
                Ok(())
            }
            Ok(Err(e)) => Err(backend(e)),
            Err(_) => Err(SurfaceError::Timeout {
                what: format!("navigation to {url}"),
                timeout_ms: millis(self.navigation_timeout),
            }),
        }
    }

    /// Evaluates `expression` and deserializes its result.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Script`] if the script throws or its result
    /// does not have the expected shape.
    pub async fn eval<T: DeserializeOwned>(&self, expression: &str) -> Result<T, SurfaceError> {
        self.page
            .evaluate(expression)
            .await
            .map_err(|e| SurfaceError::Script {
                reason: e.to_string(),
            })?
            .into_value::<T>()
            .map_err(|e| SurfaceError::Script {
                reason: e.to_string(),
            })
    }

    /// First element matching `selector`, if any.
    pub async fn first(&self, selector: &str) -> Option<Element> {
        self.page.find_element(selector).await.ok()
    }

    pub async fn all(&self, selector: &str) -> Vec<Element> {
        self.page.find_elements(selector).await.unwrap_or_default()
    }

    async fn try_trigger(&self, pattern: &str) -> bool {
        let script = TRIGGER_JS.replace("__PATTERN__", &js_string(pattern));
        match self.eval::<bool>(&script).await {
            Ok(clicked) => clicked,
            Err(e) => {
                tracing::debug!(pattern, error = %e, "trigger script failed");
                false
            }
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// A located element on a [`ChromePage`].
pub struct ChromeRegion {
    element: Element,
}

#[async_trait]
impl RegionHandle for ChromeRegion {
    async fn visible_text(&self) -> Result<String, SurfaceError> {
        Ok(self
            .element
            .inner_text()
            .await
            .map_err(backend)?
            .unwrap_or_default())
    }

    async fn count(&self, child_pattern: &str) -> Result<usize, SurfaceError> {
        Ok(self
            .element
            .find_elements(child_pattern)
            .await
            .map_err(backend)?
            .len())
    }

    async fn scroll_into_max_extent(&self) -> Result<(), SurfaceError> {
        self.element
            .call_js_fn(SCROLL_REGION_FN, false)
            .await
            .map_err(|e| SurfaceError::Script {
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn child_texts(&self, child_pattern: &str) -> Result<Vec<String>, SurfaceError> {
        let elements = self
            .element
            .find_elements(child_pattern)
            .await
            .map_err(backend)?;
        let mut texts = Vec::with_capacity(elements.len());
        for element in elements {
            let text = element.inner_text().await.map_err(backend)?;
            texts.push(text.unwrap_or_default().trim().to_owned());
        }
        Ok(texts)
    }

    async fn children(&self, child_pattern: &str) -> Result<Vec<Self>, SurfaceError> {
        let elements = self
            .element
            .find_elements(child_pattern)
            .await
            .map_err(backend)?;
        Ok(elements
            .into_iter()
            .map(|element| Self { element })
            .collect())
    }

    async fn click(&self, timeout: Duration) -> Result<(), SurfaceError> {
        match tokio::time::timeout(timeout, self.element.click()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(backend(e)),
            Err(_) => Err(SurfaceError::Timeout {
                what: "element click".to_owned(),
                timeout_ms: millis(timeout),
            }),
        }
    }
}

#[async_trait]
impl PageSurface for ChromePage {
    type Region = ChromeRegion;

    async fn find_regions(
        &self,
        pattern: &str,
        text_filter: Option<&Regex>,
    ) -> Result<Vec<ChromeRegion>, SurfaceError> {
        let elements = self.page.find_elements(pattern).await.map_err(backend)?;
        let mut regions = Vec::with_capacity(elements.len());
        for element in elements {
            let region = ChromeRegion { element };
            if let Some(filter) = text_filter {
                let text = region.visible_text().await.unwrap_or_default();
                if !filter.is_match(&text) {
                    continue;
                }
            }
            regions.push(region);
        }
        Ok(regions)
    }

    async fn trigger_by_text(&self, pattern: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.try_trigger(pattern).await {
                return true;
            }
            if Instant::now() + TRIGGER_POLL > deadline {
                return false;
            }
            tokio::time::sleep(TRIGGER_POLL).await;
        }
    }

    async fn wait_for_quiescence(&self, timeout: Duration) -> Result<(), SurfaceError> {
        let deadline = Instant::now() + timeout;
        let mut previous: Option<serde_json::Value> = None;
        loop {
            let sample: serde_json::Value = self.eval(ACTIVITY_JS).await?;
            let loaded = sample.get(0).and_then(serde_json::Value::as_str) == Some("complete");
            if loaded && previous.as_ref() == Some(&sample) {
                return Ok(());
            }
            previous = Some(sample);
            if Instant::now() >= deadline {
                return Err(SurfaceError::Timeout {
                    what: "network and DOM quiescence".to_owned(),
                    timeout_ms: millis(timeout),
                });
            }
            tokio::time::sleep(QUIESCENCE_POLL).await;
        }
    }

    async fn visible_text(&self) -> Result<String, SurfaceError> {
        self.eval(BODY_TEXT_JS).await
    }

    async fn count(&self, pattern: &str) -> Result<usize, SurfaceError> {
        let script = format!("document.querySelectorAll({}).length", js_string(pattern));
        self.eval(&script).await
    }

    async fn scroll_to_bottom(&self) -> Result<(), SurfaceError> {
        self.eval::<bool>(SCROLL_PAGE_JS).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_string_quotes_and_escapes() {
        assert_eq!(js_string("tbody tr"), r#""tbody tr""#);
        assert_eq!(js_string(r#"a[title="x"]"#), r#""a[title=\"x\"]""#);
    }

    #[test]
    fn trigger_script_embeds_pattern_as_a_string_literal() {
        let script = TRIGGER_JS.replace("__PATTERN__", &js_string(r"Load\ more"));
        assert!(script.contains(r#"new RegExp("Load\\ more", 'i')"#));
        assert!(!script.contains("__PATTERN__"));
    }
}
