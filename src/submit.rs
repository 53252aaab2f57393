use std::fmt;
use std::time::{Duration, Instant};

use regex::Regex;

use crate::config::FormConfig;
use crate::error::{Error, Result};
use crate::page::{Page, POLL_INTERVAL};

/// Selectors tried before falling back to a button-text scan.
const SUBMIT_SELECTORS: &[&str] = &["button[type='submit']", "input[type='submit']"];

/// Visible text that marks a page as successfully submitted when no probe
/// is configured.
const DEFAULT_SUCCESS_PATTERN: &str = r"(?i)thank you|thanks|submitted|success";

/// Locate the submit control and click it. An explicit `submit_selector`
/// wins; otherwise native submit elements are tried first, then any button
/// whose visible text reads like a submit action.
pub async fn click_submit(page: &Page, form: &FormConfig, timeout: Duration) -> Result<()> {
    if let Some(selector) = &form.submit_selector {
        let el = page.wait_for(selector, timeout).await.map_err(|_| {
            Error::SubmitError(format!("submit control '{selector}' not found"))
        })?;
        el.click()
            .await
            .map_err(|e| Error::SubmitError(e.to_string()))?;
        return Ok(());
    }

    let deadline = Instant::now() + timeout;
    loop {
        for selector in SUBMIT_SELECTORS {
            if let Ok(el) = page.find_element(selector).await {
                el.click()
                    .await
                    .map_err(|e| Error::SubmitError(e.to_string()))?;
                return Ok(());
            }
        }
        if let Ok(buttons) = page.find_elements("button, [role='button']").await {
            for button in buttons {
                let text = button.inner_text().await.unwrap_or_default();
                if looks_like_submit(&text) {
                    button
                        .click()
                        .await
                        .map_err(|e| Error::SubmitError(e.to_string()))?;
                    return Ok(());
                }
            }
        }
        if Instant::now() >= deadline {
            return Err(Error::SubmitError("no submit control found".into()));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn looks_like_submit(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    !text.is_empty() && (text.contains("submit") || text.contains("send"))
}

/// One way of confirming a successful submission.
#[derive(Debug)]
pub enum SuccessProbe {
    /// A CSS selector that appears on success.
    Selector(String),
    /// A pattern matched against the page's visible text.
    Text(Regex),
    /// A substring the page URL must contain.
    UrlContains(String),
}

impl fmt::Display for SuccessProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuccessProbe::Selector(s) => write!(f, "selector '{s}'"),
            SuccessProbe::Text(re) => write!(f, "text matching /{}/", re.as_str()),
            SuccessProbe::UrlContains(s) => write!(f, "URL containing '{s}'"),
        }
    }
}

/// Build the probe list for a form. Configured probes are used as given;
/// with nothing configured the documented default text pattern applies.
pub fn success_probes(form: &FormConfig) -> Result<Vec<SuccessProbe>> {
    let mut probes = Vec::new();
    if let Some(raw) = &form.success_selector {
        probes.push(parse_selector_probe(raw)?);
    }
    if let Some(fragment) = &form.success_url_contains {
        probes.push(SuccessProbe::UrlContains(fragment.clone()));
    }
    if probes.is_empty() {
        let re = Regex::new(DEFAULT_SUCCESS_PATTERN)
            .map_err(|e| Error::InputError(e.to_string()))?;
        probes.push(SuccessProbe::Text(re));
    }
    Ok(probes)
}

/// `success_selector` doubles as a text pattern when written as
/// `text=/pattern/flags` (or `text=literal` for a plain substring);
/// anything else is a CSS selector.
fn parse_selector_probe(raw: &str) -> Result<SuccessProbe> {
    let Some(rest) = raw.strip_prefix("text=") else {
        return Ok(SuccessProbe::Selector(raw.to_string()));
    };
    let pattern = if let Some(body) = rest.strip_prefix('/') {
        let (inner, flags) = body.rsplit_once('/').ok_or_else(|| {
            Error::InputError(format!("malformed text pattern '{raw}': missing closing '/'"))
        })?;
        if flags.contains('i') {
            format!("(?i){inner}")
        } else {
            inner.to_string()
        }
    } else {
        regex::escape(rest)
    };
    let re = Regex::new(&pattern)
        .map_err(|e| Error::InputError(format!("invalid success pattern '{raw}': {e}")))?;
    Ok(SuccessProbe::Text(re))
}

/// Poll every probe until one confirms or the timeout expires.
pub async fn wait_for_success(
    page: &Page,
    probes: &[SuccessProbe],
    timeout: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        for probe in probes {
            if probe_matches(page, probe).await {
                tracing::info!(%probe, "success confirmed");
                return Ok(());
            }
        }
        if Instant::now() >= deadline {
            let waited = probes
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(" or ");
            return Err(Error::SuccessTimeout(waited));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

async fn probe_matches(page: &Page, probe: &SuccessProbe) -> bool {
    match probe {
        SuccessProbe::Selector(selector) => page.find_element(selector).await.is_ok(),
        SuccessProbe::Text(re) => page
            .visible_text()
            .await
            .map(|text| re.is_match(&text))
            .unwrap_or(false),
        SuccessProbe::UrlContains(fragment) => page
            .url()
            .await
            .map(|url| url.contains(fragment))
            .unwrap_or(false),
    }
}
