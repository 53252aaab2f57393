use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Settings for one run: how to launch the browser and where to put
/// artifacts. Built once, passed into the runner, never ambient.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Explicit Chrome/Chromium executable; autodetected when `None`.
    pub chrome_path: Option<PathBuf>,
    /// Bound for every wait: page load settle, spinner, field resolution,
    /// option lists, success confirmation.
    pub timeout: Duration,
    /// Directory receiving screenshots and the run log.
    pub out_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            headless: false,
            viewport_width: 1280,
            viewport_height: 1000,
            chrome_path: None,
            timeout: Duration::from_millis(20_000),
            out_dir: PathBuf::from("output"),
        }
    }
}

impl RunnerConfig {
    pub fn builder() -> RunnerConfigBuilder {
        RunnerConfigBuilder::new()
    }

    pub fn log_path(&self) -> PathBuf {
        self.out_dir.join("run_log.csv")
    }
}

pub struct RunnerConfigBuilder {
    config: RunnerConfig,
}

impl RunnerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RunnerConfig::default(),
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.viewport_width = width;
        self.config.viewport_height = height;
        self
    }

    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.out_dir = dir.into();
        self
    }

    pub fn build(self) -> RunnerConfig {
        self.config
    }
}

impl Default for RunnerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-form settings loaded from the config file. Every selector is
/// optional; absent fields fall back to the documented defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default)]
    pub url: Option<String>,
    /// Loading indicator that must disappear before filling starts.
    #[serde(default)]
    pub idle_spinner: Option<String>,
    /// CSS selector, or a `text=/pattern/flags` pattern matched against the
    /// page's visible text, that confirms submission.
    #[serde(default)]
    pub success_selector: Option<String>,
    /// URL substring that confirms submission.
    #[serde(default)]
    pub success_url_contains: Option<String>,
    /// Explicit submit control; the built-in heuristic runs when unset.
    #[serde(default)]
    pub submit_selector: Option<String>,
}

impl FormConfig {
    /// Load from a JSON file. Accepts both the flat shape and the legacy
    /// shape that nests the settings under a `"page"` object.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| Error::InputError(format!("invalid JSON in {}: {e}", path.display())))?;
        let section = match value.get("page") {
            Some(page) => page.clone(),
            None => value,
        };
        serde_json::from_value(section)
            .map_err(|e| Error::InputError(format!("invalid config in {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_str(json: &str) -> FormConfig {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(json.as_bytes()).expect("write");
        FormConfig::load(file.path()).expect("valid config")
    }

    #[test]
    fn flat_config_parses() {
        let config = load_str(
            r#"{"url":"https://example.com/form","success_url_contains":"/done"}"#,
        );
        assert_eq!(config.url.as_deref(), Some("https://example.com/form"));
        assert_eq!(config.success_url_contains.as_deref(), Some("/done"));
        assert!(config.idle_spinner.is_none());
        assert!(config.submit_selector.is_none());
    }

    #[test]
    fn nested_page_config_parses() {
        let config = load_str(
            r#"{"page":{"url":"https://example.com/form","success_selector":"text=/thank you/i"}}"#,
        );
        assert_eq!(config.url.as_deref(), Some("https://example.com/form"));
        assert_eq!(config.success_selector.as_deref(), Some("text=/thank you/i"));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config = load_str(r#"{"url":"https://x.test","browser":{"slow_mo":50}}"#);
        assert_eq!(config.url.as_deref(), Some("https://x.test"));
    }

    #[test]
    fn invalid_json_is_a_spec_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"{not json").expect("write");
        let err = FormConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn runner_defaults() {
        let config = RunnerConfig::default();
        assert!(!config.headless);
        assert_eq!(config.timeout, Duration::from_millis(20_000));
        assert_eq!(config.out_dir, PathBuf::from("output"));
        assert_eq!(config.log_path(), PathBuf::from("output/run_log.csv"));
    }

    #[test]
    fn builder_overrides() {
        let config = RunnerConfig::builder()
            .headless(true)
            .viewport(800, 600)
            .timeout(Duration::from_secs(5))
            .out_dir("artifacts")
            .chrome_path("/usr/bin/chromium")
            .build();
        assert!(config.headless);
        assert_eq!(config.viewport_width, 800);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.log_path(), PathBuf::from("artifacts/run_log.csv"));
        assert_eq!(config.chrome_path.as_deref(), Some(Path::new("/usr/bin/chromium")));
    }
}
