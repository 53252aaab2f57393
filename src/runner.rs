use std::fmt;

use crate::browser::FormBrowser;
use crate::config::{FormConfig, RunnerConfig};
use crate::error::{Error, Result};
use crate::field::FieldSpec;
use crate::log::{self, RunLog, RunResult};
use crate::page::Page;
use crate::submit::{self, SuccessProbe};
use crate::{fill, resolve};

/// Where a run currently stands. A run walks the states in order and lands
/// on either `SuccessConfirmed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    PageLoaded,
    FieldsFilling,
    FieldsFilled,
    Submitted,
    SuccessConfirmed,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::PageLoaded => "page_loaded",
            RunState::FieldsFilling => "fields_filling",
            RunState::FieldsFilled => "fields_filled",
            RunState::Submitted => "submitted",
            RunState::SuccessConfirmed => "success_confirmed",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Sequences one submission: load the page, fill every field in order,
/// submit, confirm, capture artifacts. Single pass, no retries.
pub struct FormRunner {
    config: RunnerConfig,
}

impl FormRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run one submission attempt. Every error is converted into a failure
    /// `RunResult`; exactly one result row is appended to the run log either
    /// way.
    pub async fn run(&self, form: &FormConfig, fields: &[FieldSpec]) -> RunResult {
        let ts = log::timestamp();
        let url = form.url.clone().unwrap_or_default();

        let result = match self.attempt(form, fields, &ts).await {
            Ok(()) => {
                tracing::info!(url = %url, "form submitted successfully");
                RunResult::success(ts, url)
            }
            Err(e) => {
                tracing::error!(state = %RunState::Failed, error = %e, "run failed");
                RunResult::failure(ts, url, &e)
            }
        };

        let run_log = RunLog::new(self.config.log_path());
        if let Err(e) = run_log.append(&result) {
            tracing::warn!(error = %e, "could not append to run log");
        }
        result
    }

    /// Validate inputs, then acquire the browser for the scope of the run.
    /// The browser is closed on every exit path before the outcome is
    /// reported.
    async fn attempt(&self, form: &FormConfig, fields: &[FieldSpec], ts: &str) -> Result<()> {
        for field in fields {
            field.validate()?;
        }
        let url = form
            .url
            .as_deref()
            .ok_or_else(|| Error::InputError("no form URL configured".into()))?;
        let probes = submit::success_probes(form)?;
        std::fs::create_dir_all(&self.config.out_dir)?;

        let browser = FormBrowser::launch(&self.config).await?;
        let outcome = self.drive(&browser, url, form, fields, &probes, ts).await;
        if let Err(e) = browser.close().await {
            tracing::warn!(error = %e, "browser did not shut down cleanly");
        }
        outcome
    }

    async fn drive(
        &self,
        browser: &FormBrowser,
        url: &str,
        form: &FormConfig,
        fields: &[FieldSpec],
        probes: &[SuccessProbe],
        ts: &str,
    ) -> Result<()> {
        let page = browser.new_page(url).await?;
        match self.fill_and_submit(&page, form, fields, probes).await {
            Ok(()) => {
                let shot = self.config.out_dir.join(format!("{ts}.png"));
                page.screenshot_to_file(&shot).await?;
                tracing::info!(path = %shot.display(), "success screenshot saved");
                Ok(())
            }
            Err(e) => {
                // Best effort: a failed capture never masks the original error.
                let shot = self.config.out_dir.join(format!("{ts}_error.png"));
                match page.screenshot_to_file(&shot).await {
                    Ok(()) => tracing::info!(path = %shot.display(), "error screenshot saved"),
                    Err(shot_err) => {
                        tracing::warn!(error = %shot_err, "could not capture error screenshot")
                    }
                }
                Err(e)
            }
        }
    }

    async fn fill_and_submit(
        &self,
        page: &Page,
        form: &FormConfig,
        fields: &[FieldSpec],
        probes: &[SuccessProbe],
    ) -> Result<()> {
        let timeout = self.config.timeout;
        let mut state = RunState::Idle;
        tracing::debug!(%state, "run starting");

        // Navigation is already committed; give the page a chance to settle.
        // Field resolution polls anyway, so a slow settle is not fatal.
        if let Err(e) = page.wait_for_load(timeout).await {
            tracing::warn!(error = %e, "load settle wait gave up, continuing");
        }
        state = RunState::PageLoaded;
        tracing::info!(%state, "page loaded");

        if let Some(spinner) = &form.idle_spinner {
            if page.wait_for_gone(spinner, timeout).await.is_err() {
                tracing::warn!(selector = %spinner, "idle spinner still visible after timeout");
            }
        }

        state = RunState::FieldsFilling;
        tracing::info!(%state, fields = fields.len(), "filling fields in order");
        for spec in fields {
            tracing::info!(label = %spec.label, kind = %spec.kind, "filling field");
            let target = resolve::resolve(page, &spec.label, spec.kind, timeout).await?;
            fill::fill_field(page, &target, spec, timeout).await?;
        }
        state = RunState::FieldsFilled;
        tracing::info!(%state, "all fields filled");

        submit::click_submit(page, form, timeout).await?;
        state = RunState::Submitted;
        tracing::info!(%state, "submit clicked, waiting for confirmation");

        submit::wait_for_success(page, probes, timeout).await?;
        state = RunState::SuccessConfirmed;
        tracing::info!(%state, "submission confirmed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldKind, FieldValue};
    use crate::log::RunStatus;

    fn runner_into(dir: &std::path::Path) -> FormRunner {
        FormRunner::new(RunnerConfig::builder().out_dir(dir).build())
    }

    #[test]
    fn run_states_render_in_order() {
        let states = [
            RunState::Idle,
            RunState::PageLoaded,
            RunState::FieldsFilling,
            RunState::FieldsFilled,
            RunState::Submitted,
            RunState::SuccessConfirmed,
            RunState::Failed,
        ];
        let rendered: Vec<String> = states.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            rendered,
            [
                "idle",
                "page_loaded",
                "fields_filling",
                "fields_filled",
                "submitted",
                "success_confirmed",
                "failed"
            ]
        );
    }

    #[tokio::test]
    async fn missing_url_fails_without_a_browser() {
        let dir = tempfile::tempdir().expect("temp dir");
        let runner = runner_into(dir.path());
        let result = runner.run(&FormConfig::default(), &[]).await;

        assert_eq!(result.status, RunStatus::Error);
        assert!(result.error.contains("no form URL"));
        let log = std::fs::read_to_string(runner.config().log_path()).expect("log written");
        assert_eq!(log.lines().count(), 2, "header plus exactly one row");
    }

    #[tokio::test]
    async fn shape_mismatch_is_rejected_before_any_browser_interaction() {
        let dir = tempfile::tempdir().expect("temp dir");
        let runner = runner_into(dir.path());
        let form = FormConfig {
            url: Some("https://example.invalid/form".into()),
            ..FormConfig::default()
        };
        let fields = [FieldSpec {
            label: "Country".into(),
            kind: FieldKind::SingleSelect,
            value: FieldValue::Flag(true),
        }];

        let result = runner.run(&form, &fields).await;

        assert_eq!(result.status, RunStatus::Error);
        assert!(result.error.contains("Country"));
        // Validation failed before launch, so no screenshot was produced.
        let pngs = std::fs::read_dir(dir.path())
            .expect("read out dir")
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "png"))
            .count();
        assert_eq!(pngs, 0);
    }
}
