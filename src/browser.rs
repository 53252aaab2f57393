use chromiumoxide::browser::{Browser as CrBrowser, BrowserConfig as CrBrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use futures::StreamExt;

use crate::config::RunnerConfig;
use crate::error::{Error, Result};
use crate::page::Page;

/// Chrome flags that keep form pages quiet and predictable under automation.
const LAUNCH_ARGS: &[&str] = &[
    "disable-gpu",
    "disable-extensions",
    "disable-dev-shm-usage",
    "mute-audio",
    "no-default-browser-check",
    "disable-popup-blocking",
    "disable-prompt-on-repost",
    "disable-notifications",
];

/// A launched browser scoped to a single form run. Acquired at the start of
/// the run and closed on every exit path, including failures.
pub struct FormBrowser {
    browser: CrBrowser,
    handler_task: tokio::task::JoinHandle<()>,
}

impl FormBrowser {
    /// Launch a browser instance for the given run configuration.
    pub async fn launch(config: &RunnerConfig) -> Result<Self> {
        let mut builder = CrBrowserConfig::builder();

        if config.headless {
            builder = builder.new_headless_mode().no_sandbox();
        } else {
            builder = builder.with_head().no_sandbox();
        }

        for arg in LAUNCH_ARGS {
            builder = builder.arg(*arg);
        }

        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        builder = builder.viewport(Viewport {
            width: config.viewport_width,
            height: config.viewport_height,
            device_scale_factor: None,
            emulating_mobile: false,
            is_landscape: false,
            has_touch: false,
        });

        let cr_config = builder
            .build()
            .map_err(|e| Error::LaunchError(e.to_string()))?;

        let (browser, mut handler) = CrBrowser::launch(cr_config)
            .await
            .map_err(|e| Error::LaunchError(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Open a new page (tab) navigated to the given URL.
    pub async fn new_page(&self, url: &str) -> Result<Page> {
        let cr_page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| Error::NavigationError(e.to_string()))?;
        Ok(Page::new(cr_page))
    }

    /// Shut the browser down and release the Chrome process.
    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await.map_err(Error::CdpError)?;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }
}
