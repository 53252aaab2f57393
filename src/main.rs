use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use autoform::config::{FormConfig, RunnerConfig};
use autoform::field::load_fields;
use autoform::runner::FormRunner;
use autoform::{Error, Result};

/// Fill and submit a web form from a declarative field list.
#[derive(Parser, Debug)]
#[command(name = "autoform", version)]
struct Cli {
    /// Form URL (overrides the config file)
    #[arg(long)]
    url: Option<String>,

    /// Path to the JSON array of fields to fill
    #[arg(long, default_value = "data.json")]
    data: PathBuf,

    /// Path to the form configuration JSON
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Run the browser headless
    #[arg(
        long,
        env = "AUTOFORM_HEADLESS",
        action = clap::ArgAction::Set,
        default_value_t = false
    )]
    headless: bool,

    /// Bound for every wait, in milliseconds
    #[arg(long, env = "AUTOFORM_TIMEOUT_MS", default_value_t = 20_000)]
    timeout: u64,

    /// Directory for screenshots and the run log
    #[arg(long, default_value = "output")]
    out_dir: PathBuf,

    /// Chrome or Chromium executable to launch
    #[arg(long)]
    chrome: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "could not start run");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let mut form = if cli.config.exists() {
        FormConfig::load(&cli.config)?
    } else if cli.url.is_some() {
        FormConfig::default()
    } else {
        return Err(Error::InputError(format!(
            "config file {} not found and no --url given",
            cli.config.display()
        )));
    };
    if let Some(url) = cli.url {
        form.url = Some(url);
    }

    let fields = load_fields(&cli.data)?;

    let mut builder = RunnerConfig::builder()
        .headless(cli.headless)
        .timeout(Duration::from_millis(cli.timeout))
        .out_dir(cli.out_dir);
    if let Some(chrome) = cli.chrome {
        builder = builder.chrome_path(chrome);
    }

    let runner = FormRunner::new(builder.build());
    let result = runner.run(&form, &fields).await;
    Ok(result.is_success())
}
