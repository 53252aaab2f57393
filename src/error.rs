use thiserror::Error;

use crate::field::FieldKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Browser launch failed: {0}")]
    LaunchError(String),

    #[error("Navigation failed: {0}")]
    NavigationError(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("No element found for label '{label}' ({kind})")]
    FieldNotFound { label: String, kind: FieldKind },

    #[error("Failed to fill field '{label}' ({kind}): {cause}")]
    FillError {
        label: String,
        kind: FieldKind,
        cause: String,
    },

    #[error("Submit failed: {0}")]
    SubmitError(String),

    #[error("No success confirmation within timeout, waited for {0}")]
    SuccessTimeout(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("JavaScript error: {0}")]
    JsError(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotError(String),

    #[error("Invalid run input: {0}")]
    InputError(String),

    #[error("Run log error: {0}")]
    LogError(#[from] csv::Error),

    #[error("CDP error: {0}")]
    CdpError(#[from] chromiumoxide::error::CdpError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
