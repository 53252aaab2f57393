use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::element::Element;
use crate::error::{Error, Result};
use crate::field::{FieldKind, FieldSpec};
use crate::page::{Page, POLL_INTERVAL};
use crate::resolve::ResolvedField;

/// Selectors that cover the option rows of the floating lists this tool
/// encounters (ARIA listboxes and Airtable's dropdown items).
const OPTION_ROW_SELECTOR: &str =
    "[role='option'], [role='menuitem'], [role='listbox'] li, .dropdownListItem";

/// One fill behavior per field kind group.
#[async_trait]
pub trait FillStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fill(
        &self,
        page: &Page,
        target: &ResolvedField,
        spec: &FieldSpec,
        timeout: Duration,
    ) -> Result<()>;
}

/// Strategy lookup by kind.
pub fn strategy_for(kind: FieldKind) -> &'static dyn FillStrategy {
    match kind {
        FieldKind::Date => &DateFill,
        FieldKind::Checkbox => &CheckboxFill,
        FieldKind::SingleSelect => &SingleSelectFill,
        FieldKind::MultiSelect => &MultiSelectFill,
        FieldKind::Attachment => &AttachmentFill,
        _ => &TextFill,
    }
}

/// Fill one resolved field, wrapping any interaction failure with the
/// field's label and kind.
pub async fn fill_field(
    page: &Page,
    target: &ResolvedField,
    spec: &FieldSpec,
    timeout: Duration,
) -> Result<()> {
    let strategy = strategy_for(spec.kind);
    tracing::debug!(label = %spec.label, strategy = strategy.name(), "applying fill strategy");
    strategy.fill(page, target, spec, timeout).await.map_err(|e| match e {
        wrapped @ Error::FillError { .. } => wrapped,
        cause => Error::FillError {
            label: spec.label.clone(),
            kind: spec.kind,
            cause: cause.to_string(),
        },
    })
}

fn text_value(spec: &FieldSpec) -> Result<String> {
    spec.value.as_text().ok_or_else(|| {
        Error::InputError(format!("field '{}' needs a string value", spec.label))
    })
}

/// Focus, clear whatever is there, then type the value.
struct TextFill;

#[async_trait]
impl FillStrategy for TextFill {
    fn name(&self) -> &'static str {
        "text"
    }

    async fn fill(
        &self,
        _page: &Page,
        target: &ResolvedField,
        spec: &FieldSpec,
        _timeout: Duration,
    ) -> Result<()> {
        let value = text_value(spec)?;
        let el = target.element();
        el.focus().await?;
        el.clear_value().await?;
        el.type_text(&value).await?;
        Ok(())
    }
}

/// Native date inputs reject keystroke sequences that don't match their
/// locale; setting the value directly in ISO form is the reliable path.
struct DateFill;

#[async_trait]
impl FillStrategy for DateFill {
    fn name(&self) -> &'static str {
        "date"
    }

    async fn fill(
        &self,
        _page: &Page,
        target: &ResolvedField,
        spec: &FieldSpec,
        _timeout: Duration,
    ) -> Result<()> {
        let value = text_value(spec)?;
        let el = target.element();
        el.focus().await?;
        el.set_value(&value).await?;
        Ok(())
    }
}

/// Click only when the desired state differs from the current one, so
/// filling the same boolean twice never toggles it back.
struct CheckboxFill;

#[async_trait]
impl FillStrategy for CheckboxFill {
    fn name(&self) -> &'static str {
        "checkbox"
    }

    async fn fill(
        &self,
        _page: &Page,
        target: &ResolvedField,
        spec: &FieldSpec,
        _timeout: Duration,
    ) -> Result<()> {
        let want = spec.value.as_flag().ok_or_else(|| {
            Error::InputError(format!("field '{}' needs a boolean value", spec.label))
        })?;
        let el = target.element();
        if el.is_checked().await? != want {
            el.click().await?;
        }
        Ok(())
    }
}

/// Open the trigger, wait for the floating list to render, click the option
/// whose visible text equals the value exactly.
struct SingleSelectFill;

#[async_trait]
impl FillStrategy for SingleSelectFill {
    fn name(&self) -> &'static str {
        "single_select"
    }

    async fn fill(
        &self,
        page: &Page,
        target: &ResolvedField,
        spec: &FieldSpec,
        timeout: Duration,
    ) -> Result<()> {
        let choice = text_value(spec)?;
        target.element().click().await?;
        let option = wait_for_option(page, &choice, timeout).await?;
        option.click().await?;
        Ok(())
    }
}

/// Select each value in order. The list re-renders after every pick, so the
/// trigger is re-opened per value and the list closed with Escape between
/// picks.
struct MultiSelectFill;

#[async_trait]
impl FillStrategy for MultiSelectFill {
    fn name(&self) -> &'static str {
        "multi_select"
    }

    async fn fill(
        &self,
        page: &Page,
        target: &ResolvedField,
        spec: &FieldSpec,
        timeout: Duration,
    ) -> Result<()> {
        let choices = spec.value.as_many().ok_or_else(|| {
            Error::InputError(format!("field '{}' needs a list value", spec.label))
        })?;
        for choice in choices {
            target.element().click().await?;
            let option = wait_for_option(page, choice, timeout).await?;
            option.click().await?;
            page.press_key("Escape").await?;
        }
        Ok(())
    }
}

/// Point the file input at an absolute path; a missing file is rejected
/// before the browser is touched.
struct AttachmentFill;

#[async_trait]
impl FillStrategy for AttachmentFill {
    fn name(&self) -> &'static str {
        "attachment"
    }

    async fn fill(
        &self,
        page: &Page,
        target: &ResolvedField,
        spec: &FieldSpec,
        _timeout: Duration,
    ) -> Result<()> {
        let raw = text_value(spec)?;
        let path = std::fs::canonicalize(PathBuf::from(&raw))
            .map_err(|_| Error::InputError(format!("attachment file not found: {raw}")))?;
        page.set_input_files(target.element(), &path).await?;
        Ok(())
    }
}

/// Poll for an option row whose visible text equals `choice` exactly.
/// No fuzzy or partial matching: a missing option fails loudly rather than
/// silently picking the wrong one.
async fn wait_for_option(page: &Page, choice: &str, timeout: Duration) -> Result<Element> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(options) = page.find_elements(OPTION_ROW_SELECTOR).await {
            for option in options {
                if option.inner_text().await.unwrap_or_default().trim() == choice {
                    return Ok(option);
                }
            }
        }
        if Instant::now() >= deadline {
            return Err(Error::Timeout(format!(
                "no option with exact text '{choice}'"
            )));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
