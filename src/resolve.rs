use std::time::{Duration, Instant};

use crate::element::Element;
use crate::error::{Error, Result};
use crate::field::FieldKind;
use crate::page::{Page, POLL_INTERVAL};

/// The element a label resolved to. Native kinds resolve straight to the
/// input; select kinds resolve to the trigger that opens the floating option
/// list, because the list itself is not in the document until the trigger is
/// activated.
pub enum ResolvedField {
    Input(Element),
    Trigger(Element),
}

impl ResolvedField {
    pub fn element(&self) -> &Element {
        match self {
            ResolvedField::Input(el) | ResolvedField::Trigger(el) => el,
        }
    }
}

/// Find the interactive element for a field label.
///
/// Label matching is case-sensitive exact text; an approximate label fails
/// resolution rather than risking a silent mis-fill. When several elements
/// carry the same label, the first in document order wins. Polls until the
/// element appears or `timeout` expires.
pub async fn resolve(
    page: &Page,
    label: &str,
    kind: FieldKind,
    timeout: Duration,
) -> Result<ResolvedField> {
    let candidates = xpath_candidates(label, kind);
    let deadline = Instant::now() + timeout;
    loop {
        for xpath in &candidates {
            if let Ok(el) = page.find_xpath(xpath).await {
                return Ok(if kind.is_select() {
                    ResolvedField::Trigger(el)
                } else {
                    ResolvedField::Input(el)
                });
            }
        }
        if Instant::now() >= deadline {
            return Err(Error::FieldNotFound {
                label: label.to_string(),
                kind,
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// XPath candidates for a label, most specific first. `normalize-space()`
/// keeps surrounding whitespace out of the comparison without relaxing the
/// exact-text match.
fn xpath_candidates(label: &str, kind: FieldKind) -> Vec<String> {
    let lit = xpath_literal(label);
    match kind {
        FieldKind::Checkbox => vec![
            format!("//label[normalize-space()={lit}]//input[@type='checkbox']"),
            format!("//label[normalize-space()={lit}]/following::input[@type='checkbox'][1]"),
            format!("//input[@type='checkbox' and @aria-label={lit}]"),
        ],
        FieldKind::Attachment => vec![
            format!("//label[normalize-space()={lit}]//input[@type='file']"),
            format!("//label[normalize-space()={lit}]/following::input[@type='file'][1]"),
            format!("//input[@type='file' and @aria-label={lit}]"),
        ],
        FieldKind::SingleSelect | FieldKind::MultiSelect => vec![
            format!(
                "//label[normalize-space()={lit}]/following::*\
                 [self::input or self::textarea or self::select or self::button][1]"
            ),
            format!("//*[@role='combobox' and @aria-label={lit}]"),
            // Clicking the label itself focuses the widget on forms that
            // render the trigger as a plain div.
            format!("//label[normalize-space()={lit}]"),
        ],
        _ => vec![
            format!("//label[normalize-space()={lit}]/following::input[1]"),
            format!("//label[normalize-space()={lit}]/following::textarea[1]"),
            format!("//label[normalize-space()={lit}]//input"),
            format!("//label[normalize-space()={lit}]//textarea"),
            format!("//input[@aria-label={lit}]"),
            format!("//textarea[@aria-label={lit}]"),
        ],
    }
}

/// Render a string as an XPath literal, surviving embedded quotes of either
/// kind via concat().
pub(crate) fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        return format!("'{s}'");
    }
    if !s.contains('"') {
        return format!("\"{s}\"");
    }
    let mut parts = Vec::new();
    for (i, piece) in s.split('\'').enumerate() {
        if i > 0 {
            parts.push("\"'\"".to_string());
        }
        if !piece.is_empty() {
            parts.push(format!("'{piece}'"));
        }
    }
    format!("concat({})", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_labels_use_single_quotes() {
        assert_eq!(xpath_literal("Full Name"), "'Full Name'");
    }

    #[test]
    fn apostrophes_switch_to_double_quotes() {
        assert_eq!(xpath_literal("Parent's Email"), "\"Parent's Email\"");
    }

    #[test]
    fn mixed_quotes_fall_back_to_concat() {
        assert_eq!(
            xpath_literal(r#"The "best" school's name"#),
            r#"concat('The "best" school', "'", 's name')"#
        );
    }

    #[test]
    fn text_kinds_prefer_the_following_input() {
        let candidates = xpath_candidates("Full Name", FieldKind::Text);
        assert_eq!(
            candidates[0],
            "//label[normalize-space()='Full Name']/following::input[1]"
        );
        assert!(candidates.iter().any(|c| c.contains("textarea")));
    }

    #[test]
    fn checkbox_kind_targets_checkbox_inputs_only() {
        let candidates = xpath_candidates("I agree", FieldKind::Checkbox);
        assert!(candidates.iter().all(|c| c.contains("@type='checkbox'")
            || c.contains("aria-label")));
    }

    #[test]
    fn attachment_kind_targets_file_inputs() {
        let candidates = xpath_candidates("Transcript", FieldKind::Attachment);
        assert!(candidates[0].contains("@type='file'"));
    }

    #[test]
    fn select_kinds_include_the_bare_label_fallback() {
        let candidates = xpath_candidates("Country", FieldKind::SingleSelect);
        assert_eq!(
            candidates.last().map(String::as_str),
            Some("//label[normalize-space()='Country']")
        );
    }
}
