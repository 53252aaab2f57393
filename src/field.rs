use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The supported form field kinds. Anything outside this list is rejected
/// when the data file is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    LongText,
    Email,
    Url,
    Tel,
    Number,
    Date,
    Checkbox,
    SingleSelect,
    MultiSelect,
    Attachment,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::LongText => "long_text",
            FieldKind::Email => "email",
            FieldKind::Url => "url",
            FieldKind::Tel => "tel",
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::Checkbox => "checkbox",
            FieldKind::SingleSelect => "single_select",
            FieldKind::MultiSelect => "multi_select",
            FieldKind::Attachment => "attachment",
        }
    }

    /// Kinds that are filled by typing into a native input or textarea.
    pub fn is_text_like(&self) -> bool {
        matches!(
            self,
            FieldKind::Text
                | FieldKind::LongText
                | FieldKind::Email
                | FieldKind::Url
                | FieldKind::Tel
                | FieldKind::Number
        )
    }

    /// Kinds rendered as a custom trigger that opens a floating option list.
    pub fn is_select(&self) -> bool {
        matches!(self, FieldKind::SingleSelect | FieldKind::MultiSelect)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value to place into a field. Untagged: the JSON shape decides the
/// variant, and `FieldSpec::validate` decides whether that shape fits the kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
    Many(Vec<String>),
}

impl FieldValue {
    /// The value rendered as the string to type. Numbers drop a trailing
    /// `.0` so `42` types as "42", not "42.0".
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_many(&self) -> Option<&[String]> {
        match self {
            FieldValue::Many(items) => Some(items),
            _ => None,
        }
    }
}

/// One declarative field to fill: visible label text, kind, and value.
/// The JSON key for the kind is `type`, matching the data files this tool
/// consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub value: FieldValue,
}

impl FieldSpec {
    /// Reject a value whose shape does not match the kind. Runs before any
    /// browser interaction is attempted.
    pub fn validate(&self) -> Result<()> {
        let ok = match self.kind {
            k if k.is_text_like() => {
                matches!(self.value, FieldValue::Text(_) | FieldValue::Number(_))
            }
            FieldKind::Date | FieldKind::SingleSelect | FieldKind::Attachment => {
                matches!(self.value, FieldValue::Text(_))
            }
            FieldKind::Checkbox => matches!(self.value, FieldValue::Flag(_)),
            FieldKind::MultiSelect => matches!(self.value, FieldValue::Many(_)),
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::InputError(format!(
                "value for field '{}' does not match kind {}",
                self.label, self.kind
            )))
        }
    }
}

/// Load the declarative field list from a JSON array file.
pub fn load_fields(path: &Path) -> Result<Vec<FieldSpec>> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map_err(|e| Error::InputError(format!("invalid field data in {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<FieldSpec> {
        serde_json::from_str(json).expect("valid field JSON")
    }

    #[test]
    fn parses_declarative_field_list() {
        let fields = parse(r#"[{"label":"Full Name","type":"text","value":"Ada Lovelace"}]"#);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].label, "Full Name");
        assert_eq!(fields[0].kind, FieldKind::Text);
        assert_eq!(fields[0].value.as_text().as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn parses_every_value_shape() {
        let fields = parse(
            r#"[
                {"label":"Agree","type":"checkbox","value":true},
                {"label":"Age","type":"number","value":42},
                {"label":"Topics","type":"multi_select","value":["One","Two"]}
            ]"#,
        );
        assert_eq!(fields[0].value.as_flag(), Some(true));
        assert_eq!(fields[1].value.as_text().as_deref(), Some("42"));
        assert_eq!(
            fields[2].value.as_many(),
            Some(&["One".to_string(), "Two".to_string()][..])
        );
        for f in &fields {
            f.validate().expect("shape matches kind");
        }
    }

    #[test]
    fn rejects_boolean_for_single_select() {
        let fields = parse(r#"[{"label":"Country","type":"single_select","value":true}]"#);
        let err = fields[0].validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Country"), "message was: {msg}");
        assert!(msg.contains("single_select"), "message was: {msg}");
    }

    #[test]
    fn rejects_scalar_for_multi_select() {
        let fields = parse(r#"[{"label":"Topics","type":"multi_select","value":"One"}]"#);
        assert!(fields[0].validate().is_err());
    }

    #[test]
    fn rejects_string_for_checkbox() {
        let fields = parse(r#"[{"label":"Agree","type":"checkbox","value":"yes"}]"#);
        assert!(fields[0].validate().is_err());
    }

    #[test]
    fn rejects_unknown_kind_at_parse_time() {
        let result: std::result::Result<Vec<FieldSpec>, _> =
            serde_json::from_str(r#"[{"label":"X","type":"signature","value":"y"}]"#);
        assert!(result.is_err());
    }

    #[test]
    fn fractional_numbers_keep_their_fraction() {
        let fields = parse(r#"[{"label":"Score","type":"number","value":3.5}]"#);
        assert_eq!(fields[0].value.as_text().as_deref(), Some("3.5"));
    }
}
