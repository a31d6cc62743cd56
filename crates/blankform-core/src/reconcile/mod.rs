pub mod marker;
pub mod positional;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FormError;
use crate::model::{FieldKind, FieldValue, Line};

pub use marker::{MarkerTag, MarkerValue};

/// How edited values find their way back into the text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One value per field, line by line, in field order.
    #[default]
    Positional,
    /// `(value, marker)` pairs matched against the first unconsumed
    /// occurrence of the marker's template.
    #[serde(alias = "marker")]
    MarkerToken,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Positional => write!(f, "positional"),
            Strategy::MarkerToken => write!(f, "marker_token"),
        }
    }
}

impl FromStr for Strategy {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "positional" => Ok(Strategy::Positional),
            "marker" | "marker_token" => Ok(Strategy::MarkerToken),
            other => Err(FormError::Config(format!(
                "unknown reconciliation strategy '{other}'"
            ))),
        }
    }
}

/// Edited values, shaped for the strategy that will apply them.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// One sequence per line, one value per field of that line.
    Positional(Vec<Vec<FieldValue>>),
    Markers(Vec<MarkerValue>),
}

impl Submission {
    pub fn strategy(&self) -> Strategy {
        match self {
            Submission::Positional(_) => Strategy::Positional,
            Submission::Markers(_) => Strategy::MarkerToken,
        }
    }

    /// Empty text and unchecked boxes everywhere.
    pub fn cleared(lines: &[Line], strategy: Strategy) -> Submission {
        match strategy {
            Strategy::Positional => {
                Submission::Positional(lines.iter().map(Line::cleared_values).collect())
            }
            Strategy::MarkerToken => Submission::Markers(
                lines
                    .iter()
                    .flat_map(|line| {
                        line.fields()
                            .zip(line.cleared_values())
                            .filter_map(|(segment, value)| {
                                let kind = segment.field_kind()?;
                                Some(MarkerValue {
                                    value,
                                    marker: MarkerTag::new(kind, segment.content()),
                                })
                            })
                            .collect::<Vec<_>>()
                    })
                    .collect(),
            ),
        }
    }
}

/// How field values are written back as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendering {
    /// Emitted for a text field left empty, so the blank stays visible.
    pub blank_filler: String,
    pub checked: String,
    pub unchecked: String,
}

impl Default for Rendering {
    fn default() -> Self {
        Rendering {
            blank_filler: "_".repeat(10),
            checked: "( X )".into(),
            unchecked: "(  )".into(),
        }
    }
}

impl Rendering {
    /// `original` is the raw matched text of the field; a leading colon in it
    /// is re-emitted before the value. An empty value gets the filler, except
    /// for a bare `:` field, which had no blank to begin with.
    pub fn text_field(&self, original: &str, value: &str) -> String {
        let mut out = String::new();
        if original.starts_with(':') {
            out.push(':');
        }
        out.push_str(value);
        if value.is_empty() && original != ":" {
            out.push_str(&self.blank_filler);
        }
        out
    }

    pub fn checkbox(&self, checked: bool) -> String {
        if checked {
            self.checked.clone()
        } else {
            self.unchecked.clone()
        }
    }

    /// `None` when `value` is the wrong kind for the field.
    pub fn render(&self, kind: FieldKind, original: &str, value: &FieldValue) -> Option<String> {
        match (kind, value) {
            (FieldKind::TextField, FieldValue::Text(text)) => Some(self.text_field(original, text)),
            (FieldKind::Checkbox, FieldValue::Checked(checked)) => Some(self.checkbox(*checked)),
            _ => None,
        }
    }
}

/// Write edited values back into the lines, returning one text per line.
///
/// Nothing is returned unless every value was placed; the caller only saves
/// on success, so a failed submission leaves the document untouched.
pub fn submit_values(
    lines: &[Line],
    submission: &Submission,
    rendering: &Rendering,
) -> Result<Vec<String>, FormError> {
    tracing::debug!(
        strategy = %submission.strategy(),
        lines = lines.len(),
        "submitting values"
    );
    match submission {
        Submission::Positional(values) => positional::reconcile(lines, values, rendering),
        Submission::Markers(pairs) => marker::reconcile(lines, pairs, rendering),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Alignment, Segment};

    #[test]
    fn test_text_field_rendering() {
        let r = Rendering::default();
        assert_eq!(r.text_field("_____", "42"), "42");
        assert_eq!(r.text_field("_____", ""), "__________");
        assert_eq!(r.text_field(": Nome", " Ana"), ": Ana");
        assert_eq!(r.text_field(":", ""), ":");
    }

    #[test]
    fn test_cleared_colon_field_keeps_visible_blank() {
        let r = Rendering::default();
        assert_eq!(r.text_field(":     ", ""), ":__________");
        assert_eq!(r.text_field(": Ana Lima", ""), ":__________");
        assert_eq!(r.text_field(":     ", "Ana"), ":Ana");
    }

    #[test]
    fn test_kind_mismatch_renders_nothing() {
        let r = Rendering::default();
        assert_eq!(r.render(FieldKind::Checkbox, "( )", &FieldValue::Checked(true)), Some("( X )".into()));
        assert_eq!(r.render(FieldKind::Checkbox, "( )", &FieldValue::Text("x".into())), None);
        assert_eq!(r.render(FieldKind::TextField, "__", &FieldValue::Checked(false)), None);
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!("marker".parse::<Strategy>().unwrap(), Strategy::MarkerToken);
        assert_eq!("Marker-Token".parse::<Strategy>().unwrap(), Strategy::MarkerToken);
        assert_eq!("positional".parse::<Strategy>().unwrap(), Strategy::Positional);
        assert!(matches!("guess".parse::<Strategy>(), Err(FormError::Config(_))));
        assert_eq!(Strategy::default(), Strategy::Positional);
    }

    #[test]
    fn test_cleared_submission_per_strategy() {
        let lines = vec![
            Line {
                segments: vec![Segment::text_field("___"), Segment::checkbox("(x)")],
                alignment: Alignment::Left,
            },
            Line {
                segments: vec![Segment::StaticText { content: "fim".into() }],
                alignment: Alignment::Left,
            },
        ];

        let Submission::Positional(values) = Submission::cleared(&lines, Strategy::Positional) else {
            panic!("expected positional submission");
        };
        assert_eq!(values.len(), 2);
        assert!(values[1].is_empty());

        let Submission::Markers(pairs) = Submission::cleared(&lines, Strategy::MarkerToken) else {
            panic!("expected marker submission");
        };
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].marker, MarkerTag::new(FieldKind::Checkbox, "(x)"));
        assert_eq!(pairs[1].value, FieldValue::Checked(false));
    }
}
