use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Paragraph alignment as reported by the document model. Written as
/// `"LEFT"`, `"CENTER"`, ...; read with [`Alignment::from_str_loose`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Alignment::Left => "LEFT",
            Alignment::Center => "CENTER",
            Alignment::Right => "RIGHT",
            Alignment::Justify => "JUSTIFY",
        })
    }
}

impl Alignment {
    /// Accepts the usual spellings from word-processing models ("both" is OOXML for justify).
    pub fn from_str_loose(s: &str) -> Alignment {
        match s.trim().to_lowercase().as_str() {
            "center" | "centre" => Alignment::Center,
            "right" | "end" => Alignment::Right,
            "justify" | "both" | "distribute" => Alignment::Justify,
            _ => Alignment::Left,
        }
    }
}

impl<'de> Deserialize<'de> for Alignment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Alignment::from_str_loose(&raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    TextField,
    Checkbox,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            FieldKind::TextField => "text",
            FieldKind::Checkbox => "checkbox",
        })
    }
}

/// An edited (or initial) field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Checked(bool),
    Text(String),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Checked(_) => FieldKind::Checkbox,
            FieldValue::Text(_) => FieldKind::TextField,
        }
    }

    /// The value a cleared form shows for a field of `kind`.
    pub fn cleared(kind: FieldKind) -> FieldValue {
        match kind {
            FieldKind::TextField => FieldValue::Text(String::new()),
            FieldKind::Checkbox => FieldValue::Checked(false),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Checked(true) => write!(f, "[x]"),
            FieldValue::Checked(false) => write!(f, "[ ]"),
            FieldValue::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// One classified run of paragraph text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    StaticText {
        content: String,
    },
    TextField {
        /// Raw matched text, exactly as it appears in the paragraph.
        content: String,
        /// What an editor shows initially: the content without its leading colon.
        original_value: String,
    },
    Checkbox {
        checked: bool,
        content: String,
    },
}

impl Segment {
    pub fn text_field(content: impl Into<String>) -> Segment {
        let content = content.into();
        let original_value = content.strip_prefix(':').unwrap_or(&content).to_string();
        Segment::TextField {
            content,
            original_value,
        }
    }

    pub fn checkbox(content: impl Into<String>) -> Segment {
        let content = content.into();
        Segment::Checkbox {
            checked: content.contains(['x', 'X']),
            content,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Segment::StaticText { content }
            | Segment::TextField { content, .. }
            | Segment::Checkbox { content, .. } => content,
        }
    }

    /// `None` for static text.
    pub fn field_kind(&self) -> Option<FieldKind> {
        match self {
            Segment::StaticText { .. } => None,
            Segment::TextField { .. } => Some(FieldKind::TextField),
            Segment::Checkbox { .. } => Some(FieldKind::Checkbox),
        }
    }

    pub fn is_field(&self) -> bool {
        self.field_kind().is_some()
    }

    pub fn initial_value(&self) -> Option<FieldValue> {
        match self {
            Segment::StaticText { .. } => None,
            Segment::TextField { original_value, .. } => {
                Some(FieldValue::Text(original_value.clone()))
            }
            Segment::Checkbox { checked, .. } => Some(FieldValue::Checked(*checked)),
        }
    }
}

/// One tokenized paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub segments: Vec<Segment>,
    pub alignment: Alignment,
}

impl Line {
    /// Concatenation of all segment contents; equals the source paragraph.
    pub fn text(&self) -> String {
        self.segments.iter().map(Segment::content).collect()
    }

    pub fn fields(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.is_field())
    }

    pub fn field_count(&self) -> usize {
        self.fields().count()
    }

    pub fn has_fields(&self) -> bool {
        self.segments.iter().any(Segment::is_field)
    }

    pub fn initial_values(&self) -> Vec<FieldValue> {
        self.segments
            .iter()
            .filter_map(Segment::initial_value)
            .collect()
    }

    pub fn cleared_values(&self) -> Vec<FieldValue> {
        self.fields()
            .filter_map(Segment::field_kind)
            .map(FieldValue::cleared)
            .collect()
    }
}

/// Axis-aligned box in page space, y growing downwards (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BBox {
    pub fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        BBox {
            x_min,
            y_min,
            x_max,
            y_max,
        }
        .normalized()
    }

    /// Swaps inverted corners so that `x_min <= x_max` and `y_min <= y_max`.
    pub fn normalized(self) -> Self {
        BBox {
            x_min: self.x_min.min(self.x_max),
            y_min: self.y_min.min(self.y_max),
            x_max: self.x_min.max(self.x_max),
            y_max: self.y_min.max(self.y_max),
        }
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }
}

/// A field recovered from page geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedField {
    pub kind: FieldKind,
    /// Zero-based page index.
    pub page: usize,
    pub bbox: BBox,
    pub value: FieldValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    /// Matched text on the page.
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_field_strips_leading_colon_only() {
        let seg = Segment::text_field(": João");
        assert_eq!(
            seg,
            Segment::TextField {
                content: ": João".into(),
                original_value: " João".into(),
            }
        );
        let seg = Segment::text_field("_____");
        assert_eq!(seg.initial_value(), Some(FieldValue::Text("_____".into())));
    }

    #[test]
    fn test_checkbox_checked_state() {
        assert_eq!(Segment::checkbox("( X )").initial_value(), Some(FieldValue::Checked(true)));
        assert_eq!(Segment::checkbox("(x)").initial_value(), Some(FieldValue::Checked(true)));
        assert_eq!(Segment::checkbox("(  )").initial_value(), Some(FieldValue::Checked(false)));
    }

    #[test]
    fn test_line_values() {
        let line = Line {
            segments: vec![
                Segment::StaticText {
                    content: "A ".into(),
                },
                Segment::text_field("___"),
                Segment::checkbox("(x)"),
            ],
            alignment: Alignment::Left,
        };
        assert_eq!(line.text(), "A ___(x)");
        assert_eq!(line.field_count(), 2);
        assert_eq!(
            line.cleared_values(),
            vec![FieldValue::Text(String::new()), FieldValue::Checked(false)]
        );
    }

    #[test]
    fn test_bbox_union_and_normalize() {
        let a = BBox::new(15.0, 20.0, 10.0, 10.0);
        assert_eq!(a, BBox::new(10.0, 10.0, 15.0, 20.0));
        let b = BBox::new(15.0, 10.0, 22.0, 20.0);
        assert_eq!(a.union(&b), BBox::new(10.0, 10.0, 22.0, 20.0));
        assert_eq!(a.union(&b).width(), 12.0);
    }

    #[test]
    fn test_alignment_loose() {
        assert_eq!(Alignment::from_str_loose("both"), Alignment::Justify);
        assert_eq!(Alignment::from_str_loose("CENTER"), Alignment::Center);
        assert_eq!(Alignment::from_str_loose(""), Alignment::Left);
    }

    #[test]
    fn test_field_value_json_shape() {
        let values: Vec<FieldValue> = serde_json::from_str(r#"["42", true]"#).unwrap();
        assert_eq!(
            values,
            vec![FieldValue::Text("42".into()), FieldValue::Checked(true)]
        );
    }
}
