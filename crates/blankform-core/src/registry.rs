use serde::{Deserialize, Serialize};

use crate::config::RenderConfig;
use crate::model::{BBox, FieldKind, FieldValue, Line, PositionedField, Segment};
use crate::reconcile::MarkerTag;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// Arguments a renderer needs to build the control for a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<Padding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    /// Lets the renderer hand values back for marker-token reconciliation.
    pub marker: MarkerTag,
}

/// Where a field came from in the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FieldOrigin {
    /// `slot` counts fields (not segments) within the line.
    Paragraph { line: usize, slot: usize },
    Page { page: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub component: FieldKind,
    pub args: ConstructionArgs,
    pub initial_value: FieldValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,
    pub origin: FieldOrigin,
}

/// Order-stable, single-pass sequence of field descriptors.
///
/// Pulling a descriptor hands the caller its own copy. Stepping back is only
/// for undo in the UI; the registry is never re-filled in place, a new
/// extraction produces a new registry.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: Vec<FieldDescriptor>,
    cursor: usize,
}

impl FieldRegistry {
    pub fn from_descriptors(fields: Vec<FieldDescriptor>) -> Self {
        FieldRegistry { fields, cursor: 0 }
    }

    /// Paragraph mode: fields in line order, then slot order.
    pub fn from_lines(lines: &[Line], render: &RenderConfig) -> Self {
        let mut fields = Vec::new();
        for (line_index, line) in lines.iter().enumerate() {
            for (slot, segment) in line.fields().enumerate() {
                if let Some(descriptor) = paragraph_descriptor(line_index, slot, segment, render) {
                    fields.push(descriptor);
                }
            }
        }
        Self::from_descriptors(fields)
    }

    /// Layout mode: keeps the page/vertical/horizontal order of `fields`.
    pub fn from_positioned(fields: Vec<PositionedField>) -> Self {
        Self::from_descriptors(fields.into_iter().map(positioned_descriptor).collect())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of descriptors already pulled.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// All descriptors, regardless of the cursor.
    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Step back one field; the next pull yields it again.
    pub fn previous(&mut self) -> Option<FieldDescriptor> {
        self.cursor = self.cursor.checked_sub(1)?;
        self.fields.get(self.cursor).cloned()
    }

    /// The most recently pulled descriptor.
    pub fn peek_back(&self) -> Option<&FieldDescriptor> {
        self.fields.get(self.cursor.checked_sub(1)?)
    }
}

impl Iterator for FieldRegistry {
    type Item = FieldDescriptor;

    fn next(&mut self) -> Option<FieldDescriptor> {
        let descriptor = self.fields.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(descriptor)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.fields.len() - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FieldRegistry {}

fn paragraph_descriptor(
    line: usize,
    slot: usize,
    segment: &Segment,
    render: &RenderConfig,
) -> Option<FieldDescriptor> {
    let component = segment.field_kind()?;
    let initial_value = segment.initial_value()?;
    let marker = MarkerTag::new(component, segment.content());

    let args = match component {
        FieldKind::TextField => {
            let chars = segment.content().chars().count() as f32;
            ConstructionArgs {
                width: Some((chars * render.char_width).max(render.min_width)),
                height: Some(render.height),
                padding: Some(render.padding),
                font_size: None,
                marker,
            }
        }
        FieldKind::Checkbox => ConstructionArgs {
            width: None,
            height: None,
            padding: None,
            font_size: None,
            marker,
        },
    };

    Some(FieldDescriptor {
        component,
        args,
        initial_value,
        bbox: None,
        origin: FieldOrigin::Paragraph { line, slot },
    })
}

fn positioned_descriptor(field: PositionedField) -> FieldDescriptor {
    FieldDescriptor {
        component: field.kind,
        args: ConstructionArgs {
            width: Some(field.bbox.width()),
            height: Some(field.bbox.height()),
            padding: None,
            font_size: field.font_size,
            marker: MarkerTag::new(field.kind, field.text),
        },
        initial_value: field.value,
        bbox: Some(field.bbox),
        origin: FieldOrigin::Page { page: field.page },
    }
}
