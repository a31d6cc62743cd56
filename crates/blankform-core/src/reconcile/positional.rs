use crate::error::FormError;
use crate::model::{FieldValue, Line, Segment};
use crate::reconcile::Rendering;

/// Rebuild each line, substituting its values into its field slots in order.
pub fn reconcile(
    lines: &[Line],
    values: &[Vec<FieldValue>],
    rendering: &Rendering,
) -> Result<Vec<String>, FormError> {
    if values.len() != lines.len() {
        return Err(FormError::LineCountMismatch {
            expected: lines.len(),
            found: values.len(),
        });
    }

    // Check every arity before rendering anything.
    for (index, (line, line_values)) in lines.iter().zip(values).enumerate() {
        let expected = line.field_count();
        if line_values.len() != expected {
            return Err(FormError::ValueCountMismatch {
                line: index,
                expected,
                found: line_values.len(),
            });
        }
    }

    lines
        .iter()
        .zip(values)
        .enumerate()
        .map(|(index, (line, line_values))| rebuild_line(index, line, line_values, rendering))
        .collect()
}

fn rebuild_line(
    index: usize,
    line: &Line,
    values: &[FieldValue],
    rendering: &Rendering,
) -> Result<String, FormError> {
    let mut values = values.iter();
    let mut out = String::new();

    for segment in &line.segments {
        let Some(kind) = segment.field_kind() else {
            out.push_str(segment.content());
            continue;
        };
        let value = values.next().ok_or(FormError::ValueCountMismatch {
            line: index,
            expected: line.field_count(),
            found: 0,
        })?;
        let rendered = rendering
            .render(kind, segment.content(), value)
            .ok_or_else(|| FormError::ValueKindMismatch {
                field: describe(index, segment),
            })?;
        out.push_str(&rendered);
    }

    Ok(out)
}

fn describe(line: usize, segment: &Segment) -> String {
    format!("line {line} {:?}", segment.content())
}

/// Spread a flat, document-ordered value list over the lines it belongs to.
pub fn group_by_line(lines: &[Line], flat: Vec<FieldValue>) -> Result<Vec<Vec<FieldValue>>, FormError> {
    let total: usize = lines.iter().map(Line::field_count).sum();
    if flat.len() != total {
        return Err(FormError::ValueCountMismatch {
            line: lines.len(),
            expected: total,
            found: flat.len(),
        });
    }

    let mut flat = flat.into_iter();
    Ok(lines
        .iter()
        .map(|line| flat.by_ref().take(line.field_count()).collect())
        .collect())
}
