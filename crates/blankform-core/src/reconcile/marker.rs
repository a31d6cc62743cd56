use serde::{Deserialize, Serialize};

use crate::error::{FormError, UnresolvedMarker};
use crate::model::{FieldKind, FieldValue, Line};
use crate::reconcile::Rendering;

/// Identifies a field region by its kind and the raw text it replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerTag {
    pub kind: FieldKind,
    pub template: String,
}

impl MarkerTag {
    pub fn new(kind: FieldKind, template: impl Into<String>) -> Self {
        MarkerTag {
            kind,
            template: template.into(),
        }
    }
}

/// One edited value, addressed by marker rather than by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerValue {
    pub value: FieldValue,
    pub marker: MarkerTag,
}

enum Piece<'a> {
    Fixed(&'a str),
    Pending { kind: FieldKind, template: &'a str },
    Filled(String),
}

/// Replace, for each pair in order, the first still-pending occurrence of
/// its marker across the document. Each occurrence is consumed at most once.
///
/// Pairs that find no occurrence are logged and skipped; the rest are still
/// applied, then the whole submission fails listing every unresolved pair.
pub fn reconcile(
    lines: &[Line],
    pairs: &[MarkerValue],
    rendering: &Rendering,
) -> Result<Vec<String>, FormError> {
    let mut pieces: Vec<Vec<Piece>> = lines
        .iter()
        .map(|line| {
            line.segments
                .iter()
                .map(|segment| match segment.field_kind() {
                    Some(kind) => Piece::Pending {
                        kind,
                        template: segment.content(),
                    },
                    None => Piece::Fixed(segment.content()),
                })
                .collect()
        })
        .collect();

    let mut unresolved = Vec::new();
    for (index, pair) in pairs.iter().enumerate() {
        let rendered = rendering
            .render(pair.marker.kind, &pair.marker.template, &pair.value)
            .ok_or_else(|| FormError::ValueKindMismatch {
                field: format!("marker #{index} {:?}", pair.marker.template),
            })?;

        match first_pending(&mut pieces, &pair.marker) {
            Some(slot) => *slot = Piece::Filled(rendered),
            None => {
                tracing::warn!(
                    index,
                    template = %pair.marker.template,
                    "no unconsumed occurrence of marker"
                );
                unresolved.push(UnresolvedMarker {
                    index,
                    template: pair.marker.template.clone(),
                });
            }
        }
    }

    if !unresolved.is_empty() {
        return Err(FormError::UnresolvedMarkers(unresolved));
    }

    Ok(pieces
        .iter()
        .map(|line| {
            line.iter()
                .map(|piece| match piece {
                    Piece::Fixed(text) => *text,
                    Piece::Pending { template, .. } => *template,
                    Piece::Filled(text) => text.as_str(),
                })
                .collect()
        })
        .collect())
}

fn first_pending<'p, 'a>(
    pieces: &'p mut [Vec<Piece<'a>>],
    marker: &MarkerTag,
) -> Option<&'p mut Piece<'a>> {
    pieces.iter_mut().flatten().find(|piece| {
        matches!(piece, Piece::Pending { kind, template }
            if *kind == marker.kind && *template == marker.template)
    })
}
