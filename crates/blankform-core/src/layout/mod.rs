use rayon::prelude::*;

use crate::error::FormError;
use crate::extraction::{LayoutSource, PageGlyphs, TextLine};
use crate::model::{FieldKind, FieldValue, PositionedField, Segment};
use crate::parsing::catalog::Catalog;

/// Result of one page worker. A failed page is reported explicitly rather
/// than as an empty page.
#[derive(Debug)]
pub enum PageOutcome {
    Located {
        page: usize,
        fields: Vec<PositionedField>,
    },
    Failed {
        page: usize,
        error: FormError,
    },
}

impl PageOutcome {
    pub fn page(&self) -> usize {
        match self {
            PageOutcome::Located { page, .. } | PageOutcome::Failed { page, .. } => *page,
        }
    }
}

/// Match the catalog against one line of glyphs and box every match.
pub fn locate_line(
    page: usize,
    line: &TextLine,
    catalog: &Catalog,
) -> Result<Vec<PositionedField>, FormError> {
    let mut text = String::new();
    let mut offsets = Vec::with_capacity(line.glyphs.len());
    for glyph in &line.glyphs {
        offsets.push(text.len());
        text.push(glyph.ch);
    }

    let mut fields = Vec::new();
    for span in catalog.find_spans(&text)? {
        let first = offsets.partition_point(|&o| o < span.range.start);
        let last = offsets.partition_point(|&o| o < span.range.end);
        let covered = &line.glyphs[first..last];
        let Some((head, tail)) = covered.split_first() else {
            continue;
        };

        let bbox = tail
            .iter()
            .fold(head.bbox.normalized(), |acc, g| acc.union(&g.bbox.normalized()));
        let matched = text[span.range.clone()].to_string();

        let (value, font_size) = match span.kind() {
            FieldKind::TextField => {
                let tallest = covered
                    .iter()
                    .map(|g| g.bbox.normalized().height())
                    .fold(0.0_f32, f32::max);
                let value = Segment::text_field(matched.as_str())
                    .initial_value()
                    .unwrap_or_else(|| FieldValue::Text(matched.clone()));
                (value, Some(tallest))
            }
            FieldKind::Checkbox => {
                let checked = covered.iter().any(|g| matches!(g.ch, 'x' | 'X'));
                (FieldValue::Checked(checked), None)
            }
        };

        fields.push(PositionedField {
            kind: span.kind(),
            page,
            bbox,
            value,
            font_size,
            text: matched,
        });
    }

    Ok(fields)
}

/// Locate every field on a page in reading order: lines top-to-bottom by
/// their highest glyph, fields left-to-right within and across lines that
/// share a top.
pub fn locate_page(
    page: usize,
    glyphs: &PageGlyphs,
    catalog: &Catalog,
) -> Result<Vec<PositionedField>, FormError> {
    let mut keyed = Vec::new();
    for line in &glyphs.lines {
        let top = line_top(line);
        for field in locate_line(page, line, catalog)? {
            keyed.push((top, field));
        }
    }
    // A field's own bbox is not used for the vertical key: glyph runs of
    // different heights on one line would otherwise reorder it.
    keyed.sort_by(|(a_top, a), (b_top, b)| {
        a_top
            .total_cmp(b_top)
            .then(a.bbox.x_min.total_cmp(&b.bbox.x_min))
    });
    Ok(keyed.into_iter().map(|(_, field)| field).collect())
}

fn line_top(line: &TextLine) -> f32 {
    line.glyphs
        .iter()
        .map(|g| g.bbox.normalized().y_min)
        .fold(f32::INFINITY, f32::min)
}

/// Run one worker per page. Workers may finish in any order; the returned
/// outcomes are always in page order, one slot per page.
pub fn locate_pages<S>(
    source: &S,
    catalog: &Catalog,
    parallel: bool,
) -> Result<Vec<PageOutcome>, FormError>
where
    S: LayoutSource + ?Sized,
{
    let count = source
        .page_count()
        .map_err(|e| FormError::UnreadableDocument(e.to_string()))?;
    tracing::debug!(
        backend = source.backend_name(),
        pages = count,
        parallel,
        "locating fields"
    );

    let work = |page: usize| -> PageOutcome {
        match source
            .page(page)
            .and_then(|glyphs| locate_page(page, &glyphs, catalog))
        {
            Ok(fields) => {
                tracing::debug!(page, fields = fields.len(), "page located");
                PageOutcome::Located { page, fields }
            }
            Err(error) => {
                tracing::warn!(page, error = %error, "page extraction failed");
                PageOutcome::Failed { page, error }
            }
        }
    };

    let outcomes: Vec<PageOutcome> = if parallel {
        (0..count).into_par_iter().map(work).collect()
    } else {
        (0..count).map(work).collect()
    };
    Ok(outcomes)
}

/// Flatten page outcomes into one ordered field list. Any failed page makes
/// the whole document unreadable; no partial list is returned.
pub fn collect_fields(outcomes: Vec<PageOutcome>) -> Result<Vec<PositionedField>, FormError> {
    let mut fields = Vec::new();
    for outcome in outcomes {
        match outcome {
            PageOutcome::Located {
                fields: page_fields,
                ..
            } => fields.extend(page_fields),
            PageOutcome::Failed { page, error } => {
                return Err(FormError::UnreadableDocument(format!(
                    "page {page}: {error}"
                )))
            }
        }
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::Glyph;
    use crate::model::BBox;

    fn glyph(ch: char, x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Glyph {
        Glyph {
            ch,
            bbox: BBox::new(x_min, y_min, x_max, y_max),
        }
    }

    /// Lay `text` out left to right starting at `x`, 5pt per glyph.
    fn line_at(text: &str, x: f32, y: f32) -> TextLine {
        TextLine {
            glyphs: text
                .chars()
                .enumerate()
                .map(|(i, ch)| {
                    let x0 = x + 5.0 * i as f32;
                    glyph(ch, x0, y, x0 + 5.0, y + 10.0)
                })
                .collect(),
        }
    }

    #[test]
    fn test_blank_glyphs_union() {
        let line = TextLine {
            glyphs: vec![
                glyph('_', 10.0, 10.0, 15.0, 20.0),
                glyph('_', 15.0, 10.0, 22.0, 20.0),
            ],
        };
        let fields = locate_line(0, &line, &Catalog::standard()).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].bbox, BBox::new(10.0, 10.0, 22.0, 20.0));
        assert_eq!(fields[0].kind, FieldKind::TextField);
        assert_eq!(fields[0].font_size, Some(10.0));
    }

    #[test]
    fn test_checkbox_checked_from_glyphs() {
        let line = line_at("Sim ( x ) Não ( )", 0.0, 0.0);
        let fields = locate_line(2, &line, &Catalog::standard()).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].value, FieldValue::Checked(true));
        assert_eq!(fields[1].value, FieldValue::Checked(false));
        assert!(fields.iter().all(|f| f.page == 2 && f.font_size.is_none()));
        // "( x )" starts at glyph 4.
        assert_eq!(fields[0].bbox, BBox::new(20.0, 0.0, 45.0, 10.0));
    }

    #[test]
    fn test_font_size_is_tallest_glyph() {
        let line = TextLine {
            glyphs: vec![
                glyph('_', 0.0, 4.0, 5.0, 10.0),
                glyph('_', 5.0, 0.0, 10.0, 12.0),
            ],
        };
        let fields = locate_line(0, &line, &Catalog::standard()).unwrap();
        assert_eq!(fields[0].font_size, Some(12.0));
    }

    #[test]
    fn test_multibyte_glyphs_map_to_offsets() {
        let line = line_at("Endereço: ____", 0.0, 0.0);
        let fields = locate_line(0, &line, &Catalog::standard()).unwrap();
        let blank = fields.iter().find(|f| f.text == "____").unwrap();
        assert_eq!(blank.bbox, BBox::new(50.0, 0.0, 70.0, 10.0));
    }

    #[test]
    fn test_page_sorted_top_to_bottom_then_left_to_right() {
        let page = PageGlyphs {
            lines: vec![
                line_at("___", 100.0, 50.0),
                line_at("___", 10.0, 50.0),
                line_at("( )", 10.0, 5.0),
            ],
        };
        let fields = locate_page(0, &page, &Catalog::standard()).unwrap();
        let origins: Vec<(f32, f32)> = fields
            .iter()
            .map(|f| (f.bbox.y_min, f.bbox.x_min))
            .collect();
        assert_eq!(origins, vec![(5.0, 10.0), (50.0, 10.0), (50.0, 100.0)]);
    }

    #[test]
    fn test_mixed_glyph_heights_keep_left_to_right() {
        // Blank glyphs sit half a point lower than the parentheses after them.
        let mut glyphs: Vec<Glyph> = (0..4)
            .map(|i| {
                let x0 = 10.0 + 5.0 * i as f32;
                glyph('_', x0, 20.5, x0 + 5.0, 30.0)
            })
            .collect();
        for (i, ch) in " ( x )".chars().enumerate() {
            let x0 = 30.0 + 5.0 * i as f32;
            glyphs.push(glyph(ch, x0, 20.0, x0 + 5.0, 30.5));
        }
        let page = PageGlyphs {
            lines: vec![TextLine { glyphs }],
        };

        let fields = locate_page(0, &page, &Catalog::standard()).unwrap();
        let xs: Vec<f32> = fields.iter().map(|f| f.bbox.x_min).collect();
        assert_eq!(xs, vec![10.0, 35.0]);
        assert_eq!(fields[0].kind, FieldKind::TextField);
        assert_eq!(fields[1].kind, FieldKind::Checkbox);
    }

    #[test]
    fn test_page_without_matches_is_empty() {
        let page = PageGlyphs {
            lines: vec![line_at("Texto comum", 0.0, 0.0)],
        };
        assert!(locate_page(0, &page, &Catalog::standard())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_failed_page_aborts_collection() {
        let outcomes = vec![
            PageOutcome::Located {
                page: 0,
                fields: vec![],
            },
            PageOutcome::Failed {
                page: 1,
                error: FormError::Extraction("boom".into()),
            },
        ];
        assert!(matches!(
            collect_fields(outcomes),
            Err(FormError::UnreadableDocument(_))
        ));
    }
}
