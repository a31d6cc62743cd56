pub mod catalog;
pub mod markers;

use rayon::prelude::*;

use crate::error::FormError;
use crate::extraction::Paragraph;
use crate::model::{Alignment, FieldKind, Line, Segment};
use catalog::{Catalog, Span};

/// Segment one paragraph into static text, text fields and checkboxes.
///
/// Concatenating the contents of the returned segments gives back `text`
/// unchanged. An empty paragraph yields a single empty static segment.
pub fn tokenize_paragraph(
    text: &str,
    alignment: Alignment,
    catalog: &Catalog,
) -> Result<Line, FormError> {
    let spans = catalog.find_spans(text)?;
    Ok(Line {
        segments: split_at_spans(text, &spans),
        alignment,
    })
}

/// Tokenize every paragraph of a document. Paragraphs are processed in
/// parallel; the result keeps document order.
pub fn tokenize_paragraphs(
    paragraphs: &[Paragraph],
    catalog: &Catalog,
) -> Result<Vec<Line>, FormError> {
    paragraphs
        .par_iter()
        .map(|p| tokenize_paragraph(&p.text, p.alignment, catalog))
        .collect()
}

fn split_at_spans(text: &str, spans: &[Span]) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(spans.len() * 2 + 1);
    let mut cursor = 0;

    for span in spans {
        if span.range.start > cursor {
            segments.push(Segment::StaticText {
                content: text[cursor..span.range.start].to_string(),
            });
        }
        let content = &text[span.range.clone()];
        segments.push(match span.kind() {
            FieldKind::TextField => Segment::text_field(content),
            FieldKind::Checkbox => Segment::checkbox(content),
        });
        cursor = span.range.end;
    }

    if cursor < text.len() || segments.is_empty() {
        segments.push(Segment::StaticText {
            content: text[cursor..].to_string(),
        });
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(text: &str) -> Line {
        tokenize_paragraph(text, Alignment::Left, &Catalog::standard()).unwrap()
    }

    fn plain(s: &str) -> Segment {
        Segment::StaticText { content: s.into() }
    }

    #[test]
    fn test_form_row_keeps_alignment() {
        let line =
            tokenize_paragraph("Nome: _____  ( X )", Alignment::Center, &Catalog::standard())
                .unwrap();
        assert_eq!(line.alignment, Alignment::Center);
        assert_eq!(
            line.segments,
            vec![
                plain("Nome"),
                Segment::text_field(":"),
                plain(" "),
                Segment::text_field("_____"),
                plain("  "),
                Segment::Checkbox {
                    checked: true,
                    content: "( X )".into(),
                },
            ]
        );
    }

    #[test]
    fn test_date_is_single_field() {
        let line = tokenize("Data: 01/01/2024");
        assert_eq!(
            line.segments,
            vec![plain("Data: "), Segment::text_field("01/01/2024")]
        );
    }

    #[test]
    fn test_empty_paragraph() {
        let line = tokenize("");
        assert_eq!(line.segments, vec![plain("")]);
        assert_eq!(line.text(), "");
    }

    #[test]
    fn test_no_matches_is_one_static_segment() {
        let line = tokenize("Texto corrido sem campos.");
        assert_eq!(line.segments, vec![plain("Texto corrido sem campos.")]);
        assert!(!line.has_fields());
    }

    #[test]
    fn test_adjacent_fields_have_no_empty_static_between() {
        let line = tokenize("___(x)");
        assert_eq!(
            line.segments,
            vec![Segment::text_field("___"), Segment::checkbox("(x)")]
        );
    }

    #[test]
    fn test_round_trip_multibyte() {
        let text = "Eu, ____, residente em: São Paulo, declaro ( ) sim (x) não";
        assert_eq!(tokenize(text).text(), text);
    }

    #[test]
    fn test_tokenize_paragraphs_keeps_order() {
        let paragraphs: Vec<Paragraph> = (0..50)
            .map(|i| Paragraph {
                text: format!("Item {i}: ____"),
                alignment: Alignment::Left,
            })
            .collect();
        let lines = tokenize_paragraphs(&paragraphs, &Catalog::standard()).unwrap();
        for (i, line) in lines.iter().enumerate() {
            assert_eq!(line.text(), format!("Item {i}: ____"));
        }
    }
}
