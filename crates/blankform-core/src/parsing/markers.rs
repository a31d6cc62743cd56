//! Transient marker tokens.
//!
//! A tokenized line can be rendered as a single string in which every field is
//! wrapped as `OPEN tag SEPARATOR content CLOSE`. The sentinels are private-use
//! code points, so they never collide with ordinary prose. Annotated text only
//! lives for one extraction/merge round trip and is never written back into a
//! document.

use crate::error::FormError;
use crate::model::{Alignment, Line, Segment};

pub const OPEN: char = '\u{E000}';
pub const SEPARATOR: char = '\u{E001}';
pub const CLOSE: char = '\u{E002}';

const TEXT_FIELD_TAG: &str = "TF";
const CHECKBOX_TAG: &str = "CB";

pub fn annotate(line: &Line) -> String {
    let mut out = String::new();
    for segment in &line.segments {
        let tag = match segment {
            Segment::StaticText { content } => {
                out.push_str(content);
                continue;
            }
            Segment::TextField { .. } => TEXT_FIELD_TAG,
            Segment::Checkbox { .. } => CHECKBOX_TAG,
        };
        out.push(OPEN);
        out.push_str(tag);
        out.push(SEPARATOR);
        out.push_str(segment.content());
        out.push(CLOSE);
    }
    out
}

/// Split annotated text back into segments. A marked region without a
/// recognised tag is static text.
pub fn split_annotated(annotated: &str, alignment: Alignment) -> Result<Line, FormError> {
    let mut segments = Vec::new();
    let mut rest = annotated;

    while let Some(open) = rest.find(OPEN) {
        push_static(&mut segments, &rest[..open]);
        let inner_start = open + OPEN.len_utf8();
        let close = rest[inner_start..].find(CLOSE).ok_or_else(|| {
            FormError::MalformedAnnotation(format!(
                "unterminated marker at byte {}",
                annotated.len() - rest.len() + open
            ))
        })?;
        let inner = &rest[inner_start..inner_start + close];
        if inner.contains(OPEN) {
            return Err(FormError::MalformedAnnotation("nested marker".into()));
        }
        segments.push(classify(inner));
        rest = &rest[inner_start + close + CLOSE.len_utf8()..];
    }

    if rest.contains(CLOSE) {
        return Err(FormError::MalformedAnnotation(
            "closing marker without opening marker".into(),
        ));
    }
    push_static(&mut segments, rest);
    if segments.is_empty() {
        segments.push(Segment::StaticText {
            content: String::new(),
        });
    }

    Ok(Line {
        segments,
        alignment,
    })
}

/// Remove every marker, leaving the original text.
pub fn strip_markers(annotated: &str) -> String {
    let mut out = String::with_capacity(annotated.len());
    // Text after OPEN is held back until we know whether it was a tag.
    let mut pending: Option<String> = None;
    for c in annotated.chars() {
        match c {
            OPEN => pending = Some(String::new()),
            SEPARATOR => pending = None,
            CLOSE => {
                if let Some(untagged) = pending.take() {
                    out.push_str(&untagged);
                }
            }
            _ => match pending.as_mut() {
                Some(buf) => buf.push(c),
                None => out.push(c),
            },
        }
    }
    if let Some(untagged) = pending {
        out.push_str(&untagged);
    }
    out
}

fn classify(inner: &str) -> Segment {
    match inner.split_once(SEPARATOR) {
        Some((TEXT_FIELD_TAG, content)) => Segment::text_field(content),
        Some((CHECKBOX_TAG, content)) => Segment::checkbox(content),
        Some((_, content)) => Segment::StaticText {
            content: content.to_string(),
        },
        None => Segment::StaticText {
            content: inner.to_string(),
        },
    }
}

fn push_static(segments: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        segments.push(Segment::StaticText {
            content: text.to_string(),
        });
    }
}
