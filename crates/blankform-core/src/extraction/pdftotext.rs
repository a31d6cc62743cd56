use crate::error::FormError;
use crate::extraction::{Glyph, LayoutSource, PageGlyphs, TextLine};
use crate::model::BBox;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Write;
use std::process::Command;

/// Layout backend using pdftotext (from poppler-utils).
///
/// Runs `pdftotext -bbox-layout` once and keeps the XML of each page; pages
/// are parsed on demand so one malformed page does not take the others down.
/// pdftotext reports boxes per word, so each word's box is shared out evenly
/// between its characters.
pub struct PdftotextLayout {
    pages: Vec<String>,
}

impl PdftotextLayout {
    pub fn open(pdf_bytes: &[u8]) -> Result<Self, FormError> {
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| FormError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| FormError::Extraction(e.to_string()))?;

        let output = Command::new("pdftotext")
            .arg("-bbox-layout")
            .arg(tmpfile.path())
            .arg("-")
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FormError::PdftotextNotFound
                } else {
                    FormError::Extraction(format!("pdftotext -bbox-layout failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(FormError::PdftotextFailed { code, stderr });
        }

        let xml = String::from_utf8_lossy(&output.stdout);
        Ok(Self::from_bbox_xml(&xml))
    }

    /// Build from already captured `-bbox-layout` output.
    pub fn from_bbox_xml(xml: &str) -> Self {
        PdftotextLayout {
            pages: split_pages(xml),
        }
    }
}

impl LayoutSource for PdftotextLayout {
    fn page_count(&self) -> Result<usize, FormError> {
        Ok(self.pages.len())
    }

    fn page(&self, index: usize) -> Result<PageGlyphs, FormError> {
        let xml = self.pages.get(index).ok_or_else(|| FormError::PageUnreadable {
            page: index,
            reason: "page index out of range".into(),
        })?;
        parse_page(xml).map_err(|reason| FormError::PageUnreadable {
            page: index,
            reason,
        })
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// Cut the document into one `<page ...>...</page>` chunk per page.
fn split_pages(xml: &str) -> Vec<String> {
    let mut pages = Vec::new();
    let mut rest = xml;

    while let Some(start) = find_page_open(rest) {
        let tail = &rest[start..];
        match tail.find("</page>") {
            Some(end) => {
                let end = end + "</page>".len();
                pages.push(tail[..end].to_string());
                rest = &tail[end..];
            }
            None => {
                // Truncated output: keep it so the page reports its own error.
                pages.push(tail.to_string());
                break;
            }
        }
    }

    pages
}

fn find_page_open(s: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(i) = s[from..].find("<page") {
        let at = from + i;
        match s[at + "<page".len()..].chars().next() {
            Some(c) if c.is_whitespace() || c == '>' => return Some(at),
            _ => from = at + "<page".len(),
        }
    }
    None
}

fn parse_page(xml: &str) -> Result<PageGlyphs, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut lines = Vec::new();
    let mut current_line: Option<Vec<Glyph>> = None;
    let mut current_word: Option<(BBox, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"line" => current_line = Some(Vec::new()),
                b"word" => current_word = Some((parse_bbox(e)?, String::new())),
                _ => {}
            },
            Ok(Event::Text(ref t)) => {
                if let Some((_, text)) = current_word.as_mut() {
                    let decoded = t.unescape().map_err(|e| e.to_string())?;
                    text.push_str(&decoded);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"word" => {
                    if let (Some((bbox, text)), Some(glyphs)) =
                        (current_word.take(), current_line.as_mut())
                    {
                        push_word(glyphs, &text, bbox);
                    }
                }
                b"line" => {
                    if let Some(glyphs) = current_line.take() {
                        if !glyphs.is_empty() {
                            lines.push(TextLine { glyphs });
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "malformed XML at byte {}: {}",
                    reader.error_position(),
                    e
                ))
            }
            _ => {}
        }
    }

    if current_line.is_some() || current_word.is_some() {
        return Err("page XML ended inside a line".into());
    }

    Ok(PageGlyphs { lines })
}

/// Append a word's characters, preceded by a space glyph bridging the gap
/// from the previous word.
fn push_word(glyphs: &mut Vec<Glyph>, word: &str, bbox: BBox) {
    let count = word.chars().count();
    if count == 0 {
        return;
    }

    let space = glyphs.last().map(|prev| Glyph {
        ch: ' ',
        bbox: BBox::new(prev.bbox.x_max, bbox.y_min, bbox.x_min, bbox.y_max),
    });
    if let Some(space) = space {
        glyphs.push(space);
    }

    let step = bbox.width() / count as f32;
    for (i, ch) in word.chars().enumerate() {
        let x = bbox.x_min + step * i as f32;
        glyphs.push(Glyph {
            ch,
            bbox: BBox::new(x, bbox.y_min, x + step, bbox.y_max),
        });
    }
}

fn parse_bbox(tag: &BytesStart) -> Result<BBox, String> {
    Ok(BBox::new(
        parse_attr_f32(tag, "xMin")?,
        parse_attr_f32(tag, "yMin")?,
        parse_attr_f32(tag, "xMax")?,
        parse_attr_f32(tag, "yMax")?,
    ))
}

fn parse_attr_f32(tag: &BytesStart, name: &str) -> Result<f32, String> {
    let attr = tag
        .try_get_attribute(name)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("word without {name}"))?;
    let value = attr.unescape_value().map_err(|e| e.to_string())?;
    value
        .trim()
        .parse()
        .map_err(|e| format!("invalid {name} '{value}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<body>
<doc>
  <page width="612.000000" height="792.000000">
    <flow>
      <block xMin="10.0" yMin="20.0" xMax="80.0" yMax="30.0">
        <line xMin="10.0" yMin="20.0" xMax="80.0" yMax="30.0">
          <word xMin="10.0" yMin="20.0" xMax="35.0" yMax="30.0">Nome:</word>
          <word xMin="40.0" yMin="20.0" xMax="65.0" yMax="30.0">_____</word>
        </line>
      </block>
    </flow>
  </page>
  <page width="612.000000" height="792.000000">
    <flow>
      <block xMin="10.0" yMin="20.0" xMax="30.0" yMax="30.0">
        <line xMin="10.0" yMin="20.0" xMax="30.0" yMax="30.0">
          <word xMin="10.0" yMin="20.0" xMax="30.0" yMax="30.0">A&amp;B</word>
        </line>
      </block>
    </flow>
  </page>
</doc>
</body>
</html>
"#;

    #[test]
    fn test_split_pages() {
        let layout = PdftotextLayout::from_bbox_xml(SAMPLE);
        assert_eq!(layout.page_count().unwrap(), 2);
    }

    #[test]
    fn test_words_become_glyphs_with_space() {
        let layout = PdftotextLayout::from_bbox_xml(SAMPLE);
        let page = layout.page(0).unwrap();
        assert_eq!(page.lines.len(), 1);
        let line = &page.lines[0];
        assert_eq!(line.text(), "Nome: _____");
        // "Nome:" spans 25pt over five glyphs.
        assert_eq!(line.glyphs[0].bbox, BBox::new(10.0, 20.0, 15.0, 30.0));
        assert_eq!(line.glyphs[5].bbox, BBox::new(35.0, 20.0, 40.0, 30.0));
        assert_eq!(line.glyphs[6].bbox, BBox::new(40.0, 20.0, 45.0, 30.0));
    }

    #[test]
    fn test_entities_decoded() {
        let layout = PdftotextLayout::from_bbox_xml(SAMPLE);
        assert_eq!(layout.page(1).unwrap().lines[0].text(), "A&B");
    }

    #[test]
    fn test_bad_page_fails_alone() {
        let xml = r#"<doc><page><line><word xMin="1" yMin="1" xMax="2">x</word></line></page>
<page><line><word xMin="1" yMin="1" xMax="2" yMax="2">y</word></line></page></doc>"#;
        let layout = PdftotextLayout::from_bbox_xml(xml);
        assert!(matches!(
            layout.page(0),
            Err(FormError::PageUnreadable { page: 0, .. })
        ));
        assert_eq!(layout.page(1).unwrap().lines[0].text(), "y");
    }
}
