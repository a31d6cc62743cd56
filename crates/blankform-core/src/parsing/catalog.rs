use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FormError;
use crate::model::FieldKind;

static BLANK_FILL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").expect("valid regex"));
static LABELED_COLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\s\p{L}[^.]*").expect("valid regex"));
static NUMERIC_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}/\d{2}/\d{4}").expect("valid regex"));
static LONG_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2} de \w+ de \d{4}").expect("valid regex"));
static CHECKBOX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(\s*(?:x\s*)?\)").expect("valid regex"));

/// A matching rule. Declaration order is precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// `_____`
    BlankFill,
    /// `: Something` up to the end of the sentence.
    LabeledColon,
    /// A colon with nothing but whitespace after it.
    BareColon,
    /// `01/01/2000`
    NumericDate,
    /// `01 de julho de 2004`
    LongDate,
    /// `( X )`, `(x)`, `( )`
    Checkbox,
}

impl Rule {
    pub const ALL: [Rule; 6] = [
        Rule::BlankFill,
        Rule::LabeledColon,
        Rule::BareColon,
        Rule::NumericDate,
        Rule::LongDate,
        Rule::Checkbox,
    ];

    pub fn kind(self) -> FieldKind {
        match self {
            Rule::Checkbox => FieldKind::Checkbox,
            _ => FieldKind::TextField,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Rule::BlankFill => "blank_fill",
            Rule::LabeledColon => "labeled_colon",
            Rule::BareColon => "bare_colon",
            Rule::NumericDate => "numeric_date",
            Rule::LongDate => "long_date",
            Rule::Checkbox => "checkbox",
        }
    }

    /// Matches inside `gap` only; returned ranges are offsets into `text`.
    fn find_in(self, text: &str, gap: Range<usize>) -> Vec<Range<usize>> {
        let regex = match self {
            Rule::BareColon => return bare_colon_spans(text, gap),
            Rule::BlankFill => &*BLANK_FILL,
            Rule::LabeledColon => &*LABELED_COLON,
            Rule::NumericDate => &*NUMERIC_DATE,
            Rule::LongDate => &*LONG_DATE,
            Rule::Checkbox => &*CHECKBOX,
        };
        let offset = gap.start;
        regex
            .find_iter(&text[gap])
            .map(|m| offset + m.start()..offset + m.end())
            .collect()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A colon whose trailing whitespace runs to the end of the gap. Two or more
/// whitespace characters are claimed with the colon; a single one is left as text.
fn bare_colon_spans(text: &str, gap: Range<usize>) -> Vec<Range<usize>> {
    let region = &text[gap.clone()];
    let mut spans = Vec::new();

    for (i, c) in region.char_indices() {
        if c != ':' {
            continue;
        }
        let rest = &region[i + 1..];
        if !rest.trim_start().is_empty() {
            continue;
        }
        let end = if rest.chars().count() >= 2 {
            region.len()
        } else {
            i + 1
        };
        spans.push(gap.start + i..gap.start + end);
    }

    spans
}

/// A classified byte range of the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub range: Range<usize>,
    pub rule: Rule,
}

impl Span {
    pub fn kind(&self) -> FieldKind {
        self.rule.kind()
    }
}

/// Ordered set of rules applied to immutable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    rules: Vec<Rule>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl Catalog {
    pub fn standard() -> Self {
        Catalog {
            rules: Rule::ALL.to_vec(),
        }
    }

    /// Precedence is fixed: the given order is ignored and duplicates are dropped.
    pub fn with_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut rules: Vec<Rule> = rules.into_iter().collect();
        rules.sort();
        rules.dedup();
        Catalog { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Runs every rule over the regions earlier rules left unclaimed and returns
    /// the merged spans sorted by start offset.
    pub fn find_spans(&self, text: &str) -> Result<Vec<Span>, FormError> {
        let mut claimed: Vec<Span> = Vec::new();

        for &rule in &self.rules {
            let found: Vec<Span> = unclaimed_gaps(text.len(), &claimed)
                .into_iter()
                .flat_map(|gap| rule.find_in(text, gap))
                .map(|range| Span { range, rule })
                .collect();
            merge_claims(&mut claimed, found)?;
        }

        Ok(claimed)
    }
}

fn unclaimed_gaps(len: usize, claimed: &[Span]) -> Vec<Range<usize>> {
    let mut gaps = Vec::with_capacity(claimed.len() + 1);
    let mut cursor = 0;
    for span in claimed {
        if span.range.start > cursor {
            gaps.push(cursor..span.range.start);
        }
        cursor = span.range.end;
    }
    if cursor < len {
        gaps.push(cursor..len);
    }
    gaps
}

fn merge_claims(claimed: &mut Vec<Span>, found: Vec<Span>) -> Result<(), FormError> {
    for span in found {
        if span.range.is_empty() {
            continue;
        }
        let at = claimed.partition_point(|c| c.range.start < span.range.start);
        let neighbours = [at.checked_sub(1), Some(at)];
        let clash = neighbours
            .into_iter()
            .flatten()
            .filter_map(|i| claimed.get(i))
            .find(|c| c.range.start < span.range.end && span.range.start < c.range.end);
        if let Some(existing) = clash {
            return Err(FormError::PatternAmbiguity {
                first: existing.rule.name(),
                first_range: existing.range.clone(),
                second: span.rule.name(),
                second_range: span.range,
            });
        }
        claimed.insert(at, span);
    }
    Ok(())
}
