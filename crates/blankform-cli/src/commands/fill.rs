use std::path::{Path, PathBuf};

use serde::Deserialize;

use blankform_core::config::EngineConfig;
use blankform_core::error::FormError;
use blankform_core::model::{FieldValue, Line};
use blankform_core::reconcile::positional::group_by_line;
use blankform_core::reconcile::{MarkerValue, Strategy, Submission};
use blankform_core::session::Session;

/// Positional values as written by hand: either grouped per line, or one
/// flat list in the order `extract` lists the fields.
#[derive(Deserialize)]
#[serde(untagged)]
enum PositionalValues {
    PerLine(Vec<Vec<FieldValue>>),
    Flat(Vec<FieldValue>),
}

pub fn run(
    input_file: PathBuf,
    values_file: &Path,
    strategy: Strategy,
    out_dir: Option<PathBuf>,
    config: &EngineConfig,
) -> Result<(), FormError> {
    let session = Session::open(input_file, out_dir)?;
    let output_path = session.prepare_output()?;
    let (document, lines) = super::open_lines(&session, config)?;

    let data = std::fs::read(values_file)?;
    let submission = read_submission(&data, &lines, strategy)?;

    let texts =
        blankform_core::fill_document(&lines, &submission, &config.rendering(), document.as_ref())?;
    let changed = lines
        .iter()
        .zip(&texts)
        .filter(|(line, text)| line.text() != **text)
        .count();

    eprintln!(
        "Filled {} line(s) ({} strategy), written to {}",
        changed,
        strategy,
        output_path.display()
    );
    Ok(())
}

fn read_submission(data: &[u8], lines: &[Line], strategy: Strategy) -> Result<Submission, FormError> {
    match strategy {
        Strategy::Positional => {
            let values = match serde_json::from_slice::<PositionalValues>(data)? {
                PositionalValues::PerLine(values) => values,
                PositionalValues::Flat(flat) => group_by_line(lines, flat)?,
            };
            Ok(Submission::Positional(values))
        }
        Strategy::MarkerToken => {
            let pairs: Vec<MarkerValue> = serde_json::from_slice(data)?;
            tracing::debug!(pairs = pairs.len(), "read marker values");
            Ok(Submission::Markers(pairs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blankform_core::model::Alignment;
    use blankform_core::parsing::catalog::Catalog;
    use blankform_core::parsing::tokenize_paragraph;

    fn lines() -> Vec<Line> {
        ["Nome ____", "fim", "Sim ( )"]
            .iter()
            .map(|t| tokenize_paragraph(t, Alignment::Left, &Catalog::standard()).unwrap())
            .collect()
    }

    #[test]
    fn test_flat_values_grouped_by_line() {
        let submission =
            read_submission(br#"["Ana", true]"#, &lines(), Strategy::Positional).unwrap();
        assert_eq!(
            submission,
            Submission::Positional(vec![
                vec![FieldValue::Text("Ana".into())],
                vec![],
                vec![FieldValue::Checked(true)],
            ])
        );
    }

    #[test]
    fn test_per_line_values_kept() {
        let submission =
            read_submission(br#"[["Ana"], [], [false]]"#, &lines(), Strategy::Positional).unwrap();
        assert_eq!(submission.strategy(), Strategy::Positional);
    }

    #[test]
    fn test_marker_values() {
        let json = br#"[{"value": "Ana", "marker": {"kind": "text_field", "template": "____"}}]"#;
        let Submission::Markers(pairs) =
            read_submission(json, &lines(), Strategy::MarkerToken).unwrap()
        else {
            panic!("expected marker submission");
        };
        assert_eq!(pairs[0].marker.template, "____");
    }
}
