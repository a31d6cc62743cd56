pub mod config;
pub mod error;
pub mod extraction;
pub mod layout;
pub mod model;
pub mod parsing;
pub mod reconcile;
pub mod registry;
pub mod session;

use config::EngineConfig;
use error::FormError;
use extraction::{DocumentSink, DocumentSource, LayoutSource};
use model::Line;
use parsing::catalog::Catalog;
use reconcile::{Rendering, Submission};
use registry::FieldRegistry;

/// Main entry point for the paragraph workflow: tokenize every paragraph of
/// a document into static text and fields.
///
/// A source that cannot produce its paragraphs aborts the whole extraction.
pub fn extract_lines<S>(source: &S, catalog: &Catalog) -> Result<Vec<Line>, FormError>
where
    S: DocumentSource + ?Sized,
{
    let paragraphs = source.paragraphs().map_err(|e| match e {
        FormError::UnreadableDocument(_) => e,
        other => FormError::UnreadableDocument(other.to_string()),
    })?;

    let lines = parsing::tokenize_paragraphs(&paragraphs, catalog)?;
    tracing::info!(
        paragraphs = lines.len(),
        fields = lines.iter().map(Line::field_count).sum::<usize>(),
        "extracted paragraph fields"
    );
    Ok(lines)
}

/// Registry over the fields of already tokenized lines.
pub fn paragraph_registry(lines: &[Line], config: &EngineConfig) -> FieldRegistry {
    FieldRegistry::from_lines(lines, &config.render)
}

/// Main entry point for the layout workflow: locate every field on every page.
///
/// Pages are processed by independent workers; if any page fails the document
/// is reported unreadable and no registry is produced.
pub fn locate_fields<S>(source: &S, config: &EngineConfig) -> Result<FieldRegistry, FormError>
where
    S: LayoutSource + ?Sized,
{
    let catalog = config.layout_catalog();
    let outcomes = layout::locate_pages(source, &catalog, config.layout.parallel)?;
    let fields = layout::collect_fields(outcomes)?;
    tracing::info!(
        backend = source.backend_name(),
        fields = fields.len(),
        "located layout fields"
    );
    Ok(FieldRegistry::from_positioned(fields))
}

/// Reconcile `submission` against `lines` and save the result.
///
/// The sink is only touched once every value has been placed.
pub fn fill_document<K>(
    lines: &[Line],
    submission: &Submission,
    rendering: &Rendering,
    sink: &K,
) -> Result<Vec<String>, FormError>
where
    K: DocumentSink + ?Sized,
{
    let texts = reconcile::submit_values(lines, submission, rendering)?;
    sink.save(&texts)?;
    tracing::info!(
        strategy = %submission.strategy(),
        paragraphs = texts.len(),
        "saved reconciled document"
    );
    Ok(texts)
}
