use prag_core::error::EngineError;
use prag_core::infer::Marginal;
use prag_core::model::world::WorldMask;
use prag_core::reasoner::RsaEngine;

/// Rows of (display label, probability) for a world- or context-valued
/// marginal. One-hot masks are shown with the declared world label; wider
/// masks (contexts) with their index-set form.
pub fn world_rows(engine: &RsaEngine, marginal: &Marginal<WorldMask>) -> Vec<(String, f64)> {
    marginal
        .iter()
        .map(|(mask, prob)| {
            let label = mask
                .solo_index()
                .and_then(|index| engine.world_labels().get(index).cloned())
                .unwrap_or_else(|| mask.to_string());
            (label, prob)
        })
        .collect()
}

pub fn utterance_rows(marginal: &Marginal<String>) -> Vec<(String, f64)> {
    marginal
        .iter()
        .map(|(label, prob)| (label.clone(), prob))
        .collect()
}

pub fn alternative_rows(
    engine: &RsaEngine,
    qud: &str,
    marginal: &Marginal<usize>,
) -> Result<Vec<(String, f64)>, EngineError> {
    let labels = engine.alternative_labels(qud)?;
    Ok(marginal
        .iter()
        .map(|(index, prob)| {
            let label = labels
                .get(*index)
                .map(|label| label.to_string())
                .unwrap_or_else(|| index.to_string());
            (label, prob)
        })
        .collect())
}

/// Fixed-width text table, one row per outcome.
pub fn table(title: &str, rows: &[(String, f64)]) -> String {
    let width = rows
        .iter()
        .map(|(label, _)| label.len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    for (label, prob) in rows {
        out.push_str(&format!("  {label:<width$}  {prob:.6}\n"));
    }
    out
}
