use crate::error::EngineError;
use crate::model::world::WorldMask;

/// A question under discussion: an ordered partition of the world set into
/// discourse alternatives.
///
/// Alternatives may overlap; a world is resolved to the first alternative in
/// declaration order whose mask intersects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Qud {
    label: String,
    alternatives: Vec<(String, WorldMask)>,
}

impl Qud {
    pub fn new(label: String, alternatives: Vec<(String, WorldMask)>) -> Self {
        Self {
            label,
            alternatives,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn alternative_count(&self) -> usize {
        self.alternatives.len()
    }

    pub fn alternative_labels(&self) -> impl Iterator<Item = &str> {
        self.alternatives.iter().map(|(label, _)| label.as_str())
    }

    pub fn alternative_label(&self, index: usize) -> Option<&str> {
        self.alternatives.get(index).map(|(label, _)| label.as_str())
    }

    /// Index of the first alternative, in declaration order, whose mask
    /// intersects `world`. A world no alternative covers is a malformed
    /// specification and surfaces as an error.
    pub fn alternative_for(&self, world: WorldMask) -> Result<usize, EngineError> {
        self.alternatives
            .iter()
            .position(|(_, mask)| mask.intersects(world))
            .ok_or_else(|| EngineError::NoMatchingAlternative {
                qud: self.label.clone(),
                world,
            })
    }
}
