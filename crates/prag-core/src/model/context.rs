use crate::model::world::WorldMask;

/// Enumerates the context set for a domain with `n_worlds` worlds.
///
/// An explicit list from the specification is used verbatim, order intact.
/// Otherwise one mask is generated per integer in `1 ..= 2^n_worlds - 2`,
/// ascending, with bit `k` of the integer selecting world `k`; the empty
/// mask and the all-worlds mask are left out.
pub fn enumerate_contexts(explicit: Option<Vec<WorldMask>>, n_worlds: usize) -> Vec<WorldMask> {
    if let Some(contexts) = explicit {
        return contexts;
    }
    let all_worlds = WorldMask::full(n_worlds).bits();
    (1..all_worlds).map(WorldMask::from_bits).collect()
}
