//! Exact inference over finite-support probabilistic programs.
//!
//! This module is composed of:
//! - `marginal`: the exact posterior representation (`Marginal`).
//! - `enumerate`: the replay-based exhaustive enumeration driver (`Trace`,
//!   `enumerate`).

mod enumerate;
mod marginal;

pub use enumerate::{Trace, enumerate};
pub use marginal::Marginal;
