//! Single-instance resources.

use crate::status::ClusterStatusTree;

/// A primitive is active when exactly one instance is started.
pub const EXPECTED: u32 = 1;

/// Same predicate as a clone; a primitive simply expects a single match.
pub fn current_count(id: &str, status: &ClusterStatusTree) -> u32 {
    super::clone::current_count(id, status)
}
