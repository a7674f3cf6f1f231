//! Expected/current instance counting, one strategy per resource kind.
//!
//! The expected count is computed once per run from configuration and
//! metadata; the current count is recomputed from every fresh status
//! snapshot.

pub mod bundle;
pub mod clone;
pub mod master;
pub mod primitive;

use crate::cib::{BundleLayout, ClusterConfigTree, MatchMode};
use crate::classify::ResourceKind;
use crate::error::{Error, Result};
use crate::reader::StateReader;
use crate::status::ClusterStatusTree;

/// Counting strategy selected from a resource's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountStrategy {
    Primitive,
    Clone,
    Master,
    Bundle(BundleLayout),
}

impl CountStrategy {
    /// Pick the strategy for `kind`. Bundles resolve their layout from the
    /// same configuration snapshot the kind was read from. `Unknown` has no
    /// strategy.
    pub fn resolve(
        kind: ResourceKind,
        id: &str,
        config: &ClusterConfigTree,
        mode: MatchMode,
    ) -> Result<Option<Self>> {
        let strategy = match kind {
            ResourceKind::Primitive => CountStrategy::Primitive,
            ResourceKind::Clone => CountStrategy::Clone,
            ResourceKind::Master => CountStrategy::Master,
            ResourceKind::Bundle => {
                let layout = config.bundle_layout(id, mode)?.ok_or_else(|| Error::InvalidConfig {
                    resource: id.to_string(),
                    reason: "no bundle entry matches".to_string(),
                })?;
                CountStrategy::Bundle(layout)
            }
            ResourceKind::Unknown => return Ok(None),
        };
        Ok(Some(strategy))
    }

    /// Number of running instances the resource needs to count as active.
    pub async fn expected_count(&self, id: &str, reader: &StateReader) -> Result<u32> {
        match self {
            CountStrategy::Primitive => Ok(primitive::EXPECTED),
            CountStrategy::Clone => clone::expected_count(id, reader).await,
            CountStrategy::Master => master::expected_count(id, reader).await,
            CountStrategy::Bundle(layout) => Ok(bundle::expected_count(layout)),
        }
    }

    /// Number of instances currently running in the role that counts.
    pub fn current_count(&self, id: &str, status: &ClusterStatusTree) -> u32 {
        match self {
            CountStrategy::Primitive => primitive::current_count(id, status),
            CountStrategy::Clone => clone::current_count(id, status),
            CountStrategy::Master => master::current_count(id, status),
            CountStrategy::Bundle(layout) => bundle::current_count(layout, status),
        }
    }
}
