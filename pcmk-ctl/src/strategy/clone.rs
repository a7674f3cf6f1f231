//! Cloned resources.

use tracing::debug;

use crate::error::Result;
use crate::reader::StateReader;
use crate::status::{ClusterStatusTree, Role};

/// `clone-max` when configured. Otherwise the number of nodes tagged with
/// `<id>-role=true` (composable HA), and when no node is tagged the size of
/// the whole cluster.
pub async fn expected_count(id: &str, reader: &StateReader) -> Result<u32> {
    if let Some(count) = reader.meta_count(id, "clone-max").await? {
        return Ok(count);
    }

    let tagged = reader.count_nodes_with_role(id).await?;
    if tagged > 0 {
        debug!(resource = %id, nodes = tagged, "clone-max not set, using role-tagged nodes");
        return Ok(tagged);
    }

    let nodes = reader.count_nodes().await?;
    debug!(resource = %id, nodes, "clone-max not set and no role tags, using all nodes");
    Ok(nodes)
}

/// Healthy Started instances across all nodes.
pub fn current_count(id: &str, status: &ClusterStatusTree) -> u32 {
    status.count_running(id, Role::Started)
}
