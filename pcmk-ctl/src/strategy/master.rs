//! Master/slave (promotable) resources.

use tracing::debug;

use crate::error::Result;
use crate::reader::StateReader;
use crate::status::{ClusterStatusTree, Role};

/// `master-max`, then its pacemaker 2.1 name `promoted-max`, or a single
/// master when neither is configured.
pub async fn expected_count(id: &str, reader: &StateReader) -> Result<u32> {
    if let Some(count) = reader.meta_count(id, "master-max").await? {
        return Ok(count);
    }
    if let Some(count) = reader.meta_count(id, "promoted-max").await? {
        return Ok(count);
    }
    debug!(resource = %id, "master-max and promoted-max not set, expecting one master");
    Ok(1)
}

/// Healthy instances holding the Master role.
pub fn current_count(id: &str, status: &ClusterStatusTree) -> u32 {
    status.count_running(id, Role::Master)
}
