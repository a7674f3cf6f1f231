//! Container bundles.
//!
//! A bundle either wraps a primitive (optionally promotable) or runs bare
//! containers. The expected and current counts follow the same three-way
//! branch so they always measure the same thing.

use crate::cib::BundleLayout;
use crate::status::{ClusterStatusTree, Role};

pub fn expected_count(layout: &BundleLayout) -> u32 {
    if layout.has_primitive() && layout.masters > 0 {
        layout.masters
    } else {
        layout.replicas
    }
}

pub fn current_count(layout: &BundleLayout, status: &ClusterStatusTree) -> u32 {
    if layout.has_primitive() && layout.masters > 0 {
        status.count_running(&layout.primitive, Role::Master)
    } else if layout.has_primitive() {
        status.count_running(&layout.primitive, Role::Started)
    } else {
        status.count_running_containers(&layout.id)
    }
}
