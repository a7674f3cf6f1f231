//! Resource classification.

use std::fmt;

use serde::Serialize;

use crate::cib::{ClusterConfigTree, MatchMode, meta_attribute};
use crate::xml::Element;

/// Topology of a configured resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Primitive,
    Clone,
    Master,
    Bundle,
    /// Nothing matched, or the matching entry is ambiguous.
    Unknown,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Primitive => write!(f, "primitive"),
            ResourceKind::Clone => write!(f, "clone"),
            ResourceKind::Master => write!(f, "master"),
            ResourceKind::Bundle => write!(f, "bundle"),
            ResourceKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classify the first configuration entry matching `id`.
pub fn classify(id: &str, config: &ClusterConfigTree, mode: MatchMode) -> ResourceKind {
    match config.find_entry(id, mode) {
        Some(entry) => kind_of(entry),
        None => ResourceKind::Unknown,
    }
}

/// Kind of a single top-level resource entry.
///
/// Handles both the `crm_mon` shape (`<resource>`, `<clone multi_state=..>`)
/// and the CIB shape (`<primitive>`, `<clone>` with a `promotable` meta
/// attribute, legacy `<master>`).
pub fn kind_of(entry: &Element) -> ResourceKind {
    match entry.name.as_str() {
        "resource" | "primitive" => ResourceKind::Primitive,
        "master" => ResourceKind::Master,
        "bundle" => ResourceKind::Bundle,
        "clone" => {
            let flag = match entry.attr("multi_state") {
                Some(flag) => Some(flag),
                None => meta_attribute(entry, "promotable"),
            };
            match flag {
                Some("false") | None => ResourceKind::Clone,
                Some("true") => ResourceKind::Master,
                Some(_) => ResourceKind::Unknown,
            }
        }
        _ => ResourceKind::Unknown,
    }
}
