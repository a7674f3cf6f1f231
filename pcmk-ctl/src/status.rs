//! Live cluster status as reported by `crm_mon -r --as-xml`.

use crate::xml::{Element, XmlError};

/// Role a resource instance currently holds on its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Started,
    Master,
    Slave,
    Stopped,
}

impl Role {
    /// Parse a `role` attribute. Pacemaker 2.1 renamed Master/Slave to
    /// Promoted/Unpromoted; both spellings are accepted.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "Started" => Some(Role::Started),
            "Master" | "Promoted" => Some(Role::Master),
            "Slave" | "Unpromoted" => Some(Role::Slave),
            "Stopped" => Some(Role::Stopped),
            _ => None,
        }
    }
}

/// One `<resource>` entry of the status document, i.e. one instance on one node.
#[derive(Debug, Clone, Copy)]
pub struct Instance<'a> {
    element: &'a Element,
}

impl<'a> Instance<'a> {
    pub fn id(&self) -> &'a str {
        self.element.id().unwrap_or_default()
    }

    pub fn role(&self) -> Option<Role> {
        self.element.attr("role").and_then(Role::parse)
    }

    pub fn resource_agent(&self) -> &'a str {
        self.element.attr("resource_agent").unwrap_or_default()
    }

    /// Not orphaned, not failed and active. A missing flag never counts as
    /// healthy.
    pub fn is_healthy(&self) -> bool {
        self.element.attr("orphaned") == Some("false")
            && self.element.attr("failed") == Some("false")
            && self.element.attr("active") == Some("true")
    }

    pub fn is_running_as(&self, role: Role) -> bool {
        self.is_healthy() && self.role() == Some(role)
    }

    pub fn is_container(&self) -> bool {
        CONTAINER_AGENTS
            .iter()
            .any(|agent| self.resource_agent().ends_with(agent))
    }
}

/// Resource agents pacemaker uses for bundle container replicas.
const CONTAINER_AGENTS: &[&str] = &[":docker", ":podman", ":rkt"];

/// Parsed `crm_mon` output. Immutable; fetch a new one for every poll.
#[derive(Debug, Clone)]
pub struct ClusterStatusTree {
    root: Element,
}

impl ClusterStatusTree {
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        Ok(Self {
            root: Element::parse(xml)?,
        })
    }

    /// Every resource instance in the document, wherever it is nested.
    pub fn instances(&self) -> impl Iterator<Item = Instance<'_>> {
        self.root
            .descendants()
            .filter(|e| e.is("resource"))
            .map(|element| Instance { element })
    }

    /// Instances whose id is exactly `id` and that run healthy in `role`,
    /// across all nodes.
    pub fn count_running(&self, id: &str, role: Role) -> u32 {
        self.instances()
            .filter(|i| i.id() == id && i.is_running_as(role))
            .count() as u32
    }

    /// Started container replicas of the bundle `bundle_id`.
    pub fn count_running_containers(&self, bundle_id: &str) -> u32 {
        self.root
            .descendants()
            .filter(|e| e.is("bundle") && e.id() == Some(bundle_id))
            .flat_map(|bundle| bundle.children_named("replica"))
            .flat_map(|replica| replica.children_named("resource"))
            .map(|element| Instance { element })
            .filter(|i| i.is_container() && i.is_running_as(Role::Started))
            .count() as u32
    }
}
