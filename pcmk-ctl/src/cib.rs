//! Static resource configuration (the `<resources>` section of the CIB).

use crate::error::{Error, Result};
use crate::xml::{Element, XmlError};

/// How a query identifier is matched against configured resource ids.
///
/// Both modes look at the entry id and at the ids of the primitives a
/// wrapper holds, so every exact match is also a substring match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// An id contains the query. Tolerates the `-clone`, `-master` and
    /// `-bundle` suffixes of generated wrapper ids, but also matches any
    /// unrelated resource whose id is a superstring of the query (`rabbit`
    /// matches `rabbitmq-bundle`). First match in document order wins.
    #[default]
    Substring,
    /// An id equals the query.
    Exact,
}

impl MatchMode {
    fn matches(self, entry: &Element, query: &str) -> bool {
        let Some(id) = entry.id() else {
            return false;
        };
        let accepts = |candidate: &str| match self {
            MatchMode::Substring => candidate.contains(query),
            MatchMode::Exact => candidate == query,
        };
        accepts(id)
            || entry
                .children
                .iter()
                .filter(|c| c.is("primitive") || c.is("resource"))
                .filter_map(Element::id)
                .any(accepts)
    }
}

/// Container element names a bundle may use.
const CONTAINER_ELEMENTS: &[&str] = &["docker", "podman", "rkt"];

/// What a bundle wraps and how many copies it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLayout {
    /// Bundle id as configured, e.g. `galera-bundle`.
    pub id: String,
    /// Id of the embedded primitive, empty for a plain container bundle.
    pub primitive: String,
    pub masters: u32,
    pub replicas: u32,
}

impl BundleLayout {
    pub fn has_primitive(&self) -> bool {
        !self.primitive.is_empty()
    }

    fn from_element(bundle: &Element) -> Result<Self> {
        let id = bundle.id().unwrap_or_default().to_string();
        let container = bundle
            .children
            .iter()
            .find(|c| CONTAINER_ELEMENTS.contains(&c.name.as_str()));

        let count = |name: &str| -> Result<Option<u32>> {
            match container.and_then(|c| c.attr(name)) {
                None => Ok(None),
                Some(raw) => raw.trim().parse::<u32>().map(Some).map_err(|_| Error::InvalidConfig {
                    resource: id.clone(),
                    reason: format!("{name}=\"{raw}\" is not a count"),
                }),
            }
        };

        // promoted-max is the pacemaker 2.1 spelling of masters
        let masters = match count("masters")? {
            Some(masters) => masters,
            None => count("promoted-max")?.unwrap_or(0),
        };
        // Pacemaker defaults replicas to the master count, or 1
        let replicas = count("replicas")?.unwrap_or(masters.max(1));

        let primitive = bundle
            .children_named("primitive")
            .find_map(Element::id)
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            id,
            primitive,
            masters,
            replicas,
        })
    }
}

/// Parsed resource configuration. Immutable; fetched fresh per run.
#[derive(Debug, Clone)]
pub struct ClusterConfigTree {
    root: Element,
}

impl ClusterConfigTree {
    pub fn parse(xml: &str) -> std::result::Result<Self, XmlError> {
        Ok(Self {
            root: Element::parse(xml)?,
        })
    }

    /// Top-level resource entries: direct children of any `<resources>`
    /// element, in document order.
    pub fn entries(&self) -> impl Iterator<Item = &Element> {
        self.root
            .descendants()
            .filter(|e| e.is("resources"))
            .flat_map(|resources| resources.children.iter())
    }

    /// First entry matching `query`.
    pub fn find_entry(&self, query: &str, mode: MatchMode) -> Option<&Element> {
        self.entries().find(|entry| mode.matches(entry, query))
    }

    /// Layout of the first bundle entry matching `query`.
    pub fn bundle_layout(&self, query: &str, mode: MatchMode) -> Result<Option<BundleLayout>> {
        self.entries()
            .filter(|entry| entry.is("bundle"))
            .find(|entry| mode.matches(entry, query))
            .map(BundleLayout::from_element)
            .transpose()
    }
}

/// Value of a `<meta_attributes><nvpair name=.. value=../>` entry directly
/// under `entry`.
pub fn meta_attribute<'a>(entry: &'a Element, name: &str) -> Option<&'a str> {
    entry
        .children_named("meta_attributes")
        .flat_map(|meta| meta.children_named("nvpair"))
        .find(|nv| nv.attr("name") == Some(name))
        .and_then(|nv| nv.attr("value"))
}
