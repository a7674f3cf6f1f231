//! Cluster state reader.
//!
//! Every call re-runs the underlying pacemaker query; nothing is cached
//! between polls because the live cluster is the only source of truth.

use std::sync::Arc;

use tracing::debug;

use crate::cib::ClusterConfigTree;
use crate::command::{CommandRunner, command_line, run_checked};
use crate::error::{Error, Result};
use crate::status::ClusterStatusTree;

/// Exit statuses `crm_resource --meta -g` uses for an attribute that is not
/// configured: 6 on older pacemaker, `CRM_EX_NOSUCH` (105) on 2.x.
pub const ATTRIBUTE_NOT_SET: &[i32] = &[6, 105];

const STATUS_QUERY: (&str, &[&str]) = ("crm_mon", &["-r", "--as-xml"]);
const CONFIG_QUERY: (&str, &[&str]) = ("cibadmin", &["--query", "--scope", "resources"]);

/// Read-only access to the cluster's status, configuration and metadata.
#[derive(Clone)]
pub struct StateReader {
    runner: Arc<dyn CommandRunner>,
}

impl StateReader {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// Live status from `crm_mon`.
    pub async fn fetch_status(&self) -> Result<ClusterStatusTree> {
        let (program, args) = STATUS_QUERY;
        let output = run_checked(self.runner(), program, args).await?;
        Ok(ClusterStatusTree::parse(&output.stdout)?)
    }

    /// Resource configuration from the CIB.
    pub async fn fetch_config(&self) -> Result<ClusterConfigTree> {
        let (program, args) = CONFIG_QUERY;
        let output = run_checked(self.runner(), program, args).await?;
        Ok(ClusterConfigTree::parse(&output.stdout)?)
    }

    /// A resource meta attribute, `None` when it is not configured.
    pub async fn meta_attribute(&self, resource: &str, name: &str) -> Result<Option<String>> {
        let args = ["-r", resource, "--meta", "-g", name];
        let output = self.runner.run("crm_resource", &args).await?;

        if ATTRIBUTE_NOT_SET.contains(&output.status) {
            debug!(resource = %resource, attribute = %name, "Meta attribute not set");
            return Ok(None);
        }
        if !output.success() {
            return Err(Error::CommandFailed {
                command: command_line("crm_resource", &args),
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(Some(output.stdout.trim().to_string()))
    }

    /// A numeric meta attribute such as `clone-max`.
    pub async fn meta_count(&self, resource: &str, name: &str) -> Result<Option<u32>> {
        let Some(raw) = self.meta_attribute(resource, name).await? else {
            return Ok(None);
        };
        raw.parse::<u32>().map(Some).map_err(|_| Error::InvalidOutput {
            command: command_line("crm_resource", &["-r", resource, "--meta", "-g", name]),
            reason: format!("'{raw}' is not a count"),
        })
    }

    /// Nodes carrying the `<resource>-role=true` property (composable HA).
    pub async fn count_nodes_with_role(&self, resource: &str) -> Result<u32> {
        let output = run_checked(self.runner(), "pcs", &["property"]).await?;
        let needle = format!("{resource}-role=true");
        Ok(output.stdout.lines().filter(|l| l.contains(&needle)).count() as u32)
    }

    /// All nodes known to the cluster.
    pub async fn count_nodes(&self) -> Result<u32> {
        let output = run_checked(self.runner(), "crm_node", &["-l"]).await?;
        Ok(output.stdout.lines().filter(|l| !l.trim().is_empty()).count() as u32)
    }
}
