//! Cluster-level control: start, stop, restart and cleanup.
//!
//! Mutating commands are issued once; convergence is observed by polling
//! `status()` / `node_status()` until the deadline.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::command::{CommandRunner, run_checked};
use crate::error::Result;
use crate::reconciler::POLL_INTERVAL;

/// Whether the cluster (or a node) is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClusterState {
    Online,
    Offline,
}

impl ClusterState {
    pub fn as_str(self) -> &'static str {
        match self {
            ClusterState::Online => "online",
            ClusterState::Offline => "offline",
        }
    }
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of `pcs cluster pcsd-status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub name: String,
    pub state: String,
}

impl NodeStatus {
    pub fn is(&self, state: ClusterState) -> bool {
        self.state.eq_ignore_ascii_case(state.as_str())
    }
}

/// Node selection for node-level operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSelector {
    All,
    Named(String),
}

impl NodeSelector {
    pub fn parse(value: &str) -> Self {
        if value == "all" {
            NodeSelector::All
        } else {
            NodeSelector::Named(value.to_string())
        }
    }
}

pub struct ClusterManager {
    runner: Arc<dyn CommandRunner>,
}

impl ClusterManager {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// Online only when this node is in a quorate partition and
    /// `pcs cluster status` succeeds.
    pub async fn status(&self) -> Result<ClusterState> {
        let quorate = self.runner.run("crm_node", &["-q"]).await?;
        if quorate.stdout.trim() != "1" {
            debug!("Not in a quorate partition");
            return Ok(ClusterState::Offline);
        }

        let status = self.runner.run("pcs", &["cluster", "status"]).await?;
        if status.success() {
            Ok(ClusterState::Online)
        } else {
            Ok(ClusterState::Offline)
        }
    }

    /// pcsd status of one node, or of every node.
    pub async fn node_status(&self, node: &NodeSelector) -> Result<Vec<NodeStatus>> {
        let mut args = vec!["cluster", "pcsd-status"];
        if let NodeSelector::Named(name) = node {
            args.push(name);
        }
        let output = run_checked(self.runner(), "pcs", &args).await?;
        Ok(parse_node_status(&output.stdout))
    }

    /// Start or stop the whole cluster and wait until it reports `target`.
    /// Returns whether the state was reached before `timeout`.
    pub async fn set_state(
        &self,
        target: ClusterState,
        timeout: Duration,
        force: bool,
    ) -> Result<bool> {
        let args = transition_args(target, force, None);
        info!(target = %target, "Changing cluster state");
        run_checked(self.runner(), "pcs", &args).await?;

        let deadline = Instant::now() + timeout;
        loop {
            if self.status().await? == target {
                return Ok(true);
            }
            if Instant::now() + POLL_INTERVAL > deadline {
                warn!(target = %target, "Cluster did not reach state before timeout");
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Start or stop every selected node that is not already in `target`,
    /// then wait until all of them report it.
    pub async fn set_node_state(
        &self,
        node: &NodeSelector,
        target: ClusterState,
        timeout: Duration,
        force: bool,
    ) -> Result<bool> {
        for status in self.node_status(node).await? {
            if status.is(target) {
                continue;
            }
            info!(node = %status.name, target = %target, "Changing node state");
            let args = transition_args(target, force, Some(status.name.as_str()));
            run_checked(self.runner(), "pcs", &args).await?;
        }

        let deadline = Instant::now() + timeout;
        loop {
            let nodes = self.node_status(node).await?;
            if !nodes.is_empty() && nodes.iter().all(|n| n.is(target)) {
                return Ok(true);
            }
            if Instant::now() + POLL_INTERVAL > deadline {
                warn!(target = %target, "Nodes did not reach state before timeout");
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Stop then start the cluster. Returns whether both steps converged.
    pub async fn restart(&self, timeout: Duration, force: bool) -> Result<RestartOutcome> {
        if !self.set_state(ClusterState::Offline, timeout, force).await? {
            return Ok(RestartOutcome::StopFailed);
        }
        if !self.set_state(ClusterState::Online, timeout, force).await? {
            return Ok(RestartOutcome::StartFailed);
        }
        Ok(RestartOutcome::Restarted)
    }

    /// Clear failed actions and fail counts for every resource.
    pub async fn cleanup(&self) -> Result<()> {
        info!("Cleaning up cluster resources");
        run_checked(self.runner(), "pcs", &["resource", "cleanup"]).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    Restarted,
    StopFailed,
    StartFailed,
}

fn transition_args(target: ClusterState, force: bool, node: Option<&str>) -> Vec<&str> {
    let mut args = match target {
        ClusterState::Online => vec!["cluster", "start"],
        ClusterState::Offline => vec!["cluster", "stop"],
    };
    if target == ClusterState::Offline && force {
        args.push("--force");
    }
    if let Some(node) = node {
        args.push(node);
    }
    args
}

/// Parse `name: Online|Offline` lines, skipping warnings and anything else
/// pcs prints.
fn parse_node_status(stdout: &str) -> Vec<NodeStatus> {
    stdout
        .lines()
        .filter_map(|line| {
            let (name, state) = line.split_once(':')?;
            let (name, state) = (name.trim(), state.trim());
            let known = [ClusterState::Online, ClusterState::Offline]
                .iter()
                .any(|s| state.eq_ignore_ascii_case(s.as_str()));
            if name.is_empty() || !known {
                return None;
            }
            Some(NodeStatus {
                name: name.to_string(),
                state: state.to_string(),
            })
        })
        .collect()
}
