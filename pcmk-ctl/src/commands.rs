//! Subcommand handlers. Each turns library results into a [`Report`].

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::info;

use pcmk_ctl::cluster::{ClusterManager, ClusterState, NodeSelector, RestartOutcome};
use pcmk_ctl::report::Report;
use pcmk_ctl::resource::{ResourceManager, ResourceState};
use pcmk_ctl::{CommandRunner, MatchMode, ReconcileOptions, Reconciler, Result, StateReader};

use crate::{ClusterAction, ClusterArgs, IsActiveArgs, ResourceArgs};

pub async fn is_active(runner: Arc<dyn CommandRunner>, args: IsActiveArgs) -> Result<Report> {
    let options = ReconcileOptions {
        max_wait: args.max_wait,
        match_mode: if args.exact_match {
            MatchMode::Exact
        } else {
            MatchMode::Substring
        },
    };
    let reconciler = Reconciler::new(StateReader::new(runner), options);
    let result = reconciler.is_active(&args.resource).await?;
    Ok(Report::from(&result))
}

pub async fn cluster(runner: Arc<dyn CommandRunner>, args: ClusterArgs) -> Result<Report> {
    let cluster = ClusterManager::new(runner);
    let timeout = Duration::from_secs(args.timeout);

    let target = match args.state {
        ClusterAction::Online => ClusterState::Online,
        ClusterAction::Offline => ClusterState::Offline,
        ClusterAction::Restart => {
            return Ok(match cluster.restart(timeout, args.force).await? {
                RestartOutcome::Restarted => {
                    Report::success(true, "Cluster restarted").with_out(ClusterState::Online)?
                }
                RestartOutcome::StopFailed => Report::failure(
                    "Failed during the restart of the cluster, the cluster can't be stopped",
                ),
                RestartOutcome::StartFailed => Report::failure(
                    "Failed during the restart of the cluster, the cluster can't be started",
                ),
            });
        }
        ClusterAction::Cleanup => {
            cluster.cleanup().await?;
            return Ok(Report::success(true, "Cluster resources cleaned up"));
        }
    };

    match args.node.as_deref() {
        None => {
            let current = cluster.status().await?;
            if current == target {
                return Ok(
                    Report::success(false, format!("Cluster is {current}")).with_out(current)?
                );
            }
            if args.check_and_fail {
                return Ok(Report::failure(format!("State not found to be in {target}")));
            }
            if cluster.set_state(target, timeout, args.force).await? {
                info!(state = %target, "Cluster state changed");
                Ok(Report::success(true, format!("Cluster is {target}")).with_out(target)?)
            } else {
                Ok(Report::failure(format!(
                    "Failed to set the state `{target}` on the cluster"
                )))
            }
        }
        Some(node) => {
            let selector = NodeSelector::parse(node);
            let nodes = cluster.node_status(&selector).await?;
            if !nodes.is_empty() && nodes.iter().all(|n| n.is(target)) {
                return Ok(
                    Report::success(false, format!("Nodes are {target}")).with_out(nodes)?
                );
            }
            if args.check_and_fail {
                return Ok(Report::failure(format!("State not found to be in {target}")));
            }
            let reached = cluster
                .set_node_state(&selector, target, timeout, args.force)
                .await?;
            let nodes = cluster.node_status(&selector).await?;
            if reached {
                Ok(Report::success(true, format!("Nodes are {target}")).with_out(nodes)?)
            } else {
                Ok(Report::failure(format!("Failed to set the state `{target}` on the nodes"))
                    .with_out(nodes)?)
            }
        }
    }
}

pub async fn resource(runner: Arc<dyn CommandRunner>, args: ResourceArgs) -> Result<Report> {
    let resources = ResourceManager::new(runner);
    let timeout = Duration::from_secs(args.timeout);
    let resource = args.resource.as_str();
    let state = args.state;

    if args.check_mode {
        let reached = resources.check_state(resource, state).await?
            || (args.wait_for_resource && resources.wait_for_state(resource, state, timeout).await?);
        return Ok(if reached {
            Report::success(false, format!("Resource {resource} is {state}"))
                .with_out(json!({ "resource": resource, "status": state }))?
        } else {
            Report::failure(format!("Failed, the resource {resource} is not {state}"))
        });
    }

    if state == ResourceState::Delete && !resources.config(resource).await?.success() {
        return Ok(Report::success(false, format!("Resource {resource} is already deleted"))
            .with_out(json!({ "resource": resource, "status": "deleted" }))?);
    }

    let output = resources.apply(resource, state, timeout).await?;
    if !output.success() {
        return Ok(Report::failure(format!(
            "Failed, to set the resource {resource} to the state {state}"
        ))
        .with_rc(output.status)
        .with_out(json!({ "output": output.stdout, "error": output.stderr }))?);
    }

    Ok(Report::success(true, format!("Resource {resource} set to {state}"))
        .with_out(&output.stdout)?
        .with_rc(output.status))
}
