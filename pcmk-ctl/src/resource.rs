//! Resource-level control through `pcs resource`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::command::{CommandOutput, CommandRunner};
use crate::error::{Error, Result};
use crate::reconciler::POLL_INTERVAL;

/// Requested resource state. The first seven are actions `pcs resource`
/// can apply; the rest can only be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    Manage,
    Unmanage,
    Enable,
    Disable,
    Restart,
    Show,
    Delete,
    Started,
    Stopped,
    Master,
    Slave,
}

impl ResourceState {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceState::Manage => "manage",
            ResourceState::Unmanage => "unmanage",
            ResourceState::Enable => "enable",
            ResourceState::Disable => "disable",
            ResourceState::Restart => "restart",
            ResourceState::Show => "show",
            ResourceState::Delete => "delete",
            ResourceState::Started => "started",
            ResourceState::Stopped => "stopped",
            ResourceState::Master => "master",
            ResourceState::Slave => "slave",
        }
    }

    pub fn is_action(self) -> bool {
        !matches!(
            self,
            ResourceState::Started
                | ResourceState::Stopped
                | ResourceState::Master
                | ResourceState::Slave
        )
    }

    /// Actions pcs can block on with `--wait`.
    fn supports_wait(self) -> bool {
        matches!(
            self,
            ResourceState::Enable | ResourceState::Disable | ResourceState::Restart
        )
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ResourceManager {
    runner: Arc<dyn CommandRunner>,
}

impl ResourceManager {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Whether `pcs status --full` shows `resource` in `state`.
    pub async fn check_state(&self, resource: &str, state: ResourceState) -> Result<bool> {
        let output = self.runner.run("pcs", &["status", "--full"]).await?;
        let found = output
            .stdout
            .lines()
            .filter(|line| names_resource(line, resource))
            .any(|line| line.to_lowercase().contains(state.as_str()));
        debug!(resource = %resource, state = %state, found, "Checked resource state");
        Ok(found)
    }

    /// Poll [`check_state`](Self::check_state) until it holds or `timeout`
    /// expires.
    pub async fn wait_for_state(
        &self,
        resource: &str,
        state: ResourceState,
        timeout: Duration,
    ) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.check_state(resource, state).await? {
                return Ok(true);
            }
            if Instant::now() + POLL_INTERVAL > deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// `pcs resource config <resource>`; fails when the resource is absent.
    pub async fn config(&self, resource: &str) -> Result<CommandOutput> {
        self.runner.run("pcs", &["resource", "config", resource]).await
    }

    /// Apply an action. The raw pcs output is returned so callers can
    /// report it; a delete that leaves the resource behind is turned into a
    /// failed output.
    pub async fn apply(
        &self,
        resource: &str,
        action: ResourceState,
        timeout: Duration,
    ) -> Result<CommandOutput> {
        if !action.is_action() {
            return Err(Error::NotAnAction(action.to_string()));
        }

        let wait = format!("--wait={}", timeout.as_secs());
        let mut args = vec!["resource", action.as_str(), resource];
        if action.supports_wait() {
            args.push(&wait);
        }

        info!(resource = %resource, action = %action, "Applying resource action");
        let output = self.runner.run("pcs", &args).await?;

        if output.success()
            && action == ResourceState::Delete
            && self.config(resource).await?.success()
        {
            return Ok(CommandOutput::new(
                1,
                "Resource still present after deletion command",
                "",
            ));
        }
        Ok(output)
    }
}

/// `grep -w "<resource>[ \t]"`: the resource appears as a whole word and is
/// followed by a space or tab.
fn names_resource(line: &str, resource: &str) -> bool {
    if resource.is_empty() {
        return false;
    }
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    line.match_indices(resource).any(|(start, _)| {
        let before = line[..start].chars().next_back();
        let after = line[start + resource.len()..].chars().next();
        !before.is_some_and(is_word) && matches!(after, Some(' ') | Some('\t'))
    })
}
