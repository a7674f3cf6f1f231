//! Readiness reconciler.
//!
//! Classifies a resource once, computes how many instances it needs, then
//! re-reads live status once per second until the running count matches
//! or the wait budget runs out.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cib::MatchMode;
use crate::classify::{ResourceKind, classify};
use crate::error::Result;
use crate::reader::StateReader;
use crate::strategy::CountStrategy;

/// Delay between two status checks.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default wait budget in seconds, as used by the playbooks.
pub const DEFAULT_MAX_WAIT: u32 = 5;

/// Options for a single readiness check.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    /// Wait budget in whole seconds. A budget of N allows N status checks
    /// with N-1 sleeps in between; 0 behaves like 1.
    pub max_wait: u32,
    pub match_mode: MatchMode,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            max_wait: DEFAULT_MAX_WAIT,
            match_mode: MatchMode::default(),
        }
    }
}

/// Final outcome of a readiness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Active,
    TimedOut,
    NotFound,
}

impl Verdict {
    pub fn is_success(self) -> bool {
        self == Verdict::Active
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Active => write!(f, "active"),
            Verdict::TimedOut => write!(f, "timed out"),
            Verdict::NotFound => write!(f, "not found"),
        }
    }
}

/// Result of [`Reconciler::is_active`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub kind: ResourceKind,
    pub resource: String,
    pub verdict: Verdict,
    pub message: String,
    /// Absent when the resource was not found.
    pub expected: Option<u32>,
    pub current: Option<u32>,
}

/// Polls the cluster until a resource is fully running.
pub struct Reconciler {
    reader: StateReader,
    options: ReconcileOptions,
}

impl Reconciler {
    pub fn new(reader: StateReader, options: ReconcileOptions) -> Self {
        Self { reader, options }
    }

    /// Wait for `resource` to reach its expected instance count.
    ///
    /// Command failures abort the check immediately; `NotFound` and
    /// `TimedOut` are reported through the verdict.
    pub async fn is_active(&self, resource: &str) -> Result<ReconciliationResult> {
        let max_wait = self.options.max_wait;
        let mode = self.options.match_mode;

        let config = self.reader.fetch_config().await?;
        let kind = classify(resource, &config, mode);
        let Some(strategy) = CountStrategy::resolve(kind, resource, &config, mode)? else {
            warn!(resource = %resource, "Resource not found in the CIB");
            return Ok(ReconciliationResult {
                kind,
                resource: resource.to_string(),
                verdict: Verdict::NotFound,
                message: format!("Resource '{resource}' doesn't exist in the cib."),
                expected: None,
                current: None,
            });
        };
        drop(config);

        let expected = strategy.expected_count(resource, &self.reader).await?;
        info!(resource = %resource, kind = %kind, expected, "Waiting for resource");

        let mut attempt: u32 = 0;
        loop {
            let status = self.reader.fetch_status().await?;
            let current = strategy.current_count(resource, &status);
            debug!(resource = %resource, attempt, expected, current, "Checked resource");

            if current == expected {
                info!(resource = %resource, kind = %kind, "Resource is active");
                return Ok(self.finish(kind, resource, Verdict::Active, expected, current));
            }

            // Budget N means N checks in total, not N sleeps.
            if attempt.saturating_add(1) >= max_wait {
                warn!(resource = %resource, expected, current, max_wait, "Gave up waiting for resource");
                return Ok(self.finish(kind, resource, Verdict::TimedOut, expected, current));
            }

            tokio::time::sleep(POLL_INTERVAL).await;
            attempt += 1;
        }
    }

    fn finish(
        &self,
        kind: ResourceKind,
        resource: &str,
        verdict: Verdict,
        expected: u32,
        current: u32,
    ) -> ReconciliationResult {
        let message = match verdict {
            Verdict::Active => format!("Resource {resource} is active"),
            _ => format!(
                "Max wait time of {} second reached waiting for {resource}",
                self.options.max_wait
            ),
        };
        ReconciliationResult {
            kind,
            resource: resource.to_string(),
            verdict,
            message,
            expected: Some(expected),
            current: Some(current),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::time::Instant;

    use super::*;
    use crate::command::CommandOutput;
    use crate::command::fake::ScriptedRunner;
    use crate::error::Error;

    const STATUS_QUERY: &str = "crm_mon -r --as-xml";
    const CONFIG_QUERY: &str = "cibadmin --query --scope resources";

    const CIB: &str = r#"<resources>
      <primitive id="openstack-cinder-volume" class="systemd" type="openstack-cinder-volume"/>
      <clone id="haproxy-clone"><primitive id="haproxy"/></clone>
      <bundle id="galera-bundle"><podman image="galera" masters="1" replicas="3"/><primitive id="galera"/></bundle>
    </resources>"#;

    fn started(id: &str, n: usize) -> String {
        let instance = format!(
            r#"<resource id="{id}" role="Started" active="true" orphaned="false" failed="false"/>"#
        );
        format!(
            "<crm_mon><resources>{}</resources></crm_mon>",
            instance.repeat(n)
        )
    }

    fn reconciler(runner: &Arc<ScriptedRunner>, max_wait: u32) -> Reconciler {
        Reconciler::new(
            StateReader::new(runner.clone()),
            ReconcileOptions {
                max_wait,
                match_mode: MatchMode::Substring,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_immediately_without_sleeping() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on(CONFIG_QUERY, CommandOutput::ok(CIB))
                .on("crm_resource -r haproxy --meta -g clone-max", CommandOutput::ok("3\n"))
                .on(STATUS_QUERY, CommandOutput::ok(started("haproxy", 3))),
        );
        let start = Instant::now();

        let result = reconciler(&runner, 5).is_active("haproxy").await.unwrap();

        assert_eq!(result.verdict, Verdict::Active);
        assert_eq!(result.kind, ResourceKind::Clone);
        assert_eq!(result.expected, Some(3));
        assert_eq!(result.current, Some(3));
        assert_eq!(result.message, "Resource haproxy is active");
        assert_eq!(runner.count(STATUS_QUERY), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_max_wait_checks() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on(CONFIG_QUERY, CommandOutput::ok(CIB))
                .on(STATUS_QUERY, CommandOutput::ok(started("openstack-cinder-volume", 0))),
        );
        let start = Instant::now();

        let result = reconciler(&runner, 3)
            .is_active("openstack-cinder-volume")
            .await
            .unwrap();

        assert_eq!(result.verdict, Verdict::TimedOut);
        assert_eq!(result.kind, ResourceKind::Primitive);
        assert_eq!(
            result.message,
            "Max wait time of 3 second reached waiting for openstack-cinder-volume"
        );
        // three checks, two sleeps: the last check is not followed by a sleep
        assert_eq!(runner.count(STATUS_QUERY), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_wait_of_one_checks_once() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on(CONFIG_QUERY, CommandOutput::ok(CIB))
                .on(STATUS_QUERY, CommandOutput::ok(started("openstack-cinder-volume", 0))),
        );

        for max_wait in [0, 1] {
            let result = reconciler(&runner, max_wait)
                .is_active("openstack-cinder-volume")
                .await
                .unwrap();
            assert_eq!(result.verdict, Verdict::TimedOut);
        }
        assert_eq!(runner.count(STATUS_QUERY), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_becomes_active_while_polling() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on(CONFIG_QUERY, CommandOutput::ok(CIB))
                .on("crm_resource -r haproxy --meta -g clone-max", CommandOutput::ok("3\n"))
                .on(STATUS_QUERY, CommandOutput::ok(started("haproxy", 1)))
                .on(STATUS_QUERY, CommandOutput::ok(started("haproxy", 2)))
                .on(STATUS_QUERY, CommandOutput::ok(started("haproxy", 3))),
        );
        let start = Instant::now();

        let result = reconciler(&runner, 10).is_active("haproxy").await.unwrap();

        assert_eq!(result.verdict, Verdict::Active);
        assert_eq!(runner.count(STATUS_QUERY), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expected_count_computed_once() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on(CONFIG_QUERY, CommandOutput::ok(CIB))
                .on("crm_resource -r haproxy --meta -g clone-max", CommandOutput::ok("3\n"))
                .on(STATUS_QUERY, CommandOutput::ok(started("haproxy", 2))),
        );

        let result = reconciler(&runner, 4).is_active("haproxy").await.unwrap();

        assert_eq!(result.verdict, Verdict::TimedOut);
        assert_eq!(runner.count(STATUS_QUERY), 4);
        assert_eq!(runner.count("crm_resource -r haproxy --meta -g clone-max"), 1);
        assert_eq!(runner.count(CONFIG_QUERY), 1);
    }

    #[tokio::test]
    async fn test_not_found_never_polls() {
        let runner = Arc::new(ScriptedRunner::new().on(CONFIG_QUERY, CommandOutput::ok(CIB)));

        let result = reconciler(&runner, 5).is_active("blhaaa").await.unwrap();

        assert_eq!(result.verdict, Verdict::NotFound);
        assert_eq!(result.kind, ResourceKind::Unknown);
        assert_eq!(result.message, "Resource 'blhaaa' doesn't exist in the cib.");
        assert_eq!(result.expected, None);
        assert_eq!(runner.count(STATUS_QUERY), 0);
    }

    #[tokio::test]
    async fn test_bundle_with_masters_expects_master_count() {
        let status = r#"<crm_mon><resources><bundle id="galera-bundle"><replica id="0">
            <resource id="galera" role="Master" active="true" orphaned="false" failed="false"/>
          </replica></bundle></resources></crm_mon>"#;
        let runner = Arc::new(
            ScriptedRunner::new()
                .on(CONFIG_QUERY, CommandOutput::ok(CIB))
                .on(STATUS_QUERY, CommandOutput::ok(status)),
        );

        let result = reconciler(&runner, 5).is_active("galera").await.unwrap();

        assert_eq!(result.kind, ResourceKind::Bundle);
        assert_eq!(result.expected, Some(1));
        assert_eq!(result.verdict, Verdict::Active);
    }

    #[tokio::test]
    async fn test_command_error_aborts() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on(CONFIG_QUERY, CommandOutput::ok(CIB))
                .on(
                    "crm_resource -r haproxy --meta -g clone-max",
                    CommandOutput::new(1, "", "connection refused"),
                ),
        );

        let err = reconciler(&runner, 5).is_active("haproxy").await.unwrap_err();

        assert!(matches!(err, Error::CommandFailed { status: 1, .. }));
        assert_eq!(runner.count(STATUS_QUERY), 0);
    }
}
