//! Test helpers for pcmk-ctl integration tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pcmk_ctl::command::command_line;
use pcmk_ctl::{CommandOutput, CommandRunner, ReconcileOptions, Reconciler, StateReader};

pub const STATUS_QUERY: &str = "crm_mon -r --as-xml";
pub const CONFIG_QUERY: &str = "cibadmin --query --scope resources";

pub const CRM_MON: &str = include_str!("../fixtures/crm_mon.xml");
pub const CIB_RESOURCES: &str = include_str!("../fixtures/cib_resources.xml");

/// Fake cluster answering pacemaker commands from fixtures.
///
/// Outputs are queued per command line; the last one keeps being returned.
#[derive(Default)]
pub struct FakeCluster {
    script: Mutex<HashMap<String, VecDeque<CommandOutput>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeCluster {
    /// A healthy cluster: recorded `crm_mon` status and CIB resources.
    pub fn recorded() -> Self {
        Self::default()
            .on(STATUS_QUERY, CommandOutput::ok(CRM_MON))
            .on(CONFIG_QUERY, CommandOutput::ok(CIB_RESOURCES))
    }

    pub fn on(self, command: &str, output: CommandOutput) -> Self {
        self.script
            .lock()
            .unwrap()
            .entry(command.to_string())
            .or_default()
            .push_back(output);
        self
    }

    pub fn count(&self, command: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == command)
            .count()
    }
}

#[async_trait]
impl CommandRunner for FakeCluster {
    async fn run(&self, program: &str, args: &[&str]) -> pcmk_ctl::Result<CommandOutput> {
        let line = command_line(program, args);
        self.calls.lock().unwrap().push(line.clone());

        let mut script = self.script.lock().unwrap();
        Ok(match script.get_mut(&line) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => CommandOutput::new(127, "", format!("{line}: command not found")),
        })
    }
}

pub fn reconciler(cluster: &Arc<FakeCluster>, options: ReconcileOptions) -> Reconciler {
    Reconciler::new(StateReader::new(cluster.clone()), options)
}
