//! pcmk-ctl: Pacemaker cluster control.
//!
//! The core answers "is this resource fully running?": it classifies a
//! resource from the CIB, derives how many instances it needs and polls
//! `crm_mon` until the running count matches or the wait budget is spent.
//! Cluster and resource control commands sit on the same command runner.

pub mod cib;
pub mod classify;
pub mod cluster;
pub mod command;
pub mod error;
pub mod reader;
pub mod reconciler;
pub mod report;
pub mod resource;
pub mod status;
pub mod strategy;
pub mod xml;

pub use classify::{ResourceKind, classify};
pub use cib::{ClusterConfigTree, MatchMode};
pub use command::{CommandOutput, CommandRunner, SystemRunner};
pub use error::{Error, Result};
pub use reader::StateReader;
pub use reconciler::{ReconcileOptions, ReconciliationResult, Reconciler, Verdict};
pub use status::ClusterStatusTree;
