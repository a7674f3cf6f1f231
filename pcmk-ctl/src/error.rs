//! Error types for cluster queries and control commands.

use thiserror::Error;

use crate::xml::XmlError;

/// Errors that can occur while talking to the cluster tooling.
///
/// Every variant is fatal for the operation that raised it: nothing here is
/// retried. A metadata attribute that is simply not configured is not an
/// error and is reported as `None` by the reader instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The external program could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program exited unsuccessfully.
    #[error("`{command}` exited with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    /// The program succeeded but its output could not be interpreted.
    #[error("unexpected output from `{command}`: {reason}")]
    InvalidOutput { command: String, reason: String },

    /// The configuration holds a value pacemaker itself would reject.
    #[error("invalid configuration for {resource}: {reason}")]
    InvalidConfig { resource: String, reason: String },

    /// Cluster XML could not be parsed.
    #[error("malformed cluster XML: {0}")]
    Xml(#[from] XmlError),

    /// A result could not be rendered as JSON.
    #[error("cannot encode result: {0}")]
    Encode(#[from] serde_json::Error),

    /// An observable resource state was requested as an action.
    #[error("'{0}' is a resource state, not an action pcs can apply")]
    NotAnAction(String),
}

/// Result type for cluster operations.
pub type Result<T> = std::result::Result<T, Error>;
