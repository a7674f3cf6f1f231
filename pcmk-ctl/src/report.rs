//! Structured results printed by the CLI.

use std::process::ExitCode;

use serde::Serialize;
use serde_json::Value;

use crate::classify::ResourceKind;
use crate::reconciler::ReconciliationResult;

/// One JSON object per invocation: `{"changed": .., "failed": .., "msg": ..}`
/// plus whatever the subcommand has to add.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub changed: bool,
    pub failed: bool,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ResourceKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rc: Option<i32>,
}

impl Report {
    pub fn success(changed: bool, msg: impl Into<String>) -> Self {
        Self {
            changed,
            msg: msg.into(),
            ..Default::default()
        }
    }

    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            failed: true,
            msg: msg.into(),
            ..Default::default()
        }
    }

    pub fn with_out(mut self, out: impl Serialize) -> serde_json::Result<Self> {
        self.out = Some(serde_json::to_value(out)?);
        Ok(self)
    }

    pub fn with_rc(mut self, rc: i32) -> Self {
        self.rc = Some(rc);
        self
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.failed {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"changed":false,"failed":true,"msg":"cannot encode report: {e}"}}"#)
        })
    }
}

impl From<&ReconciliationResult> for Report {
    fn from(result: &ReconciliationResult) -> Self {
        let success = result.verdict.is_success();
        Self {
            changed: success,
            failed: !success,
            msg: result.message.clone(),
            kind: Some(result.kind),
            resource: Some(result.resource.clone()),
            expected: result.expected,
            current: result.current,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::reconciler::Verdict;

    #[test]
    fn test_active_result_report() {
        let result = ReconciliationResult {
            kind: ResourceKind::Master,
            resource: "galera".to_string(),
            verdict: Verdict::Active,
            message: "Resource galera is active".to_string(),
            expected: Some(3),
            current: Some(3),
        };
        let report = Report::from(&result);
        let json: Value = serde_json::from_str(&report.to_json()).unwrap();

        assert_eq!(json["changed"], true);
        assert_eq!(json["failed"], false);
        assert_eq!(json["kind"], "master");
        assert_eq!(json["expected"], 3);
        assert_eq!(json["msg"], "Resource galera is active");
        assert!(json.get("rc").is_none());
    }

    #[test]
    fn test_not_found_report_fails() {
        let result = ReconciliationResult {
            kind: ResourceKind::Unknown,
            resource: "blhaaa".to_string(),
            verdict: Verdict::NotFound,
            message: "Resource 'blhaaa' doesn't exist in the cib.".to_string(),
            expected: None,
            current: None,
        };
        let report = Report::from(&result);
        let json: Value = serde_json::from_str(&report.to_json()).unwrap();

        assert_eq!(json["failed"], true);
        assert_eq!(json["kind"], "unknown");
        assert!(json.get("expected").is_none());
    }

    #[test]
    fn test_report_with_out_and_rc() {
        let report = Report::success(true, "done")
            .with_out(vec!["controller-0", "controller-1"])
            .unwrap()
            .with_rc(0);
        let json: Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(json["out"][1], "controller-1");
        assert_eq!(json["rc"], 0);
    }

    #[test]
    fn test_with_out_reports_encoding_errors() {
        // JSON object keys must be strings
        let out = BTreeMap::from([((1, 2), "controller-0")]);
        assert!(Report::success(true, "done").with_out(out).is_err());
    }
}
