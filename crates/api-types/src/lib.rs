//! Data types for the incident management API.
//!
//! These structs define the JSON bodies exchanged with the backend. They are
//! provided in a separate crate so that consumers such as dashboards can
//! depend on them without pulling in the rest of the sync engine.

#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an incident.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    /// Incident is open and alerting.
    Firing,
    /// Incident has been acknowledged by an operator.
    Acknowledged,
    /// Incident is resolved.
    Resolved,
    /// Incident was merged into another incident.
    Merged,
    /// Incident was deleted.
    Deleted,
}

/// Severity of an incident or alert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Warning,
    Info,
    Low,
}

/// A tracked operational event aggregating one or more alerts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Incident {
    pub id: String,
    pub user_generated_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_generated_name: Option<String>,
    pub status: IncidentStatus,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub alert_sources: Vec<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub alerts_count: u32,
    /// Candidate incidents were opened by correlation and await confirmation.
    #[serde(default)]
    pub is_candidate: bool,
    /// Predicted incidents were opened by the prediction engine.
    #[serde(default)]
    pub is_predicted: bool,
    pub creation_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen_time: Option<DateTime<Utc>>,
}

/// State of a single alert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Firing,
    Resolved,
    Acknowledged,
    Suppressed,
}

/// A single alert attached to an incident.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub id: String,
    pub name: String,
    pub status: AlertStatus,
    pub severity: Severity,
    /// Originating provider, e.g. "pagerduty" or "grafana".
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    pub last_received: DateTime<Utc>,
}

/// Outcome of a workflow execution tied to an incident.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowExecutionStatus {
    Success,
    Failed,
    InProgress,
    Timeout,
}

/// A single workflow execution triggered by an incident.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowExecution {
    pub id: String,
    pub workflow_id: String,
    pub status: WorkflowExecutionStatus,
    pub started: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A page of results with its pagination envelope.
///
/// Invariant: `limit > 0`, `offset >= 0`; `count` is the total number of
/// matching rows, not the page size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paginated<T> {
    pub limit: u64,
    pub offset: u64,
    pub count: u64,
    pub items: Vec<T>,
}

pub type PaginatedIncidents = Paginated<Incident>;
pub type PaginatedAlerts = Paginated<Alert>;
pub type PaginatedWorkflowExecutions = Paginated<WorkflowExecution>;

/// Aggregate filter vocabulary across all incidents in the tenant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncidentsMetadata {
    #[serde(default)]
    pub statuses: Vec<String>,
    #[serde(default)]
    pub severities: Vec<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Role of the authenticated principal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Noc,
    Webhook,
    #[serde(rename = "workflowrunner")]
    WorkflowRunner,
}

/// The authenticated session returned by the readiness handshake.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub user: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::{Incident, IncidentStatus, Role, Session, Severity};
    use serde_json::json;

    #[test]
    fn incident_deserializes_with_optional_fields_missing() {
        let body = json!({
            "id": "inc-1",
            "user_generated_name": "Database latency spike",
            "status": "firing",
            "severity": "critical",
            "creation_time": "2025-05-12T07:48:00Z"
        });
        let incident: Incident = serde_json::from_value(body).unwrap();
        assert_eq!(incident.status, IncidentStatus::Firing);
        assert_eq!(incident.severity, Severity::Critical);
        assert!(incident.assignee.is_none());
        assert!(incident.alert_sources.is_empty());
        assert!(!incident.is_candidate);
    }

    #[test]
    fn status_round_trips_lowercase() {
        let status: IncidentStatus = serde_json::from_str("\"acknowledged\"").unwrap();
        assert_eq!(status, IncidentStatus::Acknowledged);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"acknowledged\"");
    }

    #[test]
    fn session_deserializes_workflowrunner_role() {
        let session: Session =
            serde_json::from_value(json!({"user": "runner", "role": "workflowrunner"})).unwrap();
        assert_eq!(session.role, Role::WorkflowRunner);
    }
}
