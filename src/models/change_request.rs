//! Change requests: records, submission DTOs and review payloads.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::require;
use crate::error::{AppError, Result};
use crate::normalize::{foreign_key, record_id, text};

/// Workflow status of a change request.
///
/// Values the backend introduces later decode into `Other` instead of failing the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChangeRequestStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Canceled,
    Implemented,
    Other(String),
}

impl ChangeRequestStatus {
    /// Statuses a reviewer can choose from.
    pub const ALL: [ChangeRequestStatus; 7] = [
        Self::Draft,
        Self::Submitted,
        Self::UnderReview,
        Self::Approved,
        Self::Rejected,
        Self::Canceled,
        Self::Implemented,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Canceled => "CANCELED",
            Self::Implemented => "IMPLEMENTED",
            Self::Other(s) => s,
        }
    }

    fn known(s: &str) -> Option<Self> {
        let upper = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL.into_iter().find(|status| status.as_str() == upper)
    }
}

impl Default for ChangeRequestStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for ChangeRequestStatus {
    fn from(s: String) -> Self {
        Self::known(&s).unwrap_or(Self::Other(s))
    }
}

impl From<ChangeRequestStatus> for String {
    fn from(status: ChangeRequestStatus) -> Self {
        match status {
            ChangeRequestStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for ChangeRequestStatus {
    type Err = String;

    /// Strict parse for user input: only the known statuses are accepted.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::known(s).ok_or_else(|| {
            let allowed = Self::ALL.map(|status| status.as_str().to_string()).join(", ");
            format!("unknown status '{s}', expected one of: {allowed}")
        })
    }
}

impl fmt::Display for ChangeRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of change being requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestType {
    DepartmentChange,
    PositionChange,
    Other(String),
}

impl Default for RequestType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for RequestType {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "department-change" => Self::DepartmentChange,
            "position-change" => Self::PositionChange,
            _ => Self::Other(s),
        }
    }
}

impl From<RequestType> for String {
    fn from(kind: RequestType) -> Self {
        match kind {
            RequestType::DepartmentChange => "department-change".to_string(),
            RequestType::PositionChange => "position-change".to_string(),
            RequestType::Other(s) => s,
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DepartmentChange => f.write_str("department-change"),
            Self::PositionChange => f.write_str("position-change"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Change request as listed for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequest {
    #[serde(rename = "_id", deserialize_with = "record_id")]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub request_number: String,
    #[serde(default, deserialize_with = "text")]
    pub request_type: RequestType,
    #[serde(default, deserialize_with = "foreign_key", skip_serializing_if = "Option::is_none")]
    pub requested_by_employee_id: Option<String>,
    #[serde(default, deserialize_with = "foreign_key", skip_serializing_if = "Option::is_none")]
    pub target_department_id: Option<String>,
    #[serde(default, deserialize_with = "foreign_key", skip_serializing_if = "Option::is_none")]
    pub target_position_id: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub details: String,
    #[serde(default, deserialize_with = "text")]
    pub reason: String,
    #[serde(default, deserialize_with = "text")]
    pub status: ChangeRequestStatus,
    #[serde(default, deserialize_with = "foreign_key", skip_serializing_if = "Option::is_none")]
    pub submitted_by_employee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl ChangeRequest {
    /// Department or position the request targets, whichever is set.
    pub fn target_id(&self) -> Option<&str> {
        self.target_department_id
            .as_deref()
            .or(self.target_position_id.as_deref())
    }
}

/// Update the local list after a review was accepted by the backend.
///
/// Returns `false` if no request with that id is held locally.
pub fn apply_review(requests: &mut [ChangeRequest], id: &str, status: &ChangeRequestStatus) -> bool {
    match requests.iter_mut().find(|r| r.id == id) {
        Some(request) => {
            request.status = status.clone();
            true
        }
        None => false,
    }
}

/// Request to move an employee to another department.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentChangeRequest {
    #[serde(rename = "employeeId")]
    pub employee_id: String,
    #[serde(rename = "newDept")]
    pub new_department_id: String,
    pub details: String,
    pub reason: String,
}

impl DepartmentChangeRequest {
    pub fn validate(&self) -> Result<()> {
        require("employee", &self.employee_id)?;
        require("department", &self.new_department_id)?;
        require("details", &self.details)?;
        require("reason", &self.reason)
    }
}

/// Request to move an employee to another position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionChangeRequest {
    #[serde(rename = "employeeId")]
    pub employee_id: String,
    #[serde(rename = "newPosition")]
    pub new_position_id: String,
    pub details: String,
    pub reason: String,
}

impl PositionChangeRequest {
    pub fn validate(&self) -> Result<()> {
        require("employee", &self.employee_id)?;
        require("position", &self.new_position_id)?;
        require("details", &self.details)?;
        require("reason", &self.reason)
    }
}

/// Shape of the review payload accepted by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStyle {
    /// `{"status": "APPROVED"}`
    #[default]
    Status,
    /// `{"approve": true}`
    Approve,
}

/// Body posted to the review endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReviewBody {
    Status { status: ChangeRequestStatus },
    Approve { approve: bool },
}

impl ReviewBody {
    /// Build the body for a target status in the configured style.
    ///
    /// The boolean style can only express approval or rejection.
    pub fn build(style: ReviewStyle, status: &ChangeRequestStatus) -> Result<Self> {
        match style {
            ReviewStyle::Status => Ok(Self::Status { status: status.clone() }),
            ReviewStyle::Approve => match status {
                ChangeRequestStatus::Approved => Ok(Self::Approve { approve: true }),
                ChangeRequestStatus::Rejected => Ok(Self::Approve { approve: false }),
                other => Err(AppError::validation(format!(
                    "status {other} cannot be sent as an approve/reject review"
                ))),
            },
        }
    }
}
