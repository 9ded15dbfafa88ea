//! Position record and DTOs for create and update operations.

use serde::{Deserialize, Serialize};

use super::{default_true, require};
use crate::error::Result;
use crate::normalize::{active_flag, foreign_key, record_id, text};

/// Position as returned by the backend, with foreign keys reduced to bare ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(rename = "_id", deserialize_with = "record_id")]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub code: String,
    #[serde(default, deserialize_with = "text")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "foreign_key", skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    #[serde(default, deserialize_with = "foreign_key", skip_serializing_if = "Option::is_none")]
    pub reports_to_position_id: Option<String>,
    #[serde(default = "default_true", deserialize_with = "active_flag")]
    pub is_active: bool,
}

/// DTO for creating a position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePosition {
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub department_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reports_to_position_id: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl CreatePosition {
    pub fn validate(&self) -> Result<()> {
        require("code", &self.code)?;
        require("title", &self.title)?;
        require("departmentId", &self.department_id)
    }
}

/// DTO for updating a position. Same shape as create; sent with `PUT`.
pub type UpdatePosition = CreatePosition;

impl From<&Position> for CreatePosition {
    fn from(pos: &Position) -> Self {
        Self {
            code: pos.code.clone(),
            title: pos.title.clone(),
            description: pos.description.clone().unwrap_or_default(),
            department_id: pos.department_id.clone().unwrap_or_default(),
            reports_to_position_id: pos.reports_to_position_id.clone(),
            is_active: pos.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_populated_foreign_keys() {
        let pos: Position = serde_json::from_value(json!({
            "_id": "p2",
            "code": "SE",
            "title": "Engineer",
            "departmentId": {"_id": "d1", "name": "Engineering"},
            "reportsToPositionId": {"_id": "p1", "title": "Lead"}
        }))
        .unwrap();

        assert_eq!(pos.department_id.as_deref(), Some("d1"));
        assert_eq!(pos.reports_to_position_id.as_deref(), Some("p1"));
    }

    #[test]
    fn test_null_and_bare_foreign_keys() {
        let pos: Position = serde_json::from_value(json!({
            "_id": "p1",
            "code": "CTO",
            "title": "Chief Technology Officer",
            "departmentId": "d1",
            "reportsToPositionId": null,
            "isActive": false
        }))
        .unwrap();

        assert_eq!(pos.department_id.as_deref(), Some("d1"));
        assert!(pos.reports_to_position_id.is_none());
        assert!(!pos.is_active);
    }

    #[test]
    fn test_create_requires_department() {
        let create = CreatePosition {
            code: "SE".to_string(),
            title: "Engineer".to_string(),
            description: String::new(),
            department_id: String::new(),
            reports_to_position_id: None,
            is_active: true,
        };
        let err = create.validate().unwrap_err();
        assert!(err.to_string().contains("departmentId"));
    }

    #[test]
    fn test_create_payload_shape() {
        let create = CreatePosition {
            code: "SE".to_string(),
            title: "Engineer".to_string(),
            description: "Builds things".to_string(),
            department_id: "d1".to_string(),
            reports_to_position_id: Some("p1".to_string()),
            is_active: true,
        };
        let body = serde_json::to_value(&create).unwrap();

        assert_eq!(body["departmentId"], "d1");
        assert_eq!(body["reportsToPositionId"], "p1");
        assert_eq!(body["isActive"], true);
    }
}
