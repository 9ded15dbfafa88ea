//! Department record and DTOs for create and update operations.

use serde::{Deserialize, Serialize};

use super::{default_true, require};
use crate::error::Result;
use crate::normalize::{active_flag, foreign_key, record_id, text};

/// Department as returned by the backend, with `headPositionId` reduced to a bare id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    #[serde(rename = "_id", deserialize_with = "record_id")]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub code: String,
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "foreign_key", skip_serializing_if = "Option::is_none")]
    pub head_position_id: Option<String>,
    #[serde(default = "default_true", deserialize_with = "active_flag")]
    pub is_active: bool,
}

impl Department {
    /// Merge a successful update into the local copy.
    pub fn apply_update(&mut self, data: &UpdateDepartment) {
        self.code = data.code.clone();
        self.name = data.name.clone();
        self.description = Some(data.description.clone()).filter(|d| !d.is_empty());
        self.head_position_id = data.head_position_id.clone();
        self.is_active = data.is_active;
    }
}

/// DTO for creating a department.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartment {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl CreateDepartment {
    pub fn validate(&self) -> Result<()> {
        require("code", &self.code)?;
        require("name", &self.name)
    }
}

/// DTO for updating a department. The backend expects the full record on `PUT`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDepartment {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_position_id: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl UpdateDepartment {
    pub fn validate(&self) -> Result<()> {
        require("code", &self.code)?;
        require("name", &self.name)
    }
}

impl From<&Department> for UpdateDepartment {
    fn from(dept: &Department) -> Self {
        Self {
            code: dept.code.clone(),
            name: dept.name.clone(),
            description: dept.description.clone().unwrap_or_default(),
            head_position_id: dept.head_position_id.clone(),
            is_active: dept.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{Collection, decode_records};
    use serde_json::json;

    #[test]
    fn test_populated_head_position_resolves_to_id() {
        let dept: Department = serde_json::from_value(json!({
            "_id": "d1",
            "code": "ENG",
            "name": "Engineering",
            "headPositionId": {"_id": "p1", "title": "CTO"},
            "isActive": true
        }))
        .unwrap();

        assert_eq!(dept.head_position_id.as_deref(), Some("p1"));
    }

    #[test]
    fn test_minimal_record_defaults() {
        let mut depts: Vec<Department> =
            decode_records(r#"[{"id": 4, "code": "HR", "name": "People"}]"#, Collection::Departments).unwrap();
        let dept = depts.remove(0);

        assert_eq!(dept.id, "4");
        assert!(dept.is_active);
        assert!(dept.description.is_none());
        assert!(dept.head_position_id.is_none());
    }

    #[test]
    fn test_both_id_properties_and_null_text() {
        let depts: Vec<Department> = decode_records(
            r#"[{"_id": "d1", "id": "d1", "code": "ENG", "name": null, "isActive": null}]"#,
            Collection::Departments,
        )
        .unwrap();

        assert_eq!(depts[0].id, "d1");
        assert_eq!(depts[0].name, "");
        assert!(depts[0].is_active);
    }

    #[test]
    fn test_missing_id_is_an_error() {
        assert!(serde_json::from_value::<Department>(json!({"code": "HR"})).is_err());
    }

    #[test]
    fn test_update_payload_omits_empty_head() {
        let update = UpdateDepartment {
            code: "ENG".to_string(),
            name: "Engineering".to_string(),
            description: String::new(),
            head_position_id: None,
            is_active: true,
        };
        let body = serde_json::to_value(&update).unwrap();

        assert_eq!(body, json!({"code": "ENG", "name": "Engineering", "description": "", "isActive": true}));
    }

    #[test]
    fn test_validation_requires_code_and_name() {
        let mut create = CreateDepartment {
            code: "ENG".to_string(),
            name: " ".to_string(),
            description: String::new(),
            is_active: true,
        };
        assert!(create.validate().is_err());

        create.name = "Engineering".to_string();
        assert!(create.validate().is_ok());
    }

    #[test]
    fn test_apply_update() {
        let mut dept: Department =
            serde_json::from_value(json!({"_id": "d1", "code": "ENG", "name": "Eng", "description": "old"})).unwrap();
        let mut update = UpdateDepartment::from(&dept);
        update.name = "Engineering".to_string();
        update.description = String::new();
        update.head_position_id = Some("p2".to_string());
        update.is_active = false;

        dept.apply_update(&update);

        assert_eq!(dept.name, "Engineering");
        assert!(dept.description.is_none());
        assert_eq!(dept.head_position_id.as_deref(), Some("p2"));
        assert!(!dept.is_active);
    }
}
