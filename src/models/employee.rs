//! Employee profile summary, as needed to pick the subject of a change request.

use serde::{Deserialize, Serialize};

use crate::normalize::{foreign_key, record_id, text};

/// Employee profile with primary position/department reduced to bare ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(rename = "_id", deserialize_with = "record_id")]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "foreign_key", skip_serializing_if = "Option::is_none")]
    pub primary_position_id: Option<String>,
    #[serde(default, deserialize_with = "foreign_key", skip_serializing_if = "Option::is_none")]
    pub primary_department_id: Option<String>,
}

impl Employee {
    pub fn display_name(&self) -> String {
        match self.last_name.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            Some(last) => format!("{} {last}", self.first_name),
            None => self.first_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_name() {
        let emp: Employee = serde_json::from_value(json!({"_id": "e1", "firstName": "Mona", "lastName": "Adel"})).unwrap();
        assert_eq!(emp.display_name(), "Mona Adel");

        let emp: Employee = serde_json::from_value(json!({"_id": "e2", "firstName": "Omar", "lastName": ""})).unwrap();
        assert_eq!(emp.display_name(), "Omar");
    }

    #[test]
    fn test_populated_primary_position() {
        let emp: Employee = serde_json::from_value(json!({
            "_id": "e1",
            "firstName": "Mona",
            "primaryPositionId": {"_id": "p3", "code": "SE"}
        }))
        .unwrap();

        assert_eq!(emp.primary_position_id.as_deref(), Some("p3"));
        assert!(emp.primary_department_id.is_none());
    }
}
