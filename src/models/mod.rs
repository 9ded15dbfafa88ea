//! Wire models for departments, positions, employees, hierarchy and change requests.

pub mod change_request;
pub mod department;
pub mod employee;
pub mod hierarchy;
pub mod position;

pub use change_request::{
    ChangeRequest, ChangeRequestStatus, DepartmentChangeRequest, PositionChangeRequest, RequestType, ReviewBody,
    ReviewStyle, apply_review,
};
pub use department::{CreateDepartment, Department, UpdateDepartment};
pub use employee::Employee;
pub use hierarchy::{EmployeeHierarchy, HierarchyView, ManagerRef, TeamMember};
pub use position::{CreatePosition, Position, UpdatePosition};

pub(crate) fn default_true() -> bool {
    true
}

/// Reject blank required form fields.
pub(crate) fn require(field: &str, value: &str) -> crate::Result<()> {
    if value.trim().is_empty() {
        return Err(crate::AppError::validation(format!("{field} is required")));
    }
    Ok(())
}
