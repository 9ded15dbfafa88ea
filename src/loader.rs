//! Concurrent loading of related collections.

use tracing::{info, warn};

use crate::client::{OrgClient, RequestContext};
use crate::error::{AppError, Result};
use crate::models::{Department, Employee, Position};
use crate::normalize::Collection;

/// A collection that could not be loaded.
#[derive(Debug)]
pub struct LoadFailure {
    pub collection: Collection,
    pub error: AppError,
}

impl LoadFailure {
    /// Message in the form shown to users, e.g. `Failed to load departments (500): boom`.
    pub fn message(&self) -> String {
        match (&self.error, self.error.server_message()) {
            (AppError::Status { status, .. }, Some(msg)) => {
                format!("Failed to load {} ({status}): {msg}", self.collection)
            }
            (AppError::Status { status, .. }, None) => format!("Failed to load {} ({status})", self.collection),
            (AppError::Decode(_), _) => format!("Failed to parse {} data", self.collection),
            (e, _) => format!("Failed to load {}: {e}", self.collection),
        }
    }
}

/// Departments, positions and optionally employees, each loaded independently.
///
/// A failed collection stays empty and is listed once in `failures`.
#[derive(Debug, Default)]
pub struct OrgSnapshot {
    pub departments: Vec<Department>,
    pub positions: Vec<Position>,
    pub employees: Vec<Employee>,
    pub failures: Vec<LoadFailure>,
}

impl OrgSnapshot {
    pub fn failed(&self, collection: Collection) -> bool {
        self.failures.iter().any(|f| f.collection == collection)
    }

    /// Fail with the original error if `collection` did not load.
    pub fn require(&mut self, collection: Collection) -> Result<()> {
        match self.failures.iter().position(|f| f.collection == collection) {
            Some(idx) => Err(self.failures.remove(idx).error),
            None => Ok(()),
        }
    }

    pub fn department(&self, id: &str) -> Option<&Department> {
        self.departments.iter().find(|d| d.id == id)
    }

    pub fn position(&self, id: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.id == id)
    }

    /// Title of a referenced position, for listings.
    pub fn position_title(&self, id: Option<&str>) -> &str {
        id.and_then(|id| self.position(id)).map(|p| p.title.as_str()).unwrap_or("Unknown")
    }

    /// Name of a referenced department, for listings.
    pub fn department_name(&self, id: Option<&str>) -> &str {
        id.and_then(|id| self.department(id)).map(|d| d.name.as_str()).unwrap_or("Unknown")
    }

    /// Get summary message.
    pub fn summary(&self) -> String {
        let base = format!(
            "Departments: {}, Positions: {}, Employees: {}",
            self.departments.len(),
            self.positions.len(),
            self.employees.len()
        );
        if self.failures.is_empty() {
            base
        } else {
            format!("{base} ({} failed)", self.failures.len())
        }
    }

    /// Records of a settled fetch, or an empty list with the failure noted.
    fn settle<T>(&mut self, collection: Collection, result: Result<Vec<T>>) -> Vec<T> {
        match result {
            Ok(records) => records,
            Err(error) => {
                warn!("Loading {collection} failed: {error}");
                self.failures.push(LoadFailure { collection, error });
                Vec::new()
            }
        }
    }
}

/// Load departments and positions concurrently.
///
/// Both requests are in flight at once and settle independently: one failing does not keep
/// the other from populating.
pub async fn load_org_snapshot(client: &OrgClient, ctx: &RequestContext) -> OrgSnapshot {
    let (departments, positions) = tokio::join!(client.list_departments(ctx), client.list_positions(ctx));

    let mut snapshot = OrgSnapshot::default();
    snapshot.departments = snapshot.settle(Collection::Departments, departments);
    snapshot.positions = snapshot.settle(Collection::Positions, positions);

    info!("Snapshot loaded: {}", snapshot.summary());
    snapshot
}

/// Load departments, positions and employees concurrently (change-request forms need all three).
pub async fn load_with_employees(client: &OrgClient, ctx: &RequestContext) -> OrgSnapshot {
    let (departments, positions, employees) = tokio::join!(
        client.list_departments(ctx),
        client.list_positions(ctx),
        client.list_employees(ctx)
    );

    let mut snapshot = OrgSnapshot::default();
    snapshot.departments = snapshot.settle(Collection::Departments, departments);
    snapshot.positions = snapshot.settle(Collection::Positions, positions);
    snapshot.employees = snapshot.settle(Collection::Employees, employees);

    info!("Snapshot loaded: {}", snapshot.summary());
    snapshot
}
