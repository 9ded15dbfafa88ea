//! Plain-text table rendering for terminal output.

use chrono::Local;

use crate::loader::OrgSnapshot;
use crate::models::hierarchy::or_na;
use crate::models::{ChangeRequest, Employee, HierarchyView};

/// Column-aligned text table.
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (col, cell) in row.iter().enumerate().take(widths.len()) {
                widths[col] = widths[col].max(cell.chars().count());
            }
        }

        let line = |cells: &[String]| {
            let padded: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(col, &width)| {
                    let cell = cells.get(col).map(String::as_str).unwrap_or("");
                    format!("{cell:<width$}")
                })
                .collect();
            padded.join("  ").trim_end().to_string()
        };

        let mut out = line(&self.headers);
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join("  "));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&line(row));
            out.push('\n');
        }
        out
    }
}

fn active_label(active: bool) -> String {
    let label = if active { "yes" } else { "no" };
    label.to_string()
}

/// Departments with the title of their head position.
pub fn departments_table(snapshot: &OrgSnapshot) -> Table {
    let mut table = Table::new(&["ID", "Code", "Name", "Head Position", "Active"]);
    for dept in &snapshot.departments {
        let head = match dept.head_position_id.as_deref() {
            Some(id) => snapshot.position_title(Some(id)).to_string(),
            None => "N/A".to_string(),
        };
        table.row(vec![
            dept.id.clone(),
            dept.code.clone(),
            dept.name.clone(),
            head,
            active_label(dept.is_active),
        ]);
    }
    table
}

/// Positions with their department name and reporting line.
pub fn positions_table(snapshot: &OrgSnapshot) -> Table {
    let mut table = Table::new(&["ID", "Code", "Title", "Department", "Reports To", "Active"]);
    for pos in &snapshot.positions {
        let reports_to = match pos.reports_to_position_id.as_deref() {
            Some(id) => snapshot.position_title(Some(id)).to_string(),
            None => "N/A".to_string(),
        };
        table.row(vec![
            pos.id.clone(),
            pos.code.clone(),
            pos.title.clone(),
            snapshot.department_name(pos.department_id.as_deref()).to_string(),
            reports_to,
            active_label(pos.is_active),
        ]);
    }
    table
}

/// Employees with the code of their primary position.
pub fn employees_table(employees: &[Employee], snapshot: &OrgSnapshot) -> Table {
    let mut table = Table::new(&["ID", "Name", "Position"]);
    for emp in employees {
        let position = emp
            .primary_position_id
            .as_deref()
            .and_then(|id| snapshot.position(id))
            .map(|p| p.code.clone())
            .unwrap_or_else(|| "No Position".to_string());
        table.row(vec![emp.id.clone(), emp.display_name(), position]);
    }
    table
}

pub fn change_requests_table(requests: &[ChangeRequest]) -> Table {
    let mut table = Table::new(&["ID", "Req #", "Type", "Requested By", "Target", "Status", "Submitted"]);
    for req in requests {
        let submitted = req
            .submitted_at
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        table.row(vec![
            req.id.clone(),
            req.request_number.clone(),
            req.request_type.to_string(),
            or_na(req.requested_by_employee_id.as_deref()).to_string(),
            or_na(req.target_id()).to_string(),
            req.status.to_string(),
            submitted,
        ]);
    }
    table
}

/// Reporting line of the current user, and their team if any.
pub fn hierarchy_tables(view: &HierarchyView) -> (Table, Table) {
    let me = &view.employee_hierarchy;
    let mut line = Table::new(&["Name", "Position", "Department", "Manager", "Manager's Manager"]);
    line.row(vec![
        me.name.clone(),
        or_na(me.position.as_deref()).to_string(),
        or_na(me.department.as_deref()).to_string(),
        or_na(me.manager.as_ref().map(|m| m.name.as_str())).to_string(),
        or_na(me.manager_manager.as_ref().map(|m| m.name.as_str())).to_string(),
    ]);

    let mut team = Table::new(&["Name", "Position", "Department"]);
    for member in &view.team_structure {
        team.row(vec![
            member.name.clone(),
            or_na(member.position.as_deref()).to_string(),
            or_na(member.department.as_deref()).to_string(),
        ]);
    }
    (line, team)
}
