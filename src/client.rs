//! Organization-structure REST client.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::models::{
    ChangeRequest, ChangeRequestStatus, CreateDepartment, CreatePosition, Department, DepartmentChangeRequest,
    Employee, HierarchyView, Position, PositionChangeRequest, ReviewBody, ReviewStyle, UpdateDepartment,
    UpdatePosition,
};
use crate::normalize::{Collection, canonical_ids_nested, decode_records};

const DEPARTMENTS: &str = "/organization-structure/departments";
const POSITIONS: &str = "/organization-structure/positions";
const HIERARCHY: &str = "/organization-structure/hierarchy";
const CHANGE_REQUESTS: &str = "/organization-structure/change-request";
const EMPLOYEES: &str = "/employee-profile";

/// Where and as whom a request is made.
///
/// Passed into every call instead of being read from ambient state.
#[derive(Debug, Clone)]
pub struct RequestContext {
    base_url: String,
    token: Option<String>,
}

impl RequestContext {
    /// # Arguments
    /// * `base_url` - Backend root (e.g., "http://localhost:5000")
    /// * `token` - Bearer token, if the caller has one
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{base}{path}", base = self.base_url)
    }

    fn token(&self) -> Result<&str> {
        self.token.as_deref().ok_or(AppError::MissingToken)
    }
}

/// HTTP client for the organization-structure endpoints.
///
/// Collection responses go through the normalizer, so whatever envelope the backend uses and
/// whether foreign keys are populated or not, callers get flat records with bare ids.
#[derive(Debug, Clone)]
pub struct OrgClient {
    client: Client,
}

impl OrgClient {
    /// Create a new client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    // Departments

    pub async fn list_departments(&self, ctx: &RequestContext) -> Result<Vec<Department>> {
        self.fetch_collection(ctx, DEPARTMENTS, Collection::Departments).await
    }

    pub async fn create_department(&self, ctx: &RequestContext, data: &CreateDepartment) -> Result<()> {
        data.validate()?;
        let request = self.request(ctx, Method::POST, DEPARTMENTS)?.json(data);
        self.execute(request).await?;
        info!("Created department {}", data.code);
        Ok(())
    }

    pub async fn update_department(&self, ctx: &RequestContext, id: &str, data: &UpdateDepartment) -> Result<()> {
        let path = item_path(DEPARTMENTS, id)?;
        data.validate()?;
        let request = self.request(ctx, Method::PUT, &path)?.json(data);
        self.execute(request).await?;
        info!("Updated department {id}");
        Ok(())
    }

    pub async fn delete_department(&self, ctx: &RequestContext, id: &str) -> Result<()> {
        let path = item_path(DEPARTMENTS, id)?;
        let request = self.request(ctx, Method::DELETE, &path)?;
        self.execute(request).await?;
        info!("Deleted department {id}");
        Ok(())
    }

    // Positions

    pub async fn list_positions(&self, ctx: &RequestContext) -> Result<Vec<Position>> {
        self.fetch_collection(ctx, POSITIONS, Collection::Positions).await
    }

    pub async fn create_position(&self, ctx: &RequestContext, data: &CreatePosition) -> Result<()> {
        data.validate()?;
        let request = self.request(ctx, Method::POST, POSITIONS)?.json(data);
        self.execute(request).await?;
        info!("Created position {}", data.code);
        Ok(())
    }

    pub async fn update_position(&self, ctx: &RequestContext, id: &str, data: &UpdatePosition) -> Result<()> {
        let path = item_path(POSITIONS, id)?;
        data.validate()?;
        let request = self.request(ctx, Method::PUT, &path)?.json(data);
        self.execute(request).await?;
        info!("Updated position {id}");
        Ok(())
    }

    pub async fn delete_position(&self, ctx: &RequestContext, id: &str) -> Result<()> {
        let path = item_path(POSITIONS, id)?;
        let request = self.request(ctx, Method::DELETE, &path)?;
        self.execute(request).await?;
        info!("Deleted position {id}");
        Ok(())
    }

    // Employees and hierarchy

    pub async fn list_employees(&self, ctx: &RequestContext) -> Result<Vec<Employee>> {
        self.fetch_collection(ctx, EMPLOYEES, Collection::Employees).await
    }

    /// Reporting line and team of the user the token belongs to.
    pub async fn hierarchy(&self, ctx: &RequestContext) -> Result<HierarchyView> {
        let request = self.request(ctx, Method::GET, HIERARCHY)?;
        let body = self.execute(request).await?;
        let value: serde_json::Value = serde_json::from_str(&body)?;
        decode_object(canonical_ids_nested(value, "id"))
    }

    // Change requests

    pub async fn list_change_requests(&self, ctx: &RequestContext) -> Result<Vec<ChangeRequest>> {
        self.fetch_collection(ctx, CHANGE_REQUESTS, Collection::ChangeRequests).await
    }

    pub async fn submit_department_change(&self, ctx: &RequestContext, data: &DepartmentChangeRequest) -> Result<()> {
        data.validate()?;
        let path = format!("{CHANGE_REQUESTS}/department");
        let request = self.request(ctx, Method::POST, &path)?.json(data);
        self.execute(request).await?;
        info!(
            "Submitted department change for employee {} to {}",
            data.employee_id, data.new_department_id
        );
        Ok(())
    }

    pub async fn submit_position_change(&self, ctx: &RequestContext, data: &PositionChangeRequest) -> Result<()> {
        data.validate()?;
        let path = format!("{CHANGE_REQUESTS}/position");
        let request = self.request(ctx, Method::POST, &path)?.json(data);
        self.execute(request).await?;
        info!(
            "Submitted position change for employee {} to {}",
            data.employee_id, data.new_position_id
        );
        Ok(())
    }

    /// Move a change request to a new status.
    pub async fn review_change_request(
        &self,
        ctx: &RequestContext,
        id: &str,
        status: &ChangeRequestStatus,
        style: ReviewStyle,
    ) -> Result<()> {
        let path = format!("{}/review", item_path(CHANGE_REQUESTS, id)?);
        let body = ReviewBody::build(style, status)?;
        let request = self.request(ctx, Method::POST, &path)?.json(&body);
        self.execute(request).await?;
        info!("Request {id} updated to {status}");
        Ok(())
    }

    // Plumbing

    fn request(&self, ctx: &RequestContext, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = ctx.token()?;
        Ok(self.client.request(method, ctx.url(path)).bearer_auth(token))
    }

    /// Send a request and return the body of a success response.
    async fn execute(&self, request: RequestBuilder) -> Result<String> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().clone();
        debug!("{url} -> {status}");

        let body = response.text().await?;
        if !status.is_success() {
            warn!("{url} failed with {status}");
            return Err(AppError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn fetch_collection<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        path: &str,
        collection: Collection,
    ) -> Result<Vec<T>> {
        let request = self.request(ctx, Method::GET, path)?;
        let body = self.execute(request).await?;
        let records = decode_records(&body, collection)?;
        info!("Loaded {} {collection}", records.len());
        Ok(records)
    }
}

fn item_path(base: &str, id: &str) -> Result<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AppError::validation("id is required"));
    }
    if id.contains('/') || id.contains('?') || id.contains('#') {
        return Err(AppError::validation(format!("invalid id '{id}'")));
    }
    Ok(format!("{base}/{id}"))
}

fn decode_object<T: DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| AppError::decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_trims_base_url() {
        let ctx = RequestContext::new("http://localhost:5000/", Some("t".to_string()));
        assert_eq!(ctx.url(DEPARTMENTS), "http://localhost:5000/organization-structure/departments");
    }

    #[test]
    fn test_blank_token_counts_as_missing() {
        let ctx = RequestContext::new("http://localhost:5000", Some("  ".to_string()));
        assert!(!ctx.has_token());
        assert!(matches!(ctx.token(), Err(AppError::MissingToken)));
    }

    #[test]
    fn test_item_path() {
        assert_eq!(item_path(POSITIONS, " p1 ").unwrap(), "/organization-structure/positions/p1");
        assert!(item_path(POSITIONS, "").is_err());
        assert!(item_path(POSITIONS, "../departments").is_err());
    }

    #[test]
    fn test_request_without_token_fails_before_sending() {
        let client = OrgClient::new(Duration::from_secs(5)).unwrap();
        let ctx = RequestContext::new("http://localhost:5000", None);
        assert!(matches!(
            client.request(&ctx, Method::GET, DEPARTMENTS),
            Err(AppError::MissingToken)
        ));
    }
}
