use common::error::CrResult;
use rental_portal_common::branch::{Branch, BranchData};

use super::{acknowledge, fetch, ApiRequest, AuthorizedApi};

impl AuthorizedApi {
    /// Fetch every branch
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn branches(&self) -> CrResult<Vec<Branch>> {
        let request = self.authorized(ApiRequest::get("/api/admin/branches"));
        fetch(&*self.transport, request, "Failed to fetch branches").await
    }

    /// Fetch a single branch
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn branch(&self, branch_id: &str) -> CrResult<Branch> {
        let request = self.authorized(ApiRequest::get(format!("/api/admin/branches/{branch_id}")));
        fetch(&*self.transport, request, "Failed to fetch branch").await
    }

    /// Create a branch
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn create_branch(&self, branch: &BranchData) -> CrResult<Branch> {
        let request = self.authorized(ApiRequest::post("/api/admin/branches").json(branch)?);
        fetch(&*self.transport, request, "Failed to create branch").await
    }

    /// Replace the details of the branch specified by `branch_id`
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn update_branch(&self, branch_id: &str, branch: &BranchData) -> CrResult<Branch> {
        let request = self
            .authorized(ApiRequest::put(format!("/api/admin/branches/{branch_id}")).json(branch)?);
        fetch(&*self.transport, request, "Failed to update branch").await
    }

    /// Delete the branch specified by `branch_id`
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn delete_branch(&self, branch_id: &str) -> CrResult<String> {
        let request =
            self.authorized(ApiRequest::delete(format!("/api/admin/branches/{branch_id}")));
        acknowledge(
            &*self.transport,
            request,
            "Failed to delete branch",
            "Branch deleted successfully",
        )
        .await
    }
}
