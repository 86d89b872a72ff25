use common::error::CrResult;
use rental_portal_common::branch::{Branch, BranchData, BranchStats};

use super::{invalidate_roots, BRANCHES_STALE_TIME, STATS_STALE_TIME};
use crate::{cache::QueryKey, context::AppContext};

const BRANCH_ROOTS: [&str; 3] = ["adminBranches", "branch", "branchStats"];

/// Every branch, cached as `adminBranches`
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn branches(context: &AppContext) -> CrResult<Vec<Branch>> {
    let api = context.authorized().await?;
    context
        .cache()
        .fetch(QueryKey::root("adminBranches"), BRANCHES_STALE_TIME, || {
            api.branches()
        })
        .await
}

/// One branch by id
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn branch(context: &AppContext, branch_id: &str) -> CrResult<Branch> {
    let api = context.authorized().await?;
    context
        .cache()
        .fetch(
            QueryKey::root("branch").with(branch_id),
            BRANCHES_STALE_TIME,
            || api.branch(branch_id),
        )
        .await
}

/// Branch tallies computed from the branch listing
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn branch_stats(context: &AppContext) -> CrResult<BranchStats> {
    context
        .cache()
        .fetch(QueryKey::root("branchStats"), STATS_STALE_TIME, || async {
            Ok(BranchStats::from_branches(&branches(context).await?))
        })
        .await
}

/// Create a branch and refresh every branch query
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn create_branch(context: &AppContext, branch: &BranchData) -> CrResult<Branch> {
    let created = context.authorized().await?.create_branch(branch).await?;
    invalidate_roots(context, &BRANCH_ROOTS).await;
    Ok(created)
}

/// Save a branch and refresh every branch query
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn update_branch(
    context: &AppContext,
    branch_id: &str,
    branch: &BranchData,
) -> CrResult<Branch> {
    let updated = context
        .authorized()
        .await?
        .update_branch(branch_id, branch)
        .await?;
    invalidate_roots(context, &BRANCH_ROOTS).await;
    Ok(updated)
}

/// Delete a branch, forgetting its cached copy
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn delete_branch(context: &AppContext, branch_id: &str) -> CrResult<String> {
    let message = context.authorized().await?.delete_branch(branch_id).await?;
    context.cache().remove(&QueryKey::root("branch").with(branch_id)).await;
    invalidate_roots(context, &BRANCH_ROOTS).await;
    Ok(message)
}

#[cfg(test)]
mod test {
    use common::error::{CrError, CrResult};
    use rental_portal_common::user::Role;
    use serde_json::json;

    use super::{branch_stats, branches, delete_branch};
    use crate::{
        api::{test::transport_once, Method, MockTransport},
        cache::{QueryKey, QueryState},
        context::test::{context_with, signed_in},
        queries::BRANCHES_STALE_TIME,
    };

    #[tokio::test]
    async fn branches_should_require_session() {
        let context = context_with(std::sync::Arc::new(MockTransport::new()));

        let result = branches(&context).await;

        assert!(matches!(result, Err(CrError::MissingToken)));
    }

    #[tokio::test]
    async fn stats_should_be_computed_from_listing() -> CrResult<()> {
        let context = signed_in(
            transport_once(
                Method::Get,
                "/api/admin/branches",
                200,
                json!({"success": true, "data": [
                    {"_id": "b1", "name": "Central", "address": "1 Rue", "city": "Paris", "country": "France"},
                    {"_id": "b2", "name": "Gare", "address": "2 Rue", "city": "Lyon", "country": "France"}
                ]}),
            ),
            Role::Admin,
        )
        .await;

        let stats = branch_stats(&context).await?;
        let again = branch_stats(&context).await?;

        assert_eq!(stats.total_branches, 2);
        assert_eq!(stats.branches_by_country.get("France"), Some(&2));
        assert_eq!(stats, again);
        Ok(())
    }

    #[tokio::test]
    async fn delete_should_drop_branch_entry() -> CrResult<()> {
        let context = signed_in(
            transport_once(
                Method::Delete,
                "/api/admin/branches/b1",
                200,
                json!({"success": true, "message": "Branch deleted"}),
            ),
            Role::Admin,
        )
        .await;
        let key = QueryKey::root("branch").with("b1");
        context.cache().set(key.clone(), 0_u8).await;
        context.cache().set(QueryKey::root("adminBranches"), 0_u8).await;

        let message = delete_branch(&context, "b1").await?;

        assert_eq!(message, "Branch deleted");
        assert_eq!(context.cache().state(&key, BRANCHES_STALE_TIME).await, QueryState::Missing);
        assert_eq!(
            context
                .cache()
                .state(&QueryKey::root("adminBranches"), BRANCHES_STALE_TIME)
                .await,
            QueryState::Stale
        );
        Ok(())
    }
}
