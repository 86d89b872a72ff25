//! Cached reads and cache-invalidating writes over the API. Every read names its [QueryKey] and
//! how long a response stays fresh; every write invalidates the keys whose data it changed.

pub mod branches;
pub mod cars;
pub mod dashboard;
pub mod rentals;
pub mod users;

use std::{future::Future, time::Duration};

use common::error::CrResult;
use log::info;
use rental_portal_common::QueryParams;

use crate::{cache::QueryKey, context::AppContext};

/// Car listings are refetched on every read
pub const CARS_STALE_TIME: Duration = Duration::ZERO;
pub const BRANCHES_STALE_TIME: Duration = Duration::from_secs(5 * 60);
pub const USER_RENTALS_STALE_TIME: Duration = Duration::from_secs(5 * 60);
pub const ADMIN_RENTALS_STALE_TIME: Duration = Duration::from_secs(2 * 60);
pub const ADMIN_USERS_STALE_TIME: Duration = Duration::from_secs(2 * 60);
pub const USER_STALE_TIME: Duration = Duration::from_secs(5 * 60);
pub const STATS_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Manual retry of a failed query: drop the freshness of `key` and run the query again
/// # Errors
/// This function will return an error if the query fails again
pub async fn retry<T, F, Fut>(context: &AppContext, key: &QueryKey, query: F) -> CrResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = CrResult<T>>,
{
    info!("Retrying {key}");
    context.cache().invalidate(key).await;
    query().await
}

/// Stable key segment of a parameter set, e.g. `brand=BMW&fuel=Diesel`
fn query_segment<P: QueryParams>(params: &P) -> String {
    params
        .to_query()
        .into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Invalidate every key starting with one of the `roots`
async fn invalidate_roots(context: &AppContext, roots: &[&str]) {
    for root in roots {
        context.cache().invalidate(&QueryKey::root(root)).await;
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use common::error::CrResult;
    use serde_json::json;

    use super::{branches, retry};
    use crate::{
        api::{ApiRequest, MockTransport, RawResponse},
        cache::QueryKey,
        context::test::signed_in,
    };
    use rental_portal_common::user::Role;

    #[tokio::test]
    async fn retry_should_refetch_fresh_entry() -> CrResult<()> {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|request: &ApiRequest| request.path == "/api/admin/branches")
            .times(2)
            .returning(|_| Ok(RawResponse::json(200, &json!({"success": true, "data": []}))));
        let context = signed_in(Arc::new(transport), Role::Admin).await;

        branches::branches(&context).await?;
        branches::branches(&context).await?;
        retry(&context, &QueryKey::root("adminBranches"), || {
            branches::branches(&context)
        })
        .await?;

        Ok(())
    }
}
