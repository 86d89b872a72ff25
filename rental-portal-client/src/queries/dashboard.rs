use common::error::CrResult;
use futures::try_join;
use rental_portal_common::{
    branch::BranchStats,
    rental::{AdminRentalsParams, Rental, RentalStats},
    user::UserStats,
};

use super::{branches, rentals, users};
use crate::context::AppContext;

/// Number of latest rentals listed on the dashboard
pub const RECENT_RENTALS: u32 = 5;

/// Figures shown on the admin dashboard landing page
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardOverview {
    pub users: UserStats,
    pub rentals: RentalStats,
    pub branches: BranchStats,
    pub recent_rentals: Vec<Rental>,
}

/// Load every dashboard figure concurrently. Any failure fails the whole overview.
/// # Errors
/// This function will return an error if any of the figures cannot be loaded
pub async fn overview(context: &AppContext) -> CrResult<DashboardOverview> {
    let recent = AdminRentalsParams {
        limit: RECENT_RENTALS,
        ..AdminRentalsParams::default()
    };
    let (users, rentals, branches, recent) = try_join!(
        users::user_stats(context),
        rentals::rental_stats(context),
        branches::branch_stats(context),
        rentals::admin_rentals(context, &recent),
    )?;
    Ok(DashboardOverview {
        users,
        rentals,
        branches,
        recent_rentals: recent.items,
    })
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use common::error::{CrError, CrResult};
    use rental_portal_common::user::Role;
    use serde_json::json;

    use super::overview;
    use crate::{
        api::{rentals::test::rental_json, ApiRequest, MockTransport, RawResponse},
        context::test::signed_in,
    };

    fn dashboard_transport(stats_status: u16) -> MockTransport {
        let mut transport = MockTransport::new();
        transport.expect_execute().returning(move |request: ApiRequest| {
            let body = match request.path.as_str() {
                "/api/admin/users/stats" => json!({"success": true, "data": {
                    "total": 10, "active": 8, "inactive": 2, "verified": 7, "unverified": 3,
                    "admins": 1, "users": 9, "newThisMonth": 4
                }}),
                "/api/admin/rentals/stats" => {
                    return Ok(RawResponse::json(
                        stats_status,
                        &json!({"success": stats_status == 200, "message": "Stats unavailable", "data": {
                            "total": 3, "active": 1, "completed": 1, "cancelled": 0, "pending": 1,
                            "overdue": 0, "totalRevenue": 900.0, "monthlyRevenue": 300.0
                        }}),
                    ))
                }
                "/api/admin/branches" => json!({"success": true, "data": [
                    {"_id": "b1", "name": "Central", "address": "1 Main St", "city": "Miami", "country": "USA"}
                ]}),
                _ => json!({"success": true, "data": [rental_json("r1", "active")]}),
            };
            Ok(RawResponse::json(200, &body))
        });
        transport
    }

    #[tokio::test]
    async fn overview_should_combine_every_figure() -> CrResult<()> {
        let context = signed_in(Arc::new(dashboard_transport(200)), Role::Admin).await;

        let overview = overview(&context).await?;

        assert_eq!(overview.users.new_this_month, 4);
        assert_eq!(overview.rentals.total, 3);
        assert_eq!(overview.branches.total_branches, 1);
        assert_eq!(overview.recent_rentals.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn overview_should_fail_when_any_figure_fails() {
        let context = signed_in(Arc::new(dashboard_transport(500)), Role::Admin).await;

        let result = overview(&context).await;

        assert!(matches!(result, Err(CrError::Api { status: 500, .. })));
    }
}
