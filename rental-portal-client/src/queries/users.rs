use common::error::CrResult;
use rental_portal_common::user::{
    AdminUserUpdate, AdminUsersParams, ChangePasswordRequest, ProfileUpdate, User,
    UserSearchParams, UserStats,
};

use super::{
    invalidate_roots, query_segment, ADMIN_USERS_STALE_TIME, STATS_STALE_TIME,
    USER_STALE_TIME,
};
use crate::{api::Page, cache::QueryKey, context::AppContext};

const USER_ROOTS: [&str; 4] = ["adminUsers", "searchUsers", "user", "userStats"];

/// One page of users for the admin table
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn admin_users(context: &AppContext, params: &AdminUsersParams) -> CrResult<Page<User>> {
    let api = context.authorized().await?;
    context
        .cache()
        .fetch(
            QueryKey::root("adminUsers").with(query_segment(params)),
            ADMIN_USERS_STALE_TIME,
            || api.admin_users(params),
        )
        .await
}

/// Every user matching the search
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn search_users(context: &AppContext, params: &UserSearchParams) -> CrResult<Vec<User>> {
    let api = context.authorized().await?;
    context
        .cache()
        .fetch(
            QueryKey::root("searchUsers").with(query_segment(params)),
            ADMIN_USERS_STALE_TIME,
            || api.search_users(params),
        )
        .await
}

/// One user by id
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn user(context: &AppContext, user_id: &str) -> CrResult<User> {
    let api = context.authorized().await?;
    context
        .cache()
        .fetch(QueryKey::root("user").with(user_id), USER_STALE_TIME, || {
            api.user(user_id)
        })
        .await
}

/// User figures for the dashboard
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn user_stats(context: &AppContext) -> CrResult<UserStats> {
    let api = context.authorized().await?;
    context
        .cache()
        .fetch(QueryKey::root("userStats"), STATS_STALE_TIME, || {
            api.user_stats()
        })
        .await
}

/// Save an account from the admin form and refresh every user query
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn update_user(
    context: &AppContext,
    user_id: &str,
    update: &AdminUserUpdate,
) -> CrResult<User> {
    let user = context.authorized().await?.update_user(user_id, update).await?;
    invalidate_roots(context, &USER_ROOTS).await;
    Ok(user)
}

/// Delete a user, forgetting their cached copy
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn delete_user(context: &AppContext, user_id: &str) -> CrResult<String> {
    let message = context.authorized().await?.delete_user(user_id).await?;
    context.cache().remove(&QueryKey::root("user").with(user_id)).await;
    invalidate_roots(context, &USER_ROOTS).await;
    Ok(message)
}

/// Fetch the signed in user's profile and refresh the stored session user with it
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn profile(context: &AppContext) -> CrResult<User> {
    let user = context.authorized().await?.profile().await?;
    context.session().update_user(user.clone()).await?;
    Ok(user)
}

/// Apply `update` to the signed in user's profile and refresh the stored session user
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn update_profile(context: &AppContext, update: &ProfileUpdate) -> CrResult<User> {
    let user = context.authorized().await?.update_profile(update).await?;
    context.session().update_user(user.clone()).await?;
    context.cache().invalidate(&QueryKey::root("user").with(&user.id)).await;
    Ok(user)
}

/// Change the signed in user's password
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn change_password(
    context: &AppContext,
    request: &ChangePasswordRequest,
) -> CrResult<String> {
    context.authorized().await?.change_password(request).await
}
