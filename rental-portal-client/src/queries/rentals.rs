use common::error::CrResult;
use rental_portal_common::rental::{
    AdminRentalsParams, CreateRentalRequest, Rental, RentalCancellation, RentalCompletion,
    RentalStats, RentalStatusUpdate,
};

use super::{
    invalidate_roots, query_segment, ADMIN_RENTALS_STALE_TIME, STATS_STALE_TIME,
    USER_RENTALS_STALE_TIME,
};
use crate::{
    api::{Confirmed, Page},
    cache::QueryKey,
    context::AppContext,
};

/// Roots touched by any rental write. Bookings change car availability as well.
const RENTAL_ROOTS: [&str; 5] = ["userRentals", "adminRentals", "rental", "rentalStats", "cars"];

/// One page of the signed in user's rentals
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn user_rentals(context: &AppContext, page: u32, limit: u32) -> CrResult<Page<Rental>> {
    let api = context.authorized().await?;
    context
        .cache()
        .fetch(
            QueryKey::root("userRentals").with(page).with(limit),
            USER_RENTALS_STALE_TIME,
            || api.user_rentals(page, limit),
        )
        .await
}

/// One page of every rental for the admin table
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn admin_rentals(
    context: &AppContext,
    params: &AdminRentalsParams,
) -> CrResult<Page<Rental>> {
    let api = context.authorized().await?;
    context
        .cache()
        .fetch(
            QueryKey::root("adminRentals").with(query_segment(params)),
            ADMIN_RENTALS_STALE_TIME,
            || api.admin_rentals(params),
        )
        .await
}

/// One rental by id
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn rental(context: &AppContext, rental_id: &str) -> CrResult<Rental> {
    let api = context.authorized().await?;
    context
        .cache()
        .fetch(
            QueryKey::root("rental").with(rental_id),
            ADMIN_RENTALS_STALE_TIME,
            || api.admin_rental(rental_id),
        )
        .await
}

/// Rental figures for the dashboard
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn rental_stats(context: &AppContext) -> CrResult<RentalStats> {
    let api = context.authorized().await?;
    context
        .cache()
        .fetch(QueryKey::root("rentalStats"), STATS_STALE_TIME, || {
            api.rental_stats()
        })
        .await
}

/// Book a car. Rental lists and car availability are refreshed afterwards.
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn create_rental(
    context: &AppContext,
    request: &CreateRentalRequest,
) -> CrResult<Confirmed<Rental>> {
    let confirmed = context.authorized().await?.create_rental(request).await?;
    invalidate_roots(context, &RENTAL_ROOTS).await;
    Ok(confirmed)
}

/// Mark a rental as picked up
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn activate_rental(context: &AppContext, rental_id: &str) -> CrResult<Rental> {
    let rental = context.authorized().await?.activate_rental(rental_id).await?;
    invalidate_roots(context, &RENTAL_ROOTS).await;
    Ok(rental)
}

/// Change a rental's status with optional admin notes
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn update_rental_status(
    context: &AppContext,
    rental_id: &str,
    update: &RentalStatusUpdate,
) -> CrResult<Rental> {
    let rental = context
        .authorized()
        .await?
        .update_rental_status(rental_id, update)
        .await?;
    invalidate_roots(context, &RENTAL_ROOTS).await;
    Ok(rental)
}

/// Close a rental with its return details
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn complete_rental(
    context: &AppContext,
    rental_id: &str,
    completion: &RentalCompletion,
) -> CrResult<Rental> {
    let rental = context
        .authorized()
        .await?
        .complete_rental(rental_id, completion)
        .await?;
    invalidate_roots(context, &RENTAL_ROOTS).await;
    Ok(rental)
}

/// Cancel a rental with an optional reason
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn cancel_rental(
    context: &AppContext,
    rental_id: &str,
    cancellation: &RentalCancellation,
) -> CrResult<Rental> {
    let rental = context
        .authorized()
        .await?
        .cancel_rental(rental_id, cancellation)
        .await?;
    invalidate_roots(context, &RENTAL_ROOTS).await;
    Ok(rental)
}

/// Delete a rental, forgetting its cached copy
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn delete_rental(context: &AppContext, rental_id: &str) -> CrResult<String> {
    let message = context.authorized().await?.delete_rental(rental_id).await?;
    context.cache().remove(&QueryKey::root("rental").with(rental_id)).await;
    invalidate_roots(context, &RENTAL_ROOTS).await;
    Ok(message)
}
