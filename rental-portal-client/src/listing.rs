//! Filter state of the list pages. Each page either plans a backend call from its filters or,
//! where the backend has no matching filter, narrows the fetched records locally. Every active
//! filter must hold for a record to be kept.

use std::{cmp::Ordering, collections::BTreeSet};

use chrono::NaiveDate;
use common::error::{CrError, CrResult};
use rental_portal_common::{
    branch::Branch,
    car::{Car, CarSearchParams},
    rental::{AdminRentalsParams, Rental, RentalStatus},
    user::{AdminUsersParams, Role, User, UserSearchParams, UserSortField},
    QueryParams, SortOrder,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
    api::Page,
    context::AppContext,
    debounce::{self, DebounceInput, Debouncer},
    forms::non_blank,
    queries,
};

/// Rentals shown per page of the user's rental history
pub const USER_RENTALS_PAGE_SIZE: u32 = 10;

/// Backend call chosen for the current filters
#[derive(Debug, Clone, PartialEq)]
pub enum FetchPlan<S, L> {
    /// At least one filter is active, use the search endpoint
    Search(S),
    /// Nothing to filter on, use the plain listing
    List(L),
}

/// What a list page renders
#[derive(Debug, Clone, PartialEq)]
pub enum ListState<T> {
    Loading,
    /// Error panel with a retry button
    Failed(String),
    Empty,
    Ready(Vec<T>),
}

impl<T> ListState<T> {
    /// Map the outcome of a load into the state to render
    pub fn from_result(result: CrResult<Vec<T>>) -> Self {
        match result {
            Ok(items) if items.is_empty() => Self::Empty,
            Ok(items) => Self::Ready(items),
            Err(error) => Self::Failed(error.user_message()),
        }
    }
}

/// Case insensitive substring test. A blank `needle` matches everything.
pub fn contains_text(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Slice `items` into the one based `page` of `limit` entries. Pages past the end clamp to the
/// last page.
pub fn paginate<T: Clone>(items: &[T], page: u32, limit: u32) -> Page<T> {
    let limit = limit.max(1) as usize;
    let total_pages = ((items.len() + limit - 1) / limit).max(1);
    let current_page = (page.max(1) as usize).min(total_pages);
    Page {
        items: items
            .iter()
            .skip((current_page - 1) * limit)
            .take(limit)
            .cloned()
            .collect(),
        current_page: u32::try_from(current_page).unwrap_or(u32::MAX),
        total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
        total_count: u64::try_from(items.len()).ok(),
    }
}

/// Tri-state filter over a boolean flag such as `isActive`
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FlagFilter {
    #[default]
    All,
    #[strum(to_string = "yes", serialize = "active", serialize = "available")]
    Yes,
    #[strum(to_string = "no", serialize = "inactive", serialize = "unavailable")]
    No,
}

impl FlagFilter {
    /// Flag value to send to the backend, [None] for [FlagFilter::All]
    pub const fn as_flag(self) -> Option<bool> {
        match self {
            Self::All => None,
            Self::Yes => Some(true),
            Self::No => Some(false),
        }
    }

    pub const fn matches(self, flag: bool) -> bool {
        match self.as_flag() {
            Some(expected) => expected == flag,
            None => true,
        }
    }
}

/// Filters of the public vehicle listing
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CarFilters {
    pub brand: String,
    pub gear_box: String,
    pub fuel: String,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl CarFilters {
    /// Filters preset from a `/vehicles?brand=` link
    pub fn for_brand<B: Into<String>>(brand: B) -> Self {
        Self {
            brand: brand.into(),
            ..Self::default()
        }
    }

    fn params(&self) -> CarSearchParams {
        CarSearchParams {
            brand: non_blank(&self.brand),
            gear_box: non_blank(&self.gear_box),
            fuel: non_blank(&self.fuel),
            min_price: self.min_price,
            max_price: self.max_price,
        }
    }

    pub fn plan(&self) -> FetchPlan<CarSearchParams, ()> {
        let params = self.params();
        if params.has_any() {
            FetchPlan::Search(params)
        } else {
            FetchPlan::List(())
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Search when any filter is set, otherwise list every car
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn load(&self, context: &AppContext) -> CrResult<Vec<Car>> {
        match self.plan() {
            FetchPlan::Search(params) => queries::cars::search_cars(context, &params).await,
            FetchPlan::List(()) => queries::cars::cars(context).await,
        }
    }
}

/// Filters of the admin vehicle table, applied to the full car list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdminCarFilters {
    /// Matched against name and brand
    pub search: String,
    pub availability: FlagFilter,
    /// Exact brand, [None] for every brand
    pub brand: Option<String>,
}

impl AdminCarFilters {
    pub fn matches(&self, car: &Car) -> bool {
        (contains_text(&car.name, &self.search) || contains_text(&car.brand, &self.search))
            && self.availability.matches(car.is_available)
            && self
                .brand
                .as_ref()
                .map_or(true, |brand| brand.eq_ignore_ascii_case(&car.brand))
    }

    pub fn apply(&self, cars: &[Car]) -> Vec<Car> {
        cars.iter().filter(|car| self.matches(car)).cloned().collect()
    }

    /// Distinct brands for the brand drop down, sorted
    pub fn brands(cars: &[Car]) -> Vec<String> {
        cars.iter()
            .map(|car| car.brand.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Fetch every car and keep the matching ones
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn load(&self, context: &AppContext) -> CrResult<Vec<Car>> {
        Ok(self.apply(&queries::cars::cars(context).await?))
    }
}

/// Filters of the admin rental table. Status, sorting and paging go to the backend; the text
/// search has no backend parameter and narrows the returned page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RentalFilters {
    params: AdminRentalsParams,
    /// Matched against renter names and email and the car name and brand
    pub search: String,
}

impl RentalFilters {
    pub const fn params(&self) -> &AdminRentalsParams {
        &self.params
    }

    /// Change the status filter, going back to the first page
    pub fn set_status(&mut self, status: Option<RentalStatus>) {
        self.params.status = status;
        self.params.page = 1;
    }

    pub fn set_page(&mut self, page: u32) {
        self.params.page = page.max(1);
    }

    pub fn set_sort<S: Into<String>>(&mut self, sort_by: S, sort_order: SortOrder) {
        self.params.sort_by = sort_by.into();
        self.params.sort_order = sort_order;
    }

    pub fn matches(&self, rental: &Rental) -> bool {
        let search = &self.search;
        contains_text(&rental.user.first_name, search)
            || contains_text(&rental.user.last_name, search)
            || contains_text(&rental.user.email, search)
            || contains_text(&rental.car.name, search)
            || contains_text(&rental.car.brand, search)
    }

    pub fn apply(&self, rentals: &[Rental]) -> Vec<Rental> {
        rentals
            .iter()
            .filter(|rental| self.matches(rental))
            .cloned()
            .collect()
    }

    /// Fetch the page described by the filters and narrow it by the text search
    /// # Errors
    /// This function will return an error if nobody is signed in or the request fails
    pub async fn load(&self, context: &AppContext) -> CrResult<Page<Rental>> {
        let page = queries::rentals::admin_rentals(context, &self.params).await?;
        Ok(Page {
            items: self.apply(&page.items),
            ..page
        })
    }
}

/// Filters of the signed in user's rental history. The backend only pages the history, so every
/// other filter narrows the fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRentalFilters {
    /// Matched against the car name and brand and the pickup branch and location
    pub search: String,
    pub status: Option<RentalStatus>,
    /// Earliest start date, inclusive
    pub date_from: Option<NaiveDate>,
    /// Latest start date, inclusive
    pub date_to: Option<NaiveDate>,
    /// Lowest final amount, inclusive
    pub min_amount: Option<f64>,
    /// Highest final amount, inclusive
    pub max_amount: Option<f64>,
    page: u32,
    pub limit: u32,
}

impl Default for UserRentalFilters {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: None,
            date_from: None,
            date_to: None,
            min_amount: None,
            max_amount: None,
            page: 1,
            limit: USER_RENTALS_PAGE_SIZE,
        }
    }
}

impl UserRentalFilters {
    pub const fn page(&self) -> u32 {
        self.page
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Returns true when any filter narrows the page, used to offer clearing them
    pub fn is_filtering(&self) -> bool {
        !self.search.trim().is_empty()
            || self.status.is_some()
            || self.date_from.is_some()
            || self.date_to.is_some()
            || self.min_amount.is_some()
            || self.max_amount.is_some()
    }

    /// Drop every filter but stay on the current page
    pub fn clear(&mut self) {
        *self = Self {
            page: self.page,
            limit: self.limit,
            ..Self::default()
        };
    }

    pub fn matches(&self, rental: &Rental) -> bool {
        let search = &self.search;
        let text = contains_text(&rental.car.name, search)
            || contains_text(&rental.car.brand, search)
            || contains_text(rental.pickup.branch.label(), search)
            || contains_text(&rental.pickup.location, search);
        let start = rental.start_date.date_naive();
        text && self.status.map_or(true, |status| status == rental.status)
            && self.date_from.map_or(true, |from| start >= from)
            && self.date_to.map_or(true, |to| start <= to)
            && self.min_amount.map_or(true, |min| rental.final_amount >= min)
            && self.max_amount.map_or(true, |max| rental.final_amount <= max)
    }

    pub fn apply(&self, rentals: &[Rental]) -> Vec<Rental> {
        rentals
            .iter()
            .filter(|rental| self.matches(rental))
            .cloned()
            .collect()
    }

    /// Fetch the current page of the history and narrow it by the filters. Paging details stay
    /// those of the backend page.
    /// # Errors
    /// This function will return an error if nobody is signed in or the request fails
    pub async fn load(&self, context: &AppContext) -> CrResult<Page<Rental>> {
        let page = queries::rentals::user_rentals(context, self.page, self.limit).await?;
        Ok(Page {
            items: self.apply(&page.items),
            ..page
        })
    }
}

/// Filters of the admin user table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFilters {
    /// Settled value of the name search box
    search: String,
    pub role: Option<Role>,
    pub status: FlagFilter,
    page: u32,
    pub limit: u32,
    pub sort_by: UserSortField,
    pub sort_order: SortOrder,
}

impl Default for UserFilters {
    fn default() -> Self {
        let params = AdminUsersParams::default();
        Self {
            search: String::new(),
            role: None,
            status: FlagFilter::All,
            page: params.page,
            limit: params.limit,
            sort_by: params.sort_by,
            sort_order: params.sort_order,
        }
    }
}

impl UserFilters {
    pub fn search(&self) -> &str {
        &self.search
    }

    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Apply the debounced search `term`. A new term starts over at the first page.
    pub fn set_search<S: Into<String>>(&mut self, term: S) {
        let term = term.into();
        if term != self.search {
            self.search = term;
            self.page = 1;
        }
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Sort by `field`, flipping the direction when it is already the sort column
    pub fn sort_on(&mut self, field: UserSortField) {
        if self.sort_by == field {
            self.sort_order = self.sort_order.toggled();
        } else {
            self.sort_by = field;
            self.sort_order = SortOrder::Asc;
        }
    }

    pub fn plan(&self) -> FetchPlan<UserSearchParams, AdminUsersParams> {
        let search = self.search.trim();
        if !search.is_empty() || self.role.is_some() || self.status != FlagFilter::All {
            return FetchPlan::Search(UserSearchParams {
                name: (!search.is_empty()).then(|| search.to_owned()),
                email: None,
                role: self.role,
                is_active: self.status.as_flag(),
            });
        }
        FetchPlan::List(AdminUsersParams {
            page: self.page,
            limit: self.limit,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            ..AdminUsersParams::default()
        })
    }

    /// Run the planned call. The search endpoint returns every match at once, so its results
    /// are paged here with the same page and limit.
    /// # Errors
    /// This function will return an error if nobody is signed in or the request fails
    pub async fn load(&self, context: &AppContext) -> CrResult<Page<User>> {
        match self.plan() {
            FetchPlan::Search(params) => {
                let users = queries::users::search_users(context, &params).await?;
                Ok(paginate(&users, self.page, self.limit))
            }
            FetchPlan::List(params) => queries::users::admin_users(context, &params).await,
        }
    }
}

/// Admin user table fed by a debounced name search box
#[derive(Debug)]
pub struct UserSearch {
    pub filters: UserFilters,
    terms: Debouncer<String>,
}

impl UserSearch {
    /// Search box using the configured debounce window. Every keystroke goes into the returned
    /// [DebounceInput].
    pub fn new(context: &AppContext) -> (DebounceInput<String>, Self) {
        let (input, terms) = debounce::channel(context.config().search_debounce);
        let search = Self {
            filters: UserFilters::default(),
            terms,
        };
        (input, search)
    }

    /// Wait until the search box settles, then load the users for the settled term. Returns
    /// [None] once the search box is closed.
    pub async fn next(&mut self, context: &AppContext) -> Option<CrResult<Page<User>>> {
        let term = self.terms.next().await?;
        self.filters.set_search(term);
        Some(self.filters.load(context).await)
    }
}

/// Sortable columns of the branch table
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BranchSortField {
    #[default]
    Name,
    City,
    Country,
}

/// Filters of the admin branch table, all applied locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchFilters {
    /// Matched against name, address and city
    pub search: String,
    /// Exact country, [None] for every country
    pub country: Option<String>,
    pub sort_by: BranchSortField,
    pub sort_order: SortOrder,
}

impl Default for BranchFilters {
    fn default() -> Self {
        Self {
            search: String::new(),
            country: None,
            sort_by: BranchSortField::Name,
            sort_order: SortOrder::Asc,
        }
    }
}

impl BranchFilters {
    pub fn matches(&self, branch: &Branch) -> bool {
        let search = &self.search;
        (contains_text(&branch.name, search)
            || contains_text(&branch.address, search)
            || contains_text(&branch.city, search))
            && self
                .country
                .as_ref()
                .map_or(true, |country| country == &branch.country)
    }

    fn compare(&self, left: &Branch, right: &Branch) -> Ordering {
        let key = |branch: &Branch| match self.sort_by {
            BranchSortField::Name => branch.name.to_lowercase(),
            BranchSortField::City => branch.city.to_lowercase(),
            BranchSortField::Country => branch.country.to_lowercase(),
        };
        let ordering = key(left).cmp(&key(right));
        match self.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    /// Matching branches in the selected order
    pub fn apply(&self, branches: &[Branch]) -> Vec<Branch> {
        let mut matching: Vec<Branch> = branches
            .iter()
            .filter(|branch| self.matches(branch))
            .cloned()
            .collect();
        matching.sort_by(|left, right| self.compare(left, right));
        matching
    }

    /// Distinct countries for the country drop down, sorted
    pub fn countries(branches: &[Branch]) -> Vec<String> {
        branches
            .iter()
            .map(|branch| branch.country.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Fetch every branch, keep the matching ones and sort them
    /// # Errors
    /// This function will return an error if nobody is signed in or the request fails
    pub async fn load(&self, context: &AppContext) -> CrResult<Vec<Branch>> {
        Ok(self.apply(&queries::branches::branches(context).await?))
    }
}

/// Parse an optional filter value where `all` or a blank string means no filter
/// # Errors
/// This function will return an error if the value is neither blank, `all` nor a valid `T`
pub fn parse_choice<T>(value: &str) -> CrResult<Option<T>>
where
    T: std::str::FromStr,
{
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| CrError::Generic(format!("Unknown filter value '{value}'")))
}
