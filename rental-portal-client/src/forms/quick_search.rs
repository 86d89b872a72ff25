use reqwest::Url;

use crate::{listing::CarFilters, routes::Route};

/// Brand choice meaning "no brand filter"
pub const ALL_BRANDS: &str = "all";

/// Origin the listing link is built on before the path and query are cut back out
const LINK_ORIGIN: &str = "http://localhost";

/// Booking form of the home page hero. It only collects a rough trip and sends the visitor to
/// the vehicle listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuickSearchForm {
    pub brand: String,
    pub rental_location: String,
    pub return_location: String,
    pub rental_date: String,
    pub return_date: String,
}

impl QuickSearchForm {
    /// Every field is set and the trip does not end where it starts
    pub fn is_valid(&self) -> bool {
        let filled = [
            &self.brand,
            &self.rental_location,
            &self.return_location,
            &self.rental_date,
            &self.return_date,
        ]
        .iter()
        .all(|value| !value.trim().is_empty());
        filled && self.rental_location.trim() != self.return_location.trim()
    }

    /// Brand to filter on, [None] for every brand
    fn brand_filter(&self) -> Option<&str> {
        let brand = self.brand.trim();
        (!brand.is_empty() && !brand.eq_ignore_ascii_case(ALL_BRANDS)).then_some(brand)
    }

    /// Link to the vehicle listing, e.g. `/vehicles?brand=BMW`, with the brand form encoded.
    /// [None] while the form is invalid.
    pub fn target(&self) -> Option<String> {
        if !self.is_valid() {
            return None;
        }
        let path = Route::Vehicles.path();
        let Some(brand) = self.brand_filter() else {
            return Some(path);
        };
        let link = Url::parse_with_params(&format!("{LINK_ORIGIN}{path}"), [("brand", brand)]).ok()?;
        Some(format!("{path}?{}", link.query().unwrap_or_default()))
    }

    /// Filters the vehicle listing opens with
    pub fn filters(&self) -> CarFilters {
        self.brand_filter()
            .map(CarFilters::for_brand)
            .unwrap_or_default()
    }
}
