use std::fmt::{Display, Formatter};

use crate::session::SessionState;

/// Screens of the portal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    About,
    Contact,
    Vehicles,
    VehicleDetails(String),
    Rentals,
    Profile,
    Dashboard,
    DashboardCars,
    DashboardBranches,
    DashboardRentals,
    DashboardUsers,
    DashboardUserDetails(String),
    DashboardReports,
    DashboardSettings,
}

/// Who may open a [Route]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Admin,
}

/// Decision of a route guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Session not read yet. Render a placeholder rather than redirecting too early.
    Wait,
    Allow,
    Redirect(Route),
}

impl Route {
    /// Resolve a URL `path`. Query strings and trailing slashes are ignored.
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split('?').next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let route = match segments.as_slice() {
            [] => Self::Home,
            ["about"] => Self::About,
            ["contact"] => Self::Contact,
            ["vehicles"] => Self::Vehicles,
            ["vehicles", id] => Self::VehicleDetails((*id).to_owned()),
            ["rentals"] => Self::Rentals,
            ["profile"] => Self::Profile,
            ["dashboard"] => Self::Dashboard,
            ["dashboard", "cars"] => Self::DashboardCars,
            ["dashboard", "branches"] => Self::DashboardBranches,
            ["dashboard", "rentals"] => Self::DashboardRentals,
            ["dashboard", "users"] => Self::DashboardUsers,
            ["dashboard", "users", id] => Self::DashboardUserDetails((*id).to_owned()),
            ["dashboard", "reports"] => Self::DashboardReports,
            ["dashboard", "settings"] => Self::DashboardSettings,
            _ => return None,
        };
        Some(route)
    }

    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_owned(),
            Self::About => "/about".to_owned(),
            Self::Contact => "/contact".to_owned(),
            Self::Vehicles => "/vehicles".to_owned(),
            Self::VehicleDetails(id) => format!("/vehicles/{id}"),
            Self::Rentals => "/rentals".to_owned(),
            Self::Profile => "/profile".to_owned(),
            Self::Dashboard => "/dashboard".to_owned(),
            Self::DashboardCars => "/dashboard/cars".to_owned(),
            Self::DashboardBranches => "/dashboard/branches".to_owned(),
            Self::DashboardRentals => "/dashboard/rentals".to_owned(),
            Self::DashboardUsers => "/dashboard/users".to_owned(),
            Self::DashboardUserDetails(id) => format!("/dashboard/users/{id}"),
            Self::DashboardReports => "/dashboard/reports".to_owned(),
            Self::DashboardSettings => "/dashboard/settings".to_owned(),
        }
    }

    pub const fn access(&self) -> Access {
        match self {
            Self::Home | Self::About | Self::Contact | Self::Vehicles | Self::VehicleDetails(_) => {
                Access::Public
            }
            Self::Rentals | Self::Profile => Access::Authenticated,
            Self::Dashboard
            | Self::DashboardCars
            | Self::DashboardBranches
            | Self::DashboardRentals
            | Self::DashboardUsers
            | Self::DashboardUserDetails(_)
            | Self::DashboardReports
            | Self::DashboardSettings => Access::Admin,
        }
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Decide whether the `route` may be shown for the session `state`. Protected routes wait for
/// hydration, then send visitors without the required access back home.
pub fn guard(route: &Route, state: &SessionState) -> Guard {
    let access = route.access();
    if access == Access::Public {
        return Guard::Allow;
    }
    if !state.hydrated {
        return Guard::Wait;
    }
    let allowed = match access {
        Access::Public => true,
        Access::Authenticated => state.is_authenticated(),
        Access::Admin => state.is_admin(),
    };
    if allowed {
        Guard::Allow
    } else {
        Guard::Redirect(Route::Home)
    }
}
