use common::error::{CrError, CrResult};
use log::{error, info, warn};
use rental_portal_client::{
    config::ClientConfig,
    context::AppContext,
    forms::login::LoginForm,
    listing::{
        parse_choice, BranchFilters, CarFilters, ListState, RentalFilters, UserRentalFilters,
        UserSearch,
    },
    queries,
    routes::{guard, Guard, Route},
    toast::{Toast, ToastKind},
};

const USAGE: &str = "Usage: rental_portal <command>
Commands:
    cars [brand]             list cars, optionally of one brand
    car <id>                 show one car and similar cars
    login <email> <password> sign in and keep the session
    logout                   sign out
    whoami                   show the signed in user
    rentals [page] [status]  list the signed in user's rentals
    branches [search]        list branches (admin)
    admin-rentals [status]   list every rental (admin)
    users [name]             list or search users (admin)
    dashboard                show the admin dashboard figures";

fn show_toast(toast: &Toast) {
    let description = toast.description.as_deref().unwrap_or_default();
    match toast.kind {
        ToastKind::Success => info!("{} {}", toast.title, description),
        ToastKind::Error => warn!("{} {}", toast.title, description),
    }
}

fn show_list<T, F>(label: &str, state: ListState<T>, line: F)
where
    F: Fn(&T) -> String,
{
    match state {
        ListState::Loading => info!("Loading {label}"),
        ListState::Failed(message) => error!("Failed to load {label}. {message}"),
        ListState::Empty => info!("No {label} found"),
        ListState::Ready(items) => {
            info!("{} {label}", items.len());
            for item in &items {
                info!("  {}", line(item));
            }
        }
    }
}

/// Stop unless the session may open `route`
async fn ensure_access(context: &AppContext, route: &Route) -> CrResult<()> {
    match guard(route, &context.session().snapshot().await) {
        Guard::Allow => Ok(()),
        Guard::Wait => Err("Session is still loading".into()),
        Guard::Redirect(target) => {
            show_toast(&Toast::auth_required(&format!("open {route}")));
            Err(format!("{route} is not available, redirecting to {target}").into())
        }
    }
}

async fn run(context: &AppContext, args: &[String]) -> CrResult<()> {
    let arg = |index: usize| args.get(index).map(String::as_str).unwrap_or_default();
    match arg(0) {
        "cars" => {
            let filters = CarFilters::for_brand(arg(1));
            let state = ListState::from_result(filters.load(context).await);
            show_list("cars", state, |car| {
                format!("{} {} ${:.2}/day", car.id, car.display_name(), car.price_per_day)
            });
        }
        "car" => {
            let car = queries::cars::car(context, arg(1)).await?;
            info!("{} {} ${:.2}/day", car.id, car.display_name(), car.price_per_day);
            let state = ListState::from_result(queries::cars::similar_cars(context, arg(1)).await);
            show_list("similar cars", state, |car| car.display_name());
        }
        "login" => {
            let form = LoginForm {
                email: arg(1).to_owned(),
                password: arg(2).to_owned(),
            };
            match context.login(&form).await {
                Ok(session) => info!("Welcome back, {}", session.user.full_name()),
                Err(CrError::Validation(errors)) => {
                    for (field, message) in errors {
                        warn!("{field}: {message}");
                    }
                }
                Err(error) => warn!("Login failed. {}", error.user_message()),
            }
        }
        "logout" => {
            context.logout().await?;
            info!("Signed out");
        }
        "whoami" => match context.session().user().await {
            Some(user) => info!("{} <{}> ({})", user.full_name(), user.email, user.role),
            None => info!("Not signed in"),
        },
        "rentals" => {
            ensure_access(context, &Route::Rentals).await?;
            let mut filters = UserRentalFilters::default();
            filters.status = parse_choice(arg(2))?;
            filters.set_page(arg(1).parse().unwrap_or(1));
            let result = filters.load(context).await;
            let state = ListState::from_result(result.map(|page| page.items));
            show_list("rentals", state, |rental| {
                format!("{} {} {} ({})", rental.id, rental.car.name, rental.start_date.date_naive(), rental.status)
            });
        }
        "branches" => {
            ensure_access(context, &Route::DashboardBranches).await?;
            let filters = BranchFilters {
                search: arg(1).to_owned(),
                ..BranchFilters::default()
            };
            let state = ListState::from_result(filters.load(context).await);
            show_list("branches", state, |branch| {
                format!("{} {}, {} ({})", branch.name, branch.city, branch.country, branch.address)
            });
        }
        "admin-rentals" => {
            ensure_access(context, &Route::DashboardRentals).await?;
            let mut filters = RentalFilters::default();
            filters.set_status(parse_choice(arg(1))?);
            let result = filters.load(context).await;
            let state = ListState::from_result(result.map(|page| page.items));
            show_list("rentals", state, |rental| {
                format!("{} {} {} ({})", rental.id, rental.user.email, rental.car.name, rental.status)
            });
        }
        "users" => {
            ensure_access(context, &Route::DashboardUsers).await?;
            let (input, mut search) = UserSearch::new(context);
            input.push(arg(1).to_owned());
            drop(input);
            let Some(result) = search.next(context).await else {
                return Ok(());
            };
            let state = ListState::from_result(result.map(|page| page.items));
            show_list("users", state, |user| {
                format!("{} {} <{}> ({})", user.id, user.full_name(), user.email, user.role)
            });
        }
        "dashboard" => {
            ensure_access(context, &Route::Dashboard).await?;
            let overview = queries::dashboard::overview(context).await?;
            info!(
                "Users: {} total, {} active, {} new this month",
                overview.users.total, overview.users.active, overview.users.new_this_month
            );
            info!(
                "Rentals: {} total, {} active, {} overdue, revenue {:.2}",
                overview.rentals.total,
                overview.rentals.active,
                overview.rentals.overdue,
                overview.rentals.total_revenue
            );
            info!(
                "Branches: {} across {} countries",
                overview.branches.total_branches,
                overview.branches.branches_by_country.len()
            );
        }
        _ => info!("{USAGE}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> CrResult<()> {
    log4rs::init_file("rental-portal-client/rental_portal_log.yml", Default::default())
        .map_err(|error| CrError::Generic(format!("Could not initialize logging. {error}")))?;
    let config = ClientConfig::from_env()?;
    info!("Using backend {}", config.api_base_url);
    let context = AppContext::start(config).await;
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(error) = run(&context, &args).await {
        show_toast(&Toast::from_error("Command failed", "continue", &error));
    }
    Ok(())
}
