//! Command handlers, one module per command family.

pub mod config_cmd;
pub mod resources;
pub mod search;
pub mod util;

use wayfare_core::Console;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Run `body` with `$T` bound to the record type behind a runtime
/// [`ResourceKind`](wayfare_core::ResourceKind).
macro_rules! with_resource {
    ($kind:expr, $T:ident => $body:expr) => {{
        use wayfare_core::ResourceKind as K;
        match $kind {
            K::CabTypes => {
                type $T = wayfare_core::CabType;
                $body
            }
            K::Cabs => {
                type $T = wayfare_core::Cab;
                $body
            }
            K::Locations => {
                type $T = wayfare_core::Location;
                $body
            }
            K::LocationServices => {
                type $T = wayfare_core::LocationService;
                $body
            }
            K::MealPlans => {
                type $T = wayfare_core::MealPlan;
                $body
            }
            K::RoomTypes => {
                type $T = wayfare_core::RoomType;
                $body
            }
            K::Hotels => {
                type $T = wayfare_core::Hotel;
                $body
            }
            K::CabPrices => {
                type $T = wayfare_core::CabPrice;
                $body
            }
            K::TripPlanRequests => {
                type $T = wayfare_core::TripPlanRequest;
                $body
            }
            K::Roles => {
                type $T = wayfare_core::Role;
                $body
            }
            K::Users => {
                type $T = wayfare_core::User;
                $body
            }
        }
    }};
}

pub(crate) use with_resource;

/// Dispatch a data command against a connected console.
pub async fn dispatch(cmd: Command, console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::List(args) => {
            with_resource!(args.resource, T => resources::handle_list::<T>(console, &args, global).await)
        }
        Command::Get(args) => {
            with_resource!(args.resource, T => resources::handle_get::<T>(console, &args, global).await)
        }
        Command::Search(args) => {
            with_resource!(args.resource, T => search::handle::<T>(console, &args, global).await)
        }
        Command::Config(_) | Command::Completions(_) => unreachable!("handled before connecting"),
    }
}
