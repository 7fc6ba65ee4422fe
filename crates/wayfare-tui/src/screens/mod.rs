//! Screen implementations. Each screen is a top-level Component.

pub mod catalog;
pub mod pricing;

use wayfare_core::{CabType, Console, Hotel, Location, MealPlan, TripPlanRequest, User};

use crate::component::Component;
use crate::screen::ScreenId;

use self::catalog::CatalogScreen;
use self::pricing::CabPriceForm;

/// One component per tab.
pub fn create_screens(console: &Console) -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (ScreenId::Hotels, Box::new(CatalogScreen::<Hotel>::new())),
        (ScreenId::CabTypes, Box::new(CatalogScreen::<CabType>::new())),
        (ScreenId::Locations, Box::new(CatalogScreen::<Location>::new())),
        (ScreenId::MealPlans, Box::new(CatalogScreen::<MealPlan>::new())),
        (
            ScreenId::TripRequests,
            Box::new(CatalogScreen::<TripPlanRequest>::new()),
        ),
        (ScreenId::Users, Box::new(CatalogScreen::<User>::new())),
        (ScreenId::NewCabPrice, Box::new(CabPriceForm::new(console))),
    ]
}
