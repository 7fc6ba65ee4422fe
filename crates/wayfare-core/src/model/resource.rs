use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Every resource slice held in [`AppState`](crate::store::AppState).
///
/// `Display`/`FromStr` use the slice key (`cab_types`); parsing also
/// accepts the REST path spelling (`cab-types`) so CLI arguments can use
/// either.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum ResourceKind {
    #[strum(to_string = "cab_types", serialize = "cab-types")]
    CabTypes,
    #[strum(to_string = "cabs")]
    Cabs,
    #[strum(to_string = "locations")]
    Locations,
    #[strum(to_string = "location_services", serialize = "location-services")]
    LocationServices,
    #[strum(to_string = "meal_plans", serialize = "meal-plans")]
    MealPlans,
    #[strum(to_string = "room_types", serialize = "room-types")]
    RoomTypes,
    #[strum(to_string = "hotels")]
    Hotels,
    #[strum(to_string = "cab_prices", serialize = "cab-prices")]
    CabPrices,
    #[strum(to_string = "trip_plan_requests", serialize = "trip-plan-requests")]
    TripPlanRequests,
    #[strum(to_string = "roles")]
    Roles,
    #[strum(to_string = "users")]
    Users,
}

impl ResourceKind {
    /// Key of the slice in the composed state, also the action tag prefix.
    pub fn key(self) -> &'static str {
        self.into()
    }

    /// REST collection path relative to the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            Self::CabTypes => "cab-types",
            Self::Cabs => "cabs",
            Self::Locations => "locations",
            Self::LocationServices => "location-services",
            Self::MealPlans => "meal-plans",
            Self::RoomTypes => "room-types",
            Self::Hotels => "hotels",
            Self::CabPrices => "cab-prices",
            Self::TripPlanRequests => "trip-plan-requests",
            Self::Roles => "roles",
            Self::Users => "users",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::CabTypes => "Cab types",
            Self::Cabs => "Cabs",
            Self::Locations => "Locations",
            Self::LocationServices => "Location services",
            Self::MealPlans => "Meal plans",
            Self::RoomTypes => "Room types",
            Self::Hotels => "Hotels",
            Self::CabPrices => "Cab prices",
            Self::TripPlanRequests => "Trip requests",
            Self::Roles => "Roles",
            Self::Users => "Users",
        }
    }
}
