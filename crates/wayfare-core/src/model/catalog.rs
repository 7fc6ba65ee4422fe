// ── Catalog domain types ──
//
// Inventory a trip is assembled from: vehicles, places, services,
// accommodation and the meal plans hotels offer.

use serde::{Deserialize, Serialize};

use super::{Entity, EntityId};

/// A class of vehicle (sedan, SUV, tempo traveller).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CabType {
    pub id: EntityId,
    pub name: String,
    /// Passenger seats, excluding the driver.
    #[serde(default)]
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cab {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub number_plate: Option<String>,
    #[serde(default)]
    pub cab_type_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
}

/// A transfer or sightseeing service operated at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationService {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub location_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomType {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub allowed_extra_beds: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub location_id: Option<EntityId>,
    #[serde(default)]
    pub stars: Option<u8>,
    /// Embedded snapshots; not deduplicated into the meal plan slice.
    #[serde(default)]
    pub meal_plans: Vec<MealPlan>,
}

macro_rules! named_entity {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Entity for $ty {
                fn id(&self) -> &EntityId {
                    &self.id
                }

                fn label(&self) -> String {
                    self.name.clone()
                }
            }
        )*
    };
}

named_entity!(CabType, Location, LocationService, MealPlan, RoomType, Hotel);

impl Entity for Cab {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> String {
        match &self.number_plate {
            Some(plate) => format!("{} ({plate})", self.name),
            None => self.name.clone(),
        }
    }
}
