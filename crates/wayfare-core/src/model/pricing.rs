use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{CabType, Entity, EntityId, LocationService};

/// Price of a cab type on a location service for a date range.
///
/// The API embeds the referenced cab type and service as they were at
/// fetch time. Those snapshots may lag the authoritative slices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CabPrice {
    pub id: EntityId,
    pub cab_type_id: EntityId,
    pub location_service_id: EntityId,
    pub price: f64,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub cab_type: Option<CabType>,
    #[serde(default)]
    pub location_service: Option<LocationService>,
}

impl Entity for CabPrice {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> String {
        let cab = self
            .cab_type
            .as_ref()
            .map_or_else(|| format!("cab type {}", self.cab_type_id), |c| c.name.clone());
        let service = self.location_service.as_ref().map_or_else(
            || format!("service {}", self.location_service_id),
            |s| s.name.clone(),
        );
        format!("{cab} / {service}: {:.2}", self.price)
    }
}
