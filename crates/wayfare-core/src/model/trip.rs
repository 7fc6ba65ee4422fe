use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use super::{Entity, EntityId};

/// Workflow status of an inbound trip-plan enquiry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TripPlanStatus {
    #[default]
    New,
    InProgress,
    Converted,
    Dropped,
    #[serde(other)]
    Unknown,
}

/// An enquiry submitted by a prospective traveller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPlanRequest {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub no_of_adults: u32,
    #[serde(default)]
    pub status: TripPlanStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for TripPlanRequest {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> String {
        match &self.destination {
            Some(dest) => format!("{} → {dest}", self.name),
            None => self.name.clone(),
        }
    }
}
