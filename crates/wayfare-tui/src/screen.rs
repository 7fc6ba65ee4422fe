//! Screen identifiers, in tab-bar order.

use std::fmt;

use wayfare_core::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Hotels,
    CabTypes,
    Locations,
    MealPlans,
    TripRequests,
    Users,
    NewCabPrice,
}

impl ScreenId {
    pub const ALL: [ScreenId; 7] = [
        Self::Hotels,
        Self::CabTypes,
        Self::Locations,
        Self::MealPlans,
        Self::TripRequests,
        Self::Users,
        Self::NewCabPrice,
    ];

    /// Number key (1-7) that jumps to this screen.
    pub fn number(self) -> u8 {
        match self {
            Self::Hotels => 1,
            Self::CabTypes => 2,
            Self::Locations => 3,
            Self::MealPlans => 4,
            Self::TripRequests => 5,
            Self::Users => 6,
            Self::NewCabPrice => 7,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.number() == n)
    }

    /// Next screen in tab order (wraps around).
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous screen in tab order (wraps around).
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// The resource a catalog screen lists. `None` for form screens.
    pub fn kind(self) -> Option<ResourceKind> {
        match self {
            Self::Hotels => Some(ResourceKind::Hotels),
            Self::CabTypes => Some(ResourceKind::CabTypes),
            Self::Locations => Some(ResourceKind::Locations),
            Self::MealPlans => Some(ResourceKind::MealPlans),
            Self::TripRequests => Some(ResourceKind::TripPlanRequests),
            Self::Users => Some(ResourceKind::Users),
            Self::NewCabPrice => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self.kind() {
            Some(kind) => kind.label(),
            None => "New cab price",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
