pub mod store;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::coord::Coordinate;

pub use store::PoiStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Academic,
    Dining,
    Recreation,
    Services,
    Transportation,
    Emergency,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Academic,
            Category::Dining,
            Category::Recreation,
            Category::Services,
            Category::Transportation,
            Category::Emergency,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Dining => "dining",
            Self::Recreation => "recreation",
            Self::Services => "services",
            Self::Transportation => "transportation",
            Self::Emergency => "emergency",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Academic => "Academic",
            Self::Dining => "Dining",
            Self::Recreation => "Recreation",
            Self::Services => "Services",
            Self::Transportation => "Transportation",
            Self::Emergency => "Emergency",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Academic => "🎓",
            Self::Dining => "🍽",
            Self::Recreation => "⚽",
            Self::Services => "🏢",
            Self::Transportation => "🚌",
            Self::Emergency => "🏥",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::all()
            .iter()
            .copied()
            .find(|c| c.id() == wanted)
            .ok_or_else(|| {
                let valid: Vec<&str> = Category::all().iter().map(|c| c.id()).collect();
                format!("Unknown category: {s}. Valid categories: {}", valid.join(", "))
            })
    }
}

/// A named, categorized, located campus feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poi {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub coordinates: Coordinate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_accessible: bool,
    #[serde(default)]
    pub is_essential: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
}

/// Form contents for a POI that has not been added to the store yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PoiDraft {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub location: Option<Coordinate>,
}

impl Default for PoiDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            category: Category::Services,
            location: None,
        }
    }
}

impl PoiDraft {
    pub fn at(location: Coordinate) -> Self {
        Self {
            location: Some(location),
            ..Self::default()
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn seed(
    id: &str,
    name: &str,
    category: Category,
    (lat, lng): (f64, f64),
    description: &str,
    is_accessible: bool,
    is_essential: bool,
    hours: &str,
) -> Poi {
    Poi {
        id: id.to_string(),
        name: name.to_string(),
        category,
        coordinates: Coordinate::new(lat, lng),
        description: description.to_string(),
        is_accessible,
        is_essential,
        hours: Some(hours.to_string()),
        floor: None,
    }
}

/// The campus locations every session starts with.
pub fn seed_pois() -> Vec<Poi> {
    vec![
        seed(
            "1",
            "Main Library",
            Category::Academic,
            (0.3476, 32.5825),
            "Central library with study spaces, computer labs, and research materials",
            true,
            true,
            "6:00 AM - 10:00 PM",
        ),
        seed(
            "2",
            "Student Center",
            Category::Services,
            (0.3478, 32.5827),
            "Student services, registrar, financial aid, and student organizations",
            true,
            true,
            "8:00 AM - 5:00 PM",
        ),
        seed(
            "3",
            "Business School",
            Category::Academic,
            (0.3480, 32.5830),
            "Main business administration building with lecture halls and faculty offices",
            true,
            false,
            "7:00 AM - 9:00 PM",
        ),
        seed(
            "4",
            "University Cafeteria",
            Category::Dining,
            (0.3474, 32.5828),
            "Main dining facility with various food options",
            true,
            true,
            "6:30 AM - 8:00 PM",
        ),
        seed(
            "5",
            "Sports Complex",
            Category::Recreation,
            (0.3485, 32.5832),
            "Gymnasium, swimming pool, and outdoor sports facilities",
            false,
            false,
            "6:00 AM - 10:00 PM",
        ),
        seed(
            "6",
            "Medical Center",
            Category::Emergency,
            (0.3472, 32.5824),
            "Campus health services and emergency medical care",
            true,
            true,
            "24/7",
        ),
        seed(
            "7",
            "Shuttle Stop - Main Gate",
            Category::Transportation,
            (0.3470, 32.5820),
            "Main campus shuttle stop and taxi pickup point",
            true,
            true,
            "5:30 AM - 11:00 PM",
        ),
    ]
}
