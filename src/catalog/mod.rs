mod definitions;

pub use definitions::CATALOG_VERSION;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which way an indicator should move for an area to look better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherBetter,
    LowerBetter,
}

/// Indicator category. Weight presets assign weights per category, never per indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Childcare,
    Price,
    Safety,
    Disaster,
    Transport,
    Education,
    Healthcare,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Childcare,
        Category::Price,
        Category::Safety,
        Category::Disaster,
        Category::Transport,
        Category::Education,
        Category::Healthcare,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Childcare => "childcare",
            Category::Price => "price",
            Category::Safety => "safety",
            Category::Disaster => "disaster",
            Category::Transport => "transport",
            Category::Education => "education",
            Category::Healthcare => "healthcare",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match Category::ALL.iter().find(|c| c.as_str().eq_ignore_ascii_case(s)) {
            Some(category) => Ok(*category),
            None => bail!("Unknown category: {}", s),
        }
    }
}

/// Stable key of every indicator the engine knows about.
///
/// This is a closed set: adding an indicator means adding a variant here and
/// its definition in `definitions.rs`, and the compiler points at every match
/// that needs updating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorId {
    KidsRatio,
    NurseryCapacity,
    PriceMedian,
    RentMedian,
    CrimeRate,
    FloodRiskShare,
    LandslideZones,
    StationCount,
    StationDistance,
    ElementarySchools,
    HospitalDensity,
    PediatricClinics,
}

impl IndicatorId {
    /// Catalog order. Area observations and output rows follow this order.
    pub const ALL: [IndicatorId; 12] = [
        IndicatorId::KidsRatio,
        IndicatorId::NurseryCapacity,
        IndicatorId::PriceMedian,
        IndicatorId::RentMedian,
        IndicatorId::CrimeRate,
        IndicatorId::FloodRiskShare,
        IndicatorId::LandslideZones,
        IndicatorId::StationCount,
        IndicatorId::StationDistance,
        IndicatorId::ElementarySchools,
        IndicatorId::HospitalDensity,
        IndicatorId::PediatricClinics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorId::KidsRatio => "kids_ratio",
            IndicatorId::NurseryCapacity => "nursery_capacity",
            IndicatorId::PriceMedian => "price_median",
            IndicatorId::RentMedian => "rent_median",
            IndicatorId::CrimeRate => "crime_rate",
            IndicatorId::FloodRiskShare => "flood_risk_share",
            IndicatorId::LandslideZones => "landslide_zones",
            IndicatorId::StationCount => "station_count",
            IndicatorId::StationDistance => "station_distance",
            IndicatorId::ElementarySchools => "elementary_schools",
            IndicatorId::HospitalDensity => "hospital_density",
            IndicatorId::PediatricClinics => "pediatric_clinics",
        }
    }

    pub fn definition(&self) -> IndicatorDefinition {
        definitions::definition_of(*self)
    }
}

impl fmt::Display for IndicatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndicatorId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match IndicatorId::ALL.iter().find(|id| id.as_str() == s) {
            Some(id) => Ok(*id),
            None => bail!("Unknown indicator: {}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDefinition {
    pub id: IndicatorId,
    pub label: String,
    pub unit: String,
    pub direction: Direction,
    pub category: Category,
    /// Decimal places used when displaying raw values
    pub precision: usize,
}

impl IndicatorDefinition {
    /// Format a raw value with the indicator's precision and unit, e.g. "12.3 %"
    pub fn format_value(&self, value: f64) -> String {
        if self.unit.is_empty() {
            format!("{:.*}", self.precision, value)
        } else {
            format!("{:.*} {}", self.precision, value, self.unit)
        }
    }
}

/// Immutable indicator registry, built once at startup and passed by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    definitions: Vec<IndicatorDefinition>,
}

impl Catalog {
    /// The full standard catalog in `IndicatorId::ALL` order.
    pub fn standard() -> Self {
        Self {
            definitions: IndicatorId::ALL.iter().map(|id| id.definition()).collect(),
        }
    }

    /// A catalog restricted to some indicators, keeping catalog order.
    pub fn subset(ids: &[IndicatorId]) -> Self {
        Self {
            definitions: IndicatorId::ALL
                .iter()
                .filter(|id| ids.contains(id))
                .map(|id| id.definition())
                .collect(),
        }
    }

    pub fn definitions(&self) -> &[IndicatorDefinition] {
        &self.definitions
    }

    pub fn get(&self, id: IndicatorId) -> Option<&IndicatorDefinition> {
        find_definition(&self.definitions, id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Categories that have at least one indicator, in category order
    pub fn categories(&self) -> Vec<Category> {
        Category::ALL
            .iter()
            .copied()
            .filter(|c| self.definitions.iter().any(|d| d.category == *c))
            .collect()
    }
}

pub fn find_definition(
    definitions: &[IndicatorDefinition],
    id: IndicatorId,
) -> Option<&IndicatorDefinition> {
    definitions.iter().find(|d| d.id == id)
}
