use super::{Category, Direction, IndicatorDefinition, IndicatorId};

/// Bumped whenever an indicator is added, removed or redefined.
pub const CATALOG_VERSION: u32 = 1;

pub(super) fn definition_of(id: IndicatorId) -> IndicatorDefinition {
    use Category::*;
    use Direction::*;

    let (label, unit, direction, category, precision) = match id {
        IndicatorId::KidsRatio => ("Child population share", "%", HigherBetter, Childcare, 1),
        IndicatorId::NurseryCapacity => (
            "Nursery places per 100 preschoolers",
            "places",
            HigherBetter,
            Childcare,
            1,
        ),
        IndicatorId::PriceMedian => ("Median land price", "yen/m2", LowerBetter, Price, 0),
        IndicatorId::RentMedian => ("Median monthly rent", "yen", LowerBetter, Price, 0),
        IndicatorId::CrimeRate => (
            "Recorded offences per 1,000 residents",
            "per 1k",
            LowerBetter,
            Safety,
            2,
        ),
        IndicatorId::FloodRiskShare => (
            "Share of area in flood inundation zones",
            "%",
            LowerBetter,
            Disaster,
            1,
        ),
        IndicatorId::LandslideZones => (
            "Landslide warning zones",
            "zones",
            LowerBetter,
            Disaster,
            0,
        ),
        IndicatorId::StationCount => ("Rail stations", "stations", HigherBetter, Transport, 0),
        IndicatorId::StationDistance => (
            "Distance to nearest station",
            "m",
            LowerBetter,
            Transport,
            0,
        ),
        IndicatorId::ElementarySchools => (
            "Elementary schools per 10,000 children",
            "schools",
            HigherBetter,
            Education,
            1,
        ),
        IndicatorId::HospitalDensity => (
            "Hospitals per 100,000 residents",
            "hospitals",
            HigherBetter,
            Healthcare,
            1,
        ),
        IndicatorId::PediatricClinics => (
            "Pediatric clinics per 10,000 children",
            "clinics",
            HigherBetter,
            Healthcare,
            1,
        ),
    };

    IndicatorDefinition {
        id,
        label: label.to_string(),
        unit: unit.to_string(),
        direction,
        category,
        precision,
    }
}
