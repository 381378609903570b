use crate::catalog::IndicatorId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// One raw value for one area, one indicator and one data year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorObservation {
    pub indicator: IndicatorId,
    pub value: f64,
    /// Data year as published by the source, e.g. "2020" or "FY2020"
    pub data_year: String,
    pub source: String,
}

impl IndicatorObservation {
    pub fn new(
        indicator: IndicatorId,
        value: f64,
        data_year: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            indicator,
            value,
            data_year: data_year.into(),
            source: source.into(),
        }
    }

    pub fn year(&self) -> Option<i32> {
        parse_data_year(&self.data_year)
    }

    /// Total preference order used to resolve two observations of the same
    /// indicator: newer year, then source, then a usable value, then value.
    fn preference(&self, other: &Self) -> Ordering {
        self.year()
            .cmp(&other.year())
            .then_with(|| self.source.cmp(&other.source))
            .then_with(|| self.value.is_finite().cmp(&other.value.is_finite()))
            .then_with(|| self.value.total_cmp(&other.value))
    }
}

/// Extract the first four-digit year from a published data year label.
///
/// Returns `None` for labels without a year ("unknown", "", "20-21").
pub fn parse_data_year(label: &str) -> Option<i32> {
    let bytes = label.as_bytes();
    let mut run_start = None;
    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            let start = *run_start.get_or_insert(i);
            if i + 1 - start == 4 && bytes.get(i + 1).map_or(true, |n| !n.is_ascii_digit()) {
                return label[start..=i].parse().ok();
            }
        } else {
            run_start = None;
        }
    }
    None
}

/// Data domain an upstream collaborator fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Population,
    Price,
    Crime,
    Disaster,
    Education,
    Transport,
    Healthcare,
}

impl Domain {
    pub const ALL: [Domain; 7] = [
        Domain::Population,
        Domain::Price,
        Domain::Crime,
        Domain::Disaster,
        Domain::Education,
        Domain::Transport,
        Domain::Healthcare,
    ];
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Domain::Population => "population",
            Domain::Price => "price",
            Domain::Crime => "crime",
            Domain::Disaster => "disaster",
            Domain::Education => "education",
            Domain::Transport => "transport",
            Domain::Healthcare => "healthcare",
        };
        f.write_str(name)
    }
}

/// Result of one per-domain fetch, keyed by area code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainDataset {
    pub domain: Option<Domain>,
    pub by_area: HashMap<String, Vec<IndicatorObservation>>,
}

impl DomainDataset {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain: Some(domain),
            by_area: HashMap::new(),
        }
    }

    pub fn push(&mut self, area_code: impl Into<String>, observation: IndicatorObservation) {
        self.by_area
            .entry(area_code.into())
            .or_default()
            .push(observation);
    }

    pub fn is_empty(&self) -> bool {
        self.by_area.values().all(|obs| obs.is_empty())
    }
}

/// All observations for one area, at most one per indicator, kept in catalog order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaIndicatorSet {
    pub name: String,
    pub code: String,
    /// Reference year of the area's population baseline, when the collaborator knows it
    pub data_year: Option<String>,
    /// Sample size behind the area's statistics; `None` when unverifiable
    pub sample_count: Option<u64>,
    observations: Vec<IndicatorObservation>,
}

impl AreaIndicatorSet {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            data_year: None,
            sample_count: None,
            observations: Vec::new(),
        }
    }

    pub fn with_observations(
        mut self,
        observations: impl IntoIterator<Item = IndicatorObservation>,
    ) -> Self {
        for observation in observations {
            self.insert(observation);
        }
        self
    }

    pub fn observations(&self) -> &[IndicatorObservation] {
        &self.observations
    }

    /// Insert an observation. If the indicator is already present the
    /// preferred one (newer year) is kept, whatever the insertion order.
    pub fn insert(&mut self, observation: IndicatorObservation) {
        match self
            .observations
            .binary_search_by(|o| o.indicator.cmp(&observation.indicator))
        {
            Ok(idx) => {
                if observation.preference(&self.observations[idx]) == Ordering::Greater {
                    self.observations[idx] = observation;
                }
            }
            Err(idx) => self.observations.insert(idx, observation),
        }
    }

    pub fn observation(&self, id: IndicatorId) -> Option<&IndicatorObservation> {
        self.observations
            .binary_search_by(|o| o.indicator.cmp(&id))
            .ok()
            .map(|idx| &self.observations[idx])
    }

    /// Raw value for an indicator; non-finite values count as absent.
    pub fn value(&self, id: IndicatorId) -> Option<f64> {
        self.observation(id)
            .map(|o| o.value)
            .filter(|v| v.is_finite())
    }

    /// Merge one domain's fetch result into this area. Additive and
    /// order-independent; merging an empty dataset changes nothing.
    pub fn merge(&mut self, dataset: &DomainDataset) {
        if let Some(observations) = dataset.by_area.get(&self.code) {
            for observation in observations {
                self.insert(observation.clone());
            }
        }
    }

    /// Year used for confidence: the explicit baseline year if set, otherwise
    /// the oldest parseable observation year, otherwise "unknown".
    pub fn effective_data_year(&self) -> String {
        if let Some(ref year) = self.data_year {
            return year.clone();
        }
        self.observations
            .iter()
            .filter_map(|o| o.year())
            .min()
            .map(|y| y.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(id: IndicatorId, value: f64, year: &str) -> IndicatorObservation {
        IndicatorObservation::new(id, value, year, "test")
    }

    #[test]
    fn test_parse_data_year() {
        assert_eq!(parse_data_year("2020"), Some(2020));
        assert_eq!(parse_data_year("FY2019"), Some(2019));
        assert_eq!(parse_data_year("2020年度"), Some(2020));
        assert_eq!(parse_data_year("12020"), None);
        assert_eq!(parse_data_year("unknown"), None);
        assert_eq!(parse_data_year(""), None);
    }

    #[test]
    fn test_insert_keeps_catalog_order() {
        let area = AreaIndicatorSet::new("A", "001").with_observations(vec![
            obs(IndicatorId::CrimeRate, 3.0, "2022"),
            obs(IndicatorId::KidsRatio, 12.0, "2020"),
        ]);
        let ids: Vec<_> = area.observations().iter().map(|o| o.indicator).collect();
        assert_eq!(ids, vec![IndicatorId::KidsRatio, IndicatorId::CrimeRate]);
    }

    #[test]
    fn test_insert_prefers_newer_year_in_any_order() {
        let older = obs(IndicatorId::CrimeRate, 5.0, "2018");
        let newer = obs(IndicatorId::CrimeRate, 4.0, "2022");

        let a = AreaIndicatorSet::new("A", "001")
            .with_observations(vec![older.clone(), newer.clone()]);
        let b = AreaIndicatorSet::new("A", "001").with_observations(vec![newer, older]);

        assert_eq!(a, b);
        assert_eq!(a.value(IndicatorId::CrimeRate), Some(4.0));
    }

    #[test]
    fn test_insert_keeps_finite_value_over_nan() {
        let usable = IndicatorObservation::new(IndicatorId::KidsRatio, 12.0, "2025", "census");
        let broken = IndicatorObservation::new(IndicatorId::KidsRatio, f64::NAN, "2025", "census");

        let a = AreaIndicatorSet::new("A", "001")
            .with_observations(vec![usable.clone(), broken.clone()]);
        let b = AreaIndicatorSet::new("A", "001").with_observations(vec![broken, usable]);

        assert_eq!(a.value(IndicatorId::KidsRatio), Some(12.0));
        assert_eq!(b.value(IndicatorId::KidsRatio), Some(12.0));
    }

    #[test]
    fn test_merge_empty_dataset_is_noop() {
        let mut area = AreaIndicatorSet::new("A", "001")
            .with_observations(vec![obs(IndicatorId::KidsRatio, 12.0, "2020")]);
        let before = area.clone();

        area.merge(&DomainDataset::default());
        area.merge(&DomainDataset::new(Domain::Crime));

        assert_eq!(area, before);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let mut crime = DomainDataset::new(Domain::Crime);
        crime.push("001", obs(IndicatorId::CrimeRate, 3.5, "2022"));
        let mut price = DomainDataset::new(Domain::Price);
        price.push("001", obs(IndicatorId::PriceMedian, 250_000.0, "2023"));
        price.push("999", obs(IndicatorId::PriceMedian, 1.0, "2023"));

        let mut a = AreaIndicatorSet::new("A", "001");
        a.merge(&crime);
        a.merge(&price);

        let mut b = AreaIndicatorSet::new("A", "001");
        b.merge(&price);
        b.merge(&crime);

        assert_eq!(a, b);
        assert_eq!(a.observations().len(), 2);
    }

    #[test]
    fn test_non_finite_value_is_absent() {
        let area = AreaIndicatorSet::new("A", "001")
            .with_observations(vec![obs(IndicatorId::KidsRatio, f64::NAN, "2020")]);
        assert!(area.observation(IndicatorId::KidsRatio).is_some());
        assert_eq!(area.value(IndicatorId::KidsRatio), None);
    }

    #[test]
    fn test_effective_data_year() {
        let mut area = AreaIndicatorSet::new("A", "001").with_observations(vec![
            obs(IndicatorId::KidsRatio, 12.0, "2020"),
            obs(IndicatorId::CrimeRate, 3.0, "2022"),
            obs(IndicatorId::PriceMedian, 1.0, "n/a"),
        ]);
        assert_eq!(area.effective_data_year(), "2020");

        area.data_year = Some("2021".to_string());
        assert_eq!(area.effective_data_year(), "2021");

        assert_eq!(AreaIndicatorSet::new("B", "002").effective_data_year(), "unknown");
    }
}
