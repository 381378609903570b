use crate::area::{AreaIndicatorSet, IndicatorObservation};
use crate::catalog::{Catalog, IndicatorId};
use crate::scoring::{NationalBaselines, ReferenceDistribution};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::warn;

/// A report request as written to disk.
///
/// Example YAML:
/// ```yaml
/// report_id: west-tokyo
/// baseline:
///   name: national
///   indicators:
///     kids_ratio: { year: "2020", values: [9.8, 11.2, 12.5] }
/// areas:
///   - name: Musashino
///     code: "13203"
///     sample_count: 1200
///     observations:
///       - { indicator: kids_ratio, value: 11.2, year: "2020", source: census }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReportRequest {
    #[serde(default)]
    pub report_id: Option<String>,
    #[serde(default)]
    pub baseline: Option<BaselineInput>,
    pub areas: Vec<AreaInput>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BaselineInput {
    pub name: String,
    /// Keyed by indicator id; unknown ids are skipped
    #[serde(default)]
    pub indicators: BTreeMap<String, DistributionInput>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DistributionInput {
    #[serde(default)]
    pub year: Option<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AreaInput {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub data_year: Option<String>,
    #[serde(default)]
    pub sample_count: Option<u64>,
    #[serde(default)]
    pub observations: Vec<ObservationInput>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ObservationInput {
    pub indicator: String,
    pub value: f64,
    pub year: String,
    #[serde(default)]
    pub source: Option<String>,
}

/// Areas ready for scoring, plus caveats about input that had to be skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRequest {
    pub report_id: Option<String>,
    pub baselines: NationalBaselines,
    pub areas: Vec<AreaIndicatorSet>,
    /// Notes per area code for observations that could not be used
    pub skipped: BTreeMap<String, Vec<String>>,
}

pub fn load_request(path: &Path) -> Result<LoadedRequest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read report request at {}", path.display()))?;
    let request: ReportRequest = serde_saphyr::from_str(&content)
        .with_context(|| {
            format!(
                "Failed to parse report request: invalid YAML in {}",
                path.display()
            )
        })?;
    Ok(request.into_loaded())
}

impl ReportRequest {
    pub fn into_loaded(self) -> LoadedRequest {
        let baselines = match self.baseline {
            Some(baseline) => {
                let mut baselines = NationalBaselines::new(baseline.name);
                for (key, dist) in baseline.indicators {
                    match key.parse::<IndicatorId>() {
                        Ok(id) => {
                            let mut distribution = ReferenceDistribution::new(dist.values);
                            if let Some(year) = dist.year {
                                distribution = distribution.with_year(year);
                            }
                            baselines.insert(id, distribution);
                        }
                        Err(_) => {
                            warn!(indicator = %key, "skipping baseline for unknown indicator")
                        }
                    }
                }
                baselines
            }
            None => NationalBaselines::new("national"),
        };

        let mut skipped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let areas = self
            .areas
            .into_iter()
            .map(|input| {
                let mut area = AreaIndicatorSet::new(input.name, input.code);
                area.data_year = input.data_year;
                area.sample_count = input.sample_count;

                for obs in input.observations {
                    match obs.indicator.parse::<IndicatorId>() {
                        Ok(id) => area.insert(IndicatorObservation::new(
                            id,
                            obs.value,
                            obs.year,
                            obs.source.unwrap_or_else(|| "unspecified".to_string()),
                        )),
                        Err(_) => {
                            warn!(
                                area = %area.code,
                                indicator = %obs.indicator,
                                "skipping unknown indicator"
                            );
                            skipped
                                .entry(area.code.clone())
                                .or_default()
                                .push(format!("unknown indicator '{}' was skipped", obs.indicator));
                        }
                    }
                }
                area
            })
            .collect();

        LoadedRequest {
            report_id: self.report_id,
            baselines,
            areas,
            skipped,
        }
    }
}

impl LoadedRequest {
    pub fn find_area(&self, code: &str) -> Option<&AreaIndicatorSet> {
        self.areas.iter().find(|a| a.code == code)
    }

    /// Indicators the request has data for, in an area or in the baseline.
    pub fn covered_indicators(&self) -> BTreeSet<IndicatorId> {
        self.areas
            .iter()
            .flat_map(|a| a.observations().iter().map(|o| o.indicator))
            .chain(self.baselines.indicators())
            .collect()
    }

    /// Catalog restricted to the covered indicators, so an indicator nobody
    /// supplied does not count as missing for every area. Falls back to the
    /// standard catalog when nothing is covered.
    pub fn catalog(&self) -> Catalog {
        let covered: Vec<IndicatorId> = self.covered_indicators().into_iter().collect();
        if covered.is_empty() {
            Catalog::standard()
        } else {
            Catalog::subset(&covered)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    const REQUEST: &str = r#"
report_id: west
baseline:
  name: national
  indicators:
    kids_ratio:
      year: "2020"
      values: [8, 10, 12, 14]
    sunshine_hours:
      values: [1, 2]
areas:
  - name: Musashino
    code: "13203"
    sample_count: 1200
    observations:
      - { indicator: kids_ratio, value: 11.2, year: "2020", source: census }
      - { indicator: sunshine_hours, value: 3, year: "2020" }
  - name: Mitaka
    code: "13204"
    data_year: "2021"
    observations:
      - { indicator: crime_rate, value: 4.1, year: "2022" }
"#;

    #[test]
    fn test_parse_request() {
        let request: ReportRequest = serde_saphyr::from_str(REQUEST).unwrap();
        let loaded = request.into_loaded();

        assert_eq!(loaded.report_id.as_deref(), Some("west"));
        assert_eq!(loaded.areas.len(), 2);
        assert_eq!(loaded.baselines.name(), "national");
        assert_eq!(loaded.baselines.get(IndicatorId::KidsRatio).unwrap().len(), 4);

        let musashino = loaded.find_area("13203").unwrap();
        assert_eq!(musashino.sample_count, Some(1200));
        assert_eq!(musashino.value(IndicatorId::KidsRatio), Some(11.2));
        assert_eq!(musashino.observations().len(), 1);

        let mitaka = loaded.find_area("13204").unwrap();
        assert_eq!(mitaka.data_year.as_deref(), Some("2021"));
        assert_eq!(mitaka.observation(IndicatorId::CrimeRate).unwrap().source, "unspecified");
    }

    #[test]
    fn test_unknown_indicator_recorded_as_skipped() {
        let request: ReportRequest = serde_saphyr::from_str(REQUEST).unwrap();
        let loaded = request.into_loaded();

        let skipped = &loaded.skipped["13203"];
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].contains("sunshine_hours"));
        assert!(!loaded.skipped.contains_key("13204"));
    }

    #[test]
    fn test_missing_baseline_section() {
        let yaml = r#"
areas:
  - name: A
    code: "1"
"#;
        let request: ReportRequest = serde_saphyr::from_str(yaml).unwrap();
        let loaded = request.into_loaded();
        assert!(loaded.baselines.get(IndicatorId::KidsRatio).is_none());
        assert!(loaded.areas[0].observations().is_empty());
    }

    #[test]
    fn test_catalog_covers_request_indicators_only() {
        let request: ReportRequest = serde_saphyr::from_str(REQUEST).unwrap();
        let loaded = request.into_loaded();

        let ids: Vec<_> = loaded.catalog().definitions().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![IndicatorId::KidsRatio, IndicatorId::CrimeRate]);
    }

    #[test]
    fn test_catalog_falls_back_to_standard() {
        let request: ReportRequest =
            serde_saphyr::from_str("areas:\n  - { name: A, code: \"1\" }\n").unwrap();
        let loaded = request.into_loaded();

        assert!(loaded.covered_indicators().is_empty());
        assert_eq!(loaded.catalog().len(), Catalog::standard().len());
    }

    #[test]
    fn test_confidence_ignores_indicators_nobody_supplied() {
        use crate::scoring::{ConfidenceLevel, PresetRegistry, ScoringEngine};

        let yaml = r#"
areas:
  - name: A
    code: "1"
    sample_count: 100
    observations:
      - { indicator: kids_ratio, value: 11, year: "2025" }
      - { indicator: crime_rate, value: 4, year: "2025" }
  - name: B
    code: "2"
    sample_count: 100
    observations:
      - { indicator: kids_ratio, value: 13, year: "2025" }
      - { indicator: crime_rate, value: 3, year: "2025" }
"#;
        let loaded = serde_saphyr::from_str::<ReportRequest>(yaml).unwrap().into_loaded();
        let registry = PresetRegistry::builtin();
        let preset = registry.get("balanced").unwrap();

        let catalog = loaded.catalog();
        let engine = ScoringEngine::new(catalog.definitions(), &loaded.baselines)
            .with_current_year(2026);
        let results = engine.score_cities(&loaded.areas, preset);
        assert!(results.iter().all(|r| r.confidence.level == ConfidenceLevel::High));

        let standard = Catalog::standard();
        let engine = ScoringEngine::new(standard.definitions(), &loaded.baselines)
            .with_current_year(2026);
        let results = engine.score_cities(&loaded.areas, preset);
        assert!(results.iter().all(|r| r.confidence.level == ConfidenceLevel::Low));
    }

    #[test]
    fn test_load_request_from_file() {
        let path = env::temp_dir().join("area_rank_test_request.yaml");
        std::fs::write(&path, REQUEST).unwrap();

        let loaded = load_request(&path).unwrap();
        assert_eq!(loaded.areas.len(), 2);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let path = env::temp_dir().join("area_rank_test_missing_request.yaml");
        let _ = std::fs::remove_file(&path);
        assert!(load_request(&path).is_err());
    }
}
