use crate::area::{AreaIndicatorSet, Domain, DomainDataset, IndicatorObservation};
use crate::catalog::IndicatorId;
use crate::input::ObservationInput;
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A per-domain statistics collaborator (price, crime, disaster, ...).
pub trait DomainSource: Send + Sync {
    fn domain(&self) -> Domain;

    /// Fetch this domain's observations for a batch of area codes.
    fn fetch<'a>(&'a self, area_codes: &'a [String]) -> BoxFuture<'a, Result<DomainDataset>>;
}

/// Domain source backed by a `<domain>.yaml` file: a map from area code to
/// observations.
///
/// ```yaml
/// "13203":
///   - { indicator: price_median, value: 412000, year: "2024", source: land-survey }
/// ```
#[derive(Debug, Clone)]
pub struct DirectorySource {
    domain: Domain,
    path: PathBuf,
}

impl DirectorySource {
    pub fn new(domain: Domain, path: impl Into<PathBuf>) -> Self {
        Self {
            domain,
            path: path.into(),
        }
    }

    /// One source per domain file present in `dir`.
    pub fn discover(dir: &Path) -> Vec<Box<dyn DomainSource>> {
        Domain::ALL
            .into_iter()
            .map(|domain| (domain, dir.join(format!("{}.yaml", domain))))
            .filter(|(_, path)| path.exists())
            .map(|(domain, path)| {
                Box::new(DirectorySource::new(domain, path)) as Box<dyn DomainSource>
            })
            .collect()
    }

    async fn load(&self, area_codes: &[String]) -> Result<DomainDataset> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let by_area: BTreeMap<String, Vec<ObservationInput>> = serde_saphyr::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;

        let wanted: HashSet<&str> = area_codes.iter().map(String::as_str).collect();
        let mut dataset = DomainDataset::new(self.domain);
        for (code, observations) in by_area {
            if !wanted.contains(code.as_str()) {
                continue;
            }
            for obs in observations {
                match obs.indicator.parse::<IndicatorId>() {
                    Ok(id) => dataset.push(
                        code.clone(),
                        IndicatorObservation::new(
                            id,
                            obs.value,
                            obs.year,
                            obs.source.unwrap_or_else(|| self.domain.to_string()),
                        ),
                    ),
                    Err(_) => warn!(
                        domain = %self.domain,
                        indicator = %obs.indicator,
                        "skipping unknown indicator"
                    ),
                }
            }
        }
        Ok(dataset)
    }
}

impl DomainSource for DirectorySource {
    fn domain(&self) -> Domain {
        self.domain
    }

    fn fetch<'a>(&'a self, area_codes: &'a [String]) -> BoxFuture<'a, Result<DomainDataset>> {
        self.load(area_codes).boxed()
    }
}

/// Remembers which domains failed during one run. Once a domain trips,
/// later batches skip it instead of retrying.
#[derive(Debug, Default)]
pub struct DomainBreaker {
    tripped: BTreeSet<Domain>,
}

impl DomainBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self, domain: Domain) -> bool {
        self.tripped.contains(&domain)
    }

    pub fn trip(&mut self, domain: Domain) {
        self.tripped.insert(domain);
    }
}

/// What happened to each domain during enrichment.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FetchReport {
    /// First failure message per domain
    pub failures: BTreeMap<Domain, String>,
    /// Number of batches skipped per domain after its breaker tripped
    pub skipped_batches: BTreeMap<Domain, usize>,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Enrich areas with every domain source, batch by batch.
///
/// All open domains of a batch are fetched concurrently. A failing domain is
/// dropped for the rest of the run; its areas simply lack those indicators,
/// which the scoring engine treats as missing data. Never fails as a whole.
pub async fn enrich_areas(
    mut areas: Vec<AreaIndicatorSet>,
    sources: &[Box<dyn DomainSource>],
    batch_size: usize,
) -> (Vec<AreaIndicatorSet>, FetchReport) {
    let mut breaker = DomainBreaker::new();
    let mut report = FetchReport::default();
    let batch_size = batch_size.max(1);

    for batch in areas.chunks_mut(batch_size) {
        let codes: Vec<String> = batch.iter().map(|a| a.code.clone()).collect();

        let mut futures = FuturesUnordered::new();
        for source in sources {
            let domain = source.domain();
            if breaker.is_open(domain) {
                debug!(%domain, "skipping domain after earlier failure");
                *report.skipped_batches.entry(domain).or_default() += 1;
                continue;
            }
            let codes = &codes;
            futures.push(async move { (domain, source.fetch(codes).await) });
        }

        while let Some((domain, result)) = futures.next().await {
            match result {
                Ok(dataset) => {
                    debug!(%domain, areas = dataset.by_area.len(), "merged domain batch");
                    for area in batch.iter_mut() {
                        area.merge(&dataset);
                    }
                }
                Err(e) => {
                    warn!(
                        %domain,
                        error = %e,
                        "domain fetch failed, skipping it for remaining batches"
                    );
                    breaker.trip(domain);
                    report.failures.entry(domain).or_insert_with(|| e.to_string());
                }
            }
        }
    }

    (areas, report)
}
