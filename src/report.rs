use crate::catalog::{Catalog, IndicatorDefinition, CATALOG_VERSION};
use crate::scoring::{CityScoreResult, WeightPreset};
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// A scored candidate set as handed to renderers and storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub version: u32,
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
    pub catalog_version: u32,
    pub preset: WeightPreset,
    pub definitions: Vec<IndicatorDefinition>,
    pub results: Vec<CityScoreResult>,
}

impl ReportDocument {
    pub fn new(
        report_id: impl Into<String>,
        catalog: &Catalog,
        preset: &WeightPreset,
        results: Vec<CityScoreResult>,
    ) -> Self {
        Self {
            version: 1,
            report_id: report_id.into(),
            generated_at: Utc::now(),
            catalog_version: CATALOG_VERSION,
            preset: preset.clone(),
            definitions: catalog.definitions().to_vec(),
            results,
        }
    }
}

/// Load a saved report
pub fn load_report(path: &Path) -> Result<ReportDocument> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open report at {}", path.display()))?;

    let report: ReportDocument = serde_json::from_reader(file).context("Failed to load report")?;

    if report.version != 1 {
        anyhow::bail!("Unsupported report version: {}", report.version);
    }

    Ok(report)
}

/// Save a report as pretty JSON. The file is replaced atomically, so readers
/// never see a partial report.
pub fn save_report(path: &Path, report: &ReportDocument) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, report).context("Failed to serialize report")?;

    file.commit().context("Failed to save report")?;

    Ok(())
}
