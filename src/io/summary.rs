use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::Config;
use crate::pipeline::RunSummary;
use crate::types::LinearUnit;

/// Contents of `summary.json`.
#[derive(Debug, Serialize)]
pub struct SummaryDocument<'a> {
    pub version: &'static str,
    /// Linear unit of every distance in the outputs; null when no layer declared one.
    pub units: Option<LinearUnit>,
    pub config: &'a Config,
    #[serde(flatten)]
    pub summary: &'a RunSummary,
}

pub fn write_summary(summary: &RunSummary, config: &Config, units: Option<LinearUnit>, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[io::summary] Failed to create {}", path.display()))?;
    let document = SummaryDocument { version: env!("CARGO_PKG_VERSION"), units, config, summary };
    serde_json::to_writer_pretty(BufWriter::new(file), &document)
        .with_context(|| format!("[io::summary] Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ParcelFailure;
    use crate::types::ParcelId;
    use serde_json::Value;

    #[test]
    fn test_summary_document_fields() {
        let summary = RunSummary {
            parcels: 3,
            parcels_failed: 1,
            failures: vec![ParcelFailure { parcel: ParcelId(9), error: "degenerate".into() }],
            tie_breaks: 2,
            ..RunSummary::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_summary(&summary, &Config::default(), Some(LinearUnit::Foot), &path).unwrap();

        let value: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["units"], "foot");
        assert_eq!(value["parcels"], 3);
        assert_eq!(value["tie_breaks"], 2);
        assert_eq!(value["failures"][0]["parcel"], 9);
        assert_eq!(value["config"]["max_side_fields"], 4);
        assert_eq!(value["aggregate"]["exclusions"]["zero_distance"], 0);
    }
}
