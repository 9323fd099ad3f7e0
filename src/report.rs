//! Structured run report for downstream tool consumption.
//!
//! Written as JSON next to the output: seed, model parameters and the
//! counts of a run, so a benchmark can record exactly how its test data
//! was degraded.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::InjectionSummary;
use crate::injector::MissingnessModel;
use crate::output::OutputCompression;
use crate::transform::InjectionConfig;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub version: String,
    /// RFC 3339 timestamp of the run.
    pub timestamp: String,
    pub input: String,
    pub output: OutputInfo,
    pub seed: u64,
    pub model: MissingnessModel,
    pub statistics: Statistics,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputInfo {
    pub path: String,
    pub format: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub num_samples: usize,
    pub missing_prone_samples: Vec<String>,
    pub total_records: usize,
    pub eligible_records: usize,
    pub evaluated_genotypes: usize,
    pub blanked_genotypes: usize,
    pub blanked_fraction: f64,
}

impl From<&InjectionSummary> for Statistics {
    fn from(s: &InjectionSummary) -> Self {
        Statistics {
            num_samples: s.num_samples,
            missing_prone_samples: s.missing_prone_samples.clone(),
            total_records: s.total_records,
            eligible_records: s.eligible_records,
            evaluated_genotypes: s.evaluated_genotypes,
            blanked_genotypes: s.blanked_genotypes,
            blanked_fraction: s.blanked_fraction(),
        }
    }
}

impl RunReport {
    pub fn new(
        config: &InjectionConfig,
        compression: OutputCompression,
        summary: &InjectionSummary,
    ) -> Self {
        let timestamp = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string());

        RunReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp,
            input: config.input.display().to_string(),
            output: OutputInfo {
                path: config.output.display().to_string(),
                format: compression.name().to_string(),
            },
            seed: config.seed,
            model: config.model,
            statistics: Statistics::from(summary),
        }
    }

    /// Writes the report next to the output; `out.vcf.gz` gives `out.vcf_report.json`.
    pub fn write(&self, output_path: &Path) -> std::io::Result<PathBuf> {
        let report_path = report_path(output_path);
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(&report_path, json)?;
        tracing::info!("wrote run report to {}", report_path.display());
        Ok(report_path)
    }
}

pub fn report_path(output_path: &Path) -> PathBuf {
    let stem = output_path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();
    output_path.with_file_name(format!("{stem}_report.json"))
}
