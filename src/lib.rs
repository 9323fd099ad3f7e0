#![doc = include_str!("../README.md")]

pub mod cli;
pub mod error;
pub mod header;
pub mod index;
pub mod injector;
pub mod output;
pub mod record;
pub mod report;
pub mod smart_reader;
pub mod transform;

use serde::Serialize;

pub use error::{InjectionError, MissingHeaderKind};
pub use injector::{Injector, MissingnessModel, RecordOutcome, RngPair};
pub use transform::{
    InjectionConfig, InjectionRun, inject_missing, inject_missing_file,
    inject_missing_with_progress,
};

/// Counts gathered over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InjectionSummary {
    pub num_samples: usize,
    /// Names of the samples that could receive missing calls, in index order.
    pub missing_prone_samples: Vec<String>,
    pub total_records: usize,
    pub eligible_records: usize,
    /// Missing-prone genotypes considered across all eligible records.
    pub evaluated_genotypes: usize,
    pub blanked_genotypes: usize,
}

impl InjectionSummary {
    pub fn new(sample_names: &[String], missing_prone: &[usize]) -> Self {
        Self {
            num_samples: sample_names.len(),
            missing_prone_samples: missing_prone
                .iter()
                .map(|&i| sample_names[i].clone())
                .collect(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, outcome: RecordOutcome, missing_prone: usize) {
        self.total_records += 1;
        if let RecordOutcome::Eligible { blanked, .. } = outcome {
            self.eligible_records += 1;
            self.evaluated_genotypes += missing_prone;
            self.blanked_genotypes += blanked;
        }
    }

    /// Fraction of evaluated genotypes that were blanked.
    pub fn blanked_fraction(&self) -> f64 {
        if self.evaluated_genotypes == 0 {
            0.0
        } else {
            self.blanked_genotypes as f64 / self.evaluated_genotypes as f64
        }
    }
}
