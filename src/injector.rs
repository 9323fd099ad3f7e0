//! Stochastic model deciding which genotype calls become missing.
//!
//! A run fixes two things up front: a subset of "missing-prone" samples and a
//! per-sample propensity. Each record is then independently either left
//! alone or given a record-level missing rate, and every missing-prone sample
//! is blanked with probability `rate * propensity`.
//!
//! The order in which random values are drawn is part of the output contract.
//! Reordering any draw below changes the result for a given seed.

use rand::{Rng, SeedableRng, seq::index};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Beta, Distribution, Uniform};
use serde::Serialize;

use crate::error::InjectionError;
use crate::record::Record;

/// Parameters of the missingness model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MissingnessModel {
    /// Fraction of samples (rounded down) that can receive missing calls.
    pub sample_fraction: f64,
    /// Probability that a record is eligible for injection.
    pub record_probability: f64,
    /// Beta shape parameters of the per-sample propensity.
    pub propensity_shape: (f64, f64),
    /// Beta shape parameters of the per-record missing rate.
    pub record_rate_shape: (f64, f64),
    /// Uniform range the per-record rate is scaled by.
    pub rate_scale: (f64, f64),
}

impl Default for MissingnessModel {
    fn default() -> Self {
        Self {
            sample_fraction: 0.2,
            record_probability: 0.3,
            propensity_shape: (1.0, 3.0),
            record_rate_shape: (0.5, 3.0),
            rate_scale: (0.8, 1.5),
        }
    }
}

impl MissingnessModel {
    pub fn validate(&self) -> Result<(), InjectionError> {
        if !(0.0..=1.0).contains(&self.sample_fraction) {
            return Err(InjectionError::InvalidModel(format!(
                "sample fraction {} is outside [0, 1]",
                self.sample_fraction
            )));
        }
        if !(0.0..=1.0).contains(&self.record_probability) {
            return Err(InjectionError::InvalidModel(format!(
                "record probability {} is outside [0, 1]",
                self.record_probability
            )));
        }
        let (low, high) = self.rate_scale;
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(InjectionError::InvalidModel(format!(
                "rate scale range [{low}, {high}) is empty"
            )));
        }
        self.beta(self.propensity_shape)?;
        self.beta(self.record_rate_shape)?;
        Ok(())
    }

    /// Number of missing-prone samples among `num_samples`.
    pub fn missing_prone_count(&self, num_samples: usize) -> usize {
        (self.sample_fraction * num_samples as f64).floor() as usize
    }

    fn beta(&self, (alpha, beta): (f64, f64)) -> Result<Beta<f64>, InjectionError> {
        Beta::new(alpha, beta).map_err(|e| {
            InjectionError::InvalidModel(format!("Beta({alpha}, {beta}): {e}"))
        })
    }

    fn uniform(&self) -> Result<Uniform<f64>, InjectionError> {
        let (low, high) = self.rate_scale;
        Uniform::new(low, high).map_err(|e| {
            InjectionError::InvalidModel(format!("Uniform({low}, {high}): {e}"))
        })
    }
}

/// The two generators of a run.
///
/// `choice` serves discrete decisions (subset selection, coin flips);
/// `sampler` serves the continuous Beta/Uniform draws. Both derive from the
/// same seed; the sampler runs on a separate ChaCha stream.
#[derive(Debug, Clone)]
pub struct RngPair {
    pub choice: ChaCha8Rng,
    pub sampler: ChaCha8Rng,
}

impl RngPair {
    pub fn from_seed(seed: u64) -> Self {
        let choice = ChaCha8Rng::seed_from_u64(seed);
        let mut sampler = ChaCha8Rng::seed_from_u64(seed);
        sampler.set_stream(1);
        Self { choice, sampler }
    }
}

/// What happened to a single record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordOutcome {
    /// The eligibility draw failed; the record is untouched.
    Skipped,
    Eligible {
        missing_rate: f64,
        blanked: usize,
    },
}

/// Per-run state of the missingness model.
#[derive(Debug, Clone)]
pub struct Injector {
    model: MissingnessModel,
    rngs: RngPair,
    missing_prone: Vec<usize>,
    propensities: Vec<f64>,
    record_rate: Beta<f64>,
    rate_scale: Uniform<f64>,
}

impl Injector {
    pub fn new(
        model: MissingnessModel,
        num_samples: usize,
        seed: u64,
    ) -> Result<Self, InjectionError> {
        Self::with_rngs(model, num_samples, RngPair::from_seed(seed))
    }

    pub fn with_rngs(
        model: MissingnessModel,
        num_samples: usize,
        mut rngs: RngPair,
    ) -> Result<Self, InjectionError> {
        model.validate()?;
        let propensity = model.beta(model.propensity_shape)?;
        let record_rate = model.beta(model.record_rate_shape)?;
        let rate_scale = model.uniform()?;

        let amount = model.missing_prone_count(num_samples);
        let mut missing_prone = index::sample(&mut rngs.choice, num_samples, amount).into_vec();
        missing_prone.sort_unstable();

        let propensities = (0..num_samples)
            .map(|_| propensity.sample(&mut rngs.sampler))
            .collect();

        tracing::debug!(?missing_prone, "selected missing-prone samples");

        Ok(Self {
            model,
            rngs,
            missing_prone,
            propensities,
            record_rate,
            rate_scale,
        })
    }

    pub fn model(&self) -> &MissingnessModel {
        &self.model
    }

    /// Indices of the samples that can receive missing calls, ascending.
    pub fn missing_prone(&self) -> &[usize] {
        &self.missing_prone
    }

    pub fn propensities(&self) -> &[f64] {
        &self.propensities
    }

    pub fn num_samples(&self) -> usize {
        self.propensities.len()
    }

    /// Applies the model to one record in place.
    pub fn process(&mut self, record: &mut Record) -> RecordOutcome {
        let coin: f64 = self.rngs.choice.random();
        if coin >= self.model.record_probability {
            return RecordOutcome::Skipped;
        }

        let base = self.record_rate.sample(&mut self.rngs.sampler);
        let scale = self.rate_scale.sample(&mut self.rngs.sampler);
        let missing_rate = (base * scale).clamp(0.0, 1.0);

        let mut blanked = 0;
        for &sample in &self.missing_prone {
            let draw: f64 = self.rngs.choice.random();
            if draw < missing_rate * self.propensities[sample] && record.blank_genotype(sample) {
                blanked += 1;
            }
        }

        tracing::trace!(line = record.line(), missing_rate, blanked, "record eligible");
        RecordOutcome::Eligible {
            missing_rate,
            blanked,
        }
    }
}
