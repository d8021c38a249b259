//! Solver output: ranked assignments

use crate::error::Result;
use crate::qubo::Assignment;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// One candidate assignment and its energy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleResult {
    pub sample: Assignment,
    pub energy: f64,
    /// How many reads produced this assignment
    #[serde(skip_serializing)]
    pub num_occurrences: u32,
}

impl SampleResult {
    pub fn new(sample: Assignment, energy: f64) -> Self {
        Self {
            sample,
            energy,
            num_occurrences: 1,
        }
    }

    pub fn with_occurrences(mut self, num_occurrences: u32) -> Self {
        self.num_occurrences = num_occurrences;
        self
    }
}

/// Samples ordered by ascending energy, best first
///
/// Equal energies keep the order the solver produced them in.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct SampleSet {
    samples: Vec<SampleResult>,
}

impl SampleSet {
    /// Rank samples by energy with a stable sort
    ///
    /// `-0.0` and `0.0` rank as equal.
    pub fn from_samples(mut samples: Vec<SampleResult>) -> Self {
        samples.sort_by(|a, b| (a.energy + 0.0).total_cmp(&(b.energy + 0.0)));
        Self { samples }
    }

    /// Lowest-energy sample
    pub fn best(&self) -> Option<&SampleResult> {
        self.samples.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SampleResult> {
        self.samples.iter()
    }

    pub fn samples(&self) -> &[SampleResult] {
        &self.samples
    }

    pub fn energies(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.energy).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// JSON array of `{"sample": {...}, "energy": ...}` objects
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the sample set to `path`, creating the parent directory if needed
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        log::debug!("Wrote {} samples to {}", self.len(), path.display());
        Ok(())
    }
}

impl<'a> IntoIterator for &'a SampleSet {
    type Item = &'a SampleResult;
    type IntoIter = std::slice::Iter<'a, SampleResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
