//! Fixed-answer solver

use crate::error::Result;
use crate::qubo::{Assignment, QuboModel};
use crate::samples::{SampleResult, SampleSet};
use crate::solvers::Solver;

/// Stand-in solver that ignores the model's coefficients
///
/// Not an optimizer: every call returns the same fixed [`SampleSet`]. The
/// model is still validated so malformed input is reported the same way as
/// with a real backend.
#[derive(Debug, Clone, PartialEq)]
pub struct MockSolver {
    samples: SampleSet,
}

impl MockSolver {
    /// Solver returning the default fixed sample set
    pub fn new() -> Self {
        Self::default()
    }

    /// Solver returning `samples` on every call
    pub fn with_samples(samples: SampleSet) -> Self {
        Self { samples }
    }

    /// The sample set every call returns
    pub fn fixed_samples(&self) -> &SampleSet {
        &self.samples
    }
}

impl Default for MockSolver {
    /// All four assignments of variables `1` and `2`
    fn default() -> Self {
        let sample = |x1: bool, x2: bool, energy: f64| {
            SampleResult::new(Assignment::from_iter([(1, x1), (2, x2)]), energy)
        };

        Self::with_samples(SampleSet::from_samples(vec![
            sample(true, true, -0.25),
            sample(false, true, -0.2),
            sample(true, false, -0.1),
            sample(false, false, 0.0),
        ]))
    }
}

impl Solver for MockSolver {
    fn name(&self) -> &str {
        "mock"
    }

    fn solve(&self, model: &QuboModel) -> Result<SampleSet> {
        model.validate()?;
        log::debug!(
            "Mock solver returning {} fixed samples for a model with {} terms",
            self.samples.len(),
            model.len()
        );
        Ok(self.samples.clone())
    }
}
