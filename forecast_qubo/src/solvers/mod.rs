//! QUBO solvers
//!
//! Every solver turns a [`QuboModel`] into a [`SampleSet`] ranked by energy.
//! [`MockSolver`] returns a fixed answer for demos and tests;
//! [`AnnealingSolver`] delegates to an [`AnnealingBackend`] over a scoped
//! session.

use crate::error::Result;
use crate::qubo::QuboModel;
use crate::samples::SampleSet;

pub mod annealing;
pub mod mock;
pub mod simulated;

pub use annealing::{
    AnnealingBackend, AnnealingSolver, BackendError, BackendRecord, BackendResponse,
    BackendSession, JobId, RetryPolicy, SessionGuard,
};
pub use mock::MockSolver;
pub use simulated::{SimulatedAnnealingBackend, SimulatedAnnealingConfig};

/// Common interface for QUBO solvers
pub trait Solver {
    /// Name of the solver
    fn name(&self) -> &str;

    /// Solve `model`, returning samples in ascending energy order
    ///
    /// Fails with `SolverUnavailable` when the backend cannot be reached or
    /// fails, and with `InvalidQubo` when `model` does not validate.
    fn solve(&self, model: &QuboModel) -> Result<SampleSet>;
}

impl<S: Solver + ?Sized> Solver for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(&self, model: &QuboModel) -> Result<SampleSet> {
        (**self).solve(model)
    }
}
