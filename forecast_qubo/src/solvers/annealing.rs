//! Solver backed by an external annealing service
//!
//! A solve opens a session, submits the QUBO, blocks on the response,
//! translates the backend's rows of bits into a [`SampleSet`] and closes the
//! session. The session lives in a [`SessionGuard`] so it is closed on every
//! exit path, including errors and unwinding panics.

use crate::error::{PipelineError, Result};
use crate::qubo::{Assignment, QuboModel, Variable};
use crate::samples::{SampleResult, SampleSet};
use crate::solvers::Solver;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a backend
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct BackendError {
    message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Handle of a submitted problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(pub u64);

/// One distinct read: a bit per response variable
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRecord {
    pub bits: Vec<u8>,
    pub energy: f64,
    pub num_occurrences: u32,
}

/// Native response of a backend: the variable order and one record per distinct read
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BackendResponse {
    pub variables: Vec<Variable>,
    pub records: Vec<BackendRecord>,
}

impl BackendResponse {
    /// Convert into a [`SampleSet`], rejecting malformed records
    pub fn into_sample_set(self) -> std::result::Result<SampleSet, BackendError> {
        let width = self.variables.len();
        let mut samples = Vec::with_capacity(self.records.len());

        for (row, record) in self.records.into_iter().enumerate() {
            if record.bits.len() != width {
                return Err(BackendError::new(format!(
                    "Record {} has {} values for {} variables",
                    row,
                    record.bits.len(),
                    width
                )));
            }
            if !record.energy.is_finite() {
                return Err(BackendError::new(format!(
                    "Record {} has non-finite energy {}",
                    row, record.energy
                )));
            }

            let bits = self.variables.iter().cloned().zip(record.bits);
            let assignment = Assignment::from_bits(bits)
                .map_err(|e| BackendError::new(format!("Record {}: {}", row, e)))?;
            samples.push(
                SampleResult::new(assignment, record.energy)
                    .with_occurrences(record.num_occurrences),
            );
        }

        Ok(SampleSet::from_samples(samples))
    }
}

/// An open connection to a backend
pub trait BackendSession {
    /// Submit a problem for solving
    fn submit(&mut self, model: &QuboModel) -> std::result::Result<JobId, BackendError>;

    /// Block until the response of `job` is available
    fn wait(&mut self, job: JobId) -> std::result::Result<BackendResponse, BackendError>;

    /// Release the connection
    fn close(&mut self) -> std::result::Result<(), BackendError>;
}

/// An external QUBO optimizer reachable over sessions
pub trait AnnealingBackend {
    /// Name of the backend, used in logs and errors
    fn name(&self) -> &str;

    /// Open a new session
    fn open_session(&self) -> std::result::Result<Box<dyn BackendSession + '_>, BackendError>;
}

impl<B: AnnealingBackend + ?Sized> AnnealingBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn open_session(&self) -> std::result::Result<Box<dyn BackendSession + '_>, BackendError> {
        (**self).open_session()
    }
}

/// Closes its session when dropped unless already released
pub struct SessionGuard<'a> {
    session: Box<dyn BackendSession + 'a>,
    backend: String,
    released: bool,
}

impl<'a> SessionGuard<'a> {
    /// Open a session on `backend`
    pub fn open<B: AnnealingBackend + ?Sized>(
        backend: &'a B,
    ) -> std::result::Result<Self, BackendError> {
        let session = backend.open_session()?;
        log::debug!("Opened session on {}", backend.name());
        Ok(Self {
            session,
            backend: backend.name().to_string(),
            released: false,
        })
    }

    pub fn session(&mut self) -> &mut (dyn BackendSession + 'a) {
        &mut *self.session
    }

    /// Close the session now and report any close error
    pub fn release(mut self) -> std::result::Result<(), BackendError> {
        self.released = true;
        let result = self.session.close();
        log::debug!("Closed session on {}", self.backend);
        result
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match self.session.close() {
            Ok(()) => log::debug!("Closed session on {} after an early exit", self.backend),
            Err(e) => log::warn!("Failed to close session on {}: {}", self.backend, e),
        }
    }
}

/// Retry settings of an [`AnnealingSolver`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, at least 1
    pub max_attempts: u32,
    /// Pause between attempts, in milliseconds
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: 0,
        }
    }
}

/// Solver delegating to an [`AnnealingBackend`]
#[derive(Debug, Clone)]
pub struct AnnealingSolver<B> {
    backend: B,
    retry: RetryPolicy,
}

impl<B: AnnealingBackend> AnnealingSolver<B> {
    /// Solver making a single attempt per solve
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn attempt(&self, model: &QuboModel) -> std::result::Result<SampleSet, BackendError> {
        let mut guard = SessionGuard::open(&self.backend)?;
        let job = guard.session().submit(model)?;
        let response = guard.session().wait(job)?;
        if let Err(e) = guard.release() {
            log::warn!("Failed to close session on {}: {}", self.backend.name(), e);
        }
        response.into_sample_set()
    }
}

impl<B: AnnealingBackend> Solver for AnnealingSolver<B> {
    fn name(&self) -> &str {
        self.backend.name()
    }

    fn solve(&self, model: &QuboModel) -> Result<SampleSet> {
        model.validate()?;

        let attempts = self.retry.max_attempts.max(1);
        let mut last_error = BackendError::new("no attempt was made");

        for attempt in 1..=attempts {
            match self.attempt(model) {
                Ok(samples) => {
                    log::info!(
                        "{} returned {} samples on attempt {}/{}",
                        self.backend.name(),
                        samples.len(),
                        attempt,
                        attempts
                    );
                    return Ok(samples);
                }
                Err(e) => {
                    log::warn!(
                        "{} attempt {}/{} failed: {}",
                        self.backend.name(),
                        attempt,
                        attempts,
                        e
                    );
                    last_error = e;
                    if attempt < attempts && self.retry.backoff_ms > 0 {
                        std::thread::sleep(Duration::from_millis(self.retry.backoff_ms));
                    }
                }
            }
        }

        Err(PipelineError::SolverUnavailable(format!(
            "{}: {}",
            self.backend.name(),
            last_error
        )))
    }
}
