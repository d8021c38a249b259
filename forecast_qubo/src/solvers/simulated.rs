//! Local simulated-annealing backend
//!
//! Implements [`AnnealingBackend`] in-process so the annealing path can run
//! without hosted hardware. Each read starts from a random assignment and
//! performs single-bit Metropolis sweeps under a geometric inverse-temperature
//! schedule from `beta_min` to `beta_max`.

use crate::qubo::{QuboModel, Variable};
use crate::solvers::annealing::{
    AnnealingBackend, BackendError, BackendRecord, BackendResponse, BackendSession, JobId,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters of the simulated-annealing backend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedAnnealingConfig {
    /// Independent annealing runs per job
    pub num_reads: usize,
    /// Full passes over the variables per read
    pub sweeps: usize,
    pub beta_min: f64,
    pub beta_max: f64,
    pub seed: Option<u64>,
}

impl Default for SimulatedAnnealingConfig {
    fn default() -> Self {
        Self {
            num_reads: 20,
            sweeps: 500,
            beta_min: 0.1,
            beta_max: 10.0,
            seed: None,
        }
    }
}

impl SimulatedAnnealingConfig {
    fn validate(&self) -> Result<(), BackendError> {
        if self.num_reads == 0 || self.sweeps == 0 {
            return Err(BackendError::new(
                "num_reads and sweeps must be at least 1",
            ));
        }
        if !(self.beta_min > 0.0 && self.beta_max >= self.beta_min && self.beta_max.is_finite()) {
            return Err(BackendError::new(format!(
                "Invalid beta range [{}, {}]",
                self.beta_min, self.beta_max
            )));
        }
        Ok(())
    }
}

/// In-process [`AnnealingBackend`]
#[derive(Debug, Clone, Default)]
pub struct SimulatedAnnealingBackend {
    config: SimulatedAnnealingConfig,
}

impl SimulatedAnnealingBackend {
    pub fn new(config: SimulatedAnnealingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulatedAnnealingConfig {
        &self.config
    }
}

impl AnnealingBackend for SimulatedAnnealingBackend {
    fn name(&self) -> &str {
        "simulated-annealing"
    }

    fn open_session(&self) -> Result<Box<dyn BackendSession + '_>, BackendError> {
        self.config.validate()?;
        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Box::new(SimulatedSession {
            config: self.config,
            rng,
            jobs: HashMap::new(),
            next_job: 0,
            closed: false,
        }))
    }
}

struct SimulatedSession {
    config: SimulatedAnnealingConfig,
    rng: StdRng,
    jobs: HashMap<JobId, QuboModel>,
    next_job: u64,
    closed: bool,
}

/// Dense view of a QUBO: linear terms plus an adjacency list of couplings
struct Problem {
    variables: Vec<Variable>,
    linear: Vec<f64>,
    couplings: Vec<Vec<(usize, f64)>>,
}

impl Problem {
    fn from_model(model: &QuboModel) -> Self {
        let variables: Vec<Variable> = model.variables().into_iter().collect();
        let index: HashMap<&Variable, usize> =
            variables.iter().enumerate().map(|(i, v)| (v, i)).collect();

        let mut linear = vec![0.0; variables.len()];
        let mut couplings = vec![Vec::new(); variables.len()];
        for (a, b, coeff) in model.iter() {
            let (i, j) = (index[a], index[b]);
            if i == j {
                linear[i] += coeff;
            } else {
                couplings[i].push((j, coeff));
                couplings[j].push((i, coeff));
            }
        }

        Self {
            variables,
            linear,
            couplings,
        }
    }

    /// Energy change from flipping bit `i`
    fn flip_delta(&self, state: &[u8], i: usize) -> f64 {
        let field = self.linear[i]
            + self.couplings[i]
                .iter()
                .map(|&(j, c)| c * f64::from(state[j]))
                .sum::<f64>();
        if state[i] == 1 {
            -field
        } else {
            field
        }
    }

    fn energy(&self, state: &[u8]) -> f64 {
        let mut energy = 0.0;
        for i in 0..state.len() {
            if state[i] == 0 {
                continue;
            }
            energy += self.linear[i];
            // each coupling appears in both adjacency lists
            energy += self.couplings[i]
                .iter()
                .filter(|&&(j, _)| j > i)
                .map(|&(j, c)| c * f64::from(state[j]))
                .sum::<f64>();
        }
        energy
    }
}

impl SimulatedSession {
    fn anneal(&mut self, problem: &Problem) -> Vec<u8> {
        let n = problem.variables.len();
        let mut state: Vec<u8> = (0..n).map(|_| self.rng.gen_range(0..=1)).collect();
        let sweeps = self.config.sweeps;
        let ratio = self.config.beta_max / self.config.beta_min;

        for sweep in 0..sweeps {
            let progress = if sweeps > 1 {
                sweep as f64 / (sweeps - 1) as f64
            } else {
                1.0
            };
            let beta = self.config.beta_min * ratio.powf(progress);

            for i in 0..n {
                let delta = problem.flip_delta(&state, i);
                if delta <= 0.0 || self.rng.gen::<f64>() < (-beta * delta).exp() {
                    state[i] ^= 1;
                }
            }
        }

        state
    }
}

impl BackendSession for SimulatedSession {
    fn submit(&mut self, model: &QuboModel) -> Result<JobId, BackendError> {
        if self.closed {
            return Err(BackendError::new("Session is closed"));
        }
        let job = JobId(self.next_job);
        self.next_job += 1;
        self.jobs.insert(job, model.clone());
        Ok(job)
    }

    fn wait(&mut self, job: JobId) -> Result<BackendResponse, BackendError> {
        if self.closed {
            return Err(BackendError::new("Session is closed"));
        }
        let model = self
            .jobs
            .remove(&job)
            .ok_or_else(|| BackendError::new(format!("Unknown job {:?}", job)))?;
        let problem = Problem::from_model(&model);

        let mut records: Vec<BackendRecord> = Vec::new();
        for _ in 0..self.config.num_reads {
            let bits = self.anneal(&problem);
            match records.iter_mut().find(|r| r.bits == bits) {
                Some(record) => record.num_occurrences += 1,
                None => {
                    let energy = problem.energy(&bits);
                    records.push(BackendRecord {
                        bits,
                        energy,
                        num_occurrences: 1,
                    });
                }
            }
        }

        Ok(BackendResponse {
            variables: problem.variables,
            records,
        })
    }

    fn close(&mut self) -> Result<(), BackendError> {
        self.closed = true;
        self.jobs.clear();
        Ok(())
    }
}
