//! QUBO model
//!
//! A quadratic unconstrained binary optimization problem stored as a sparse
//! map from unordered variable pairs to coefficients. Diagonal keys `(i, i)`
//! are the linear terms. The energy of a binary assignment `x` is
//! `sum(coeff(i, j) * x[i] * x[j])`.
//!
//! Interchange format: a JSON array of `[[i, j], value]` pairs, e.g.
//! `[[[1, 1], -0.1], [[1, 2], 0.05], [[2, 2], -0.2]]`.

use crate::error::{PipelineError, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;

/// Identifier of a binary variable: an integer index or a string label
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Variable {
    Index(i64),
    Label(String),
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Index(i) => write!(f, "{}", i),
            Variable::Label(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Variable {
    fn from(i: i64) -> Self {
        Variable::Index(i)
    }
}

impl From<i32> for Variable {
    fn from(i: i32) -> Self {
        Variable::Index(i as i64)
    }
}

impl From<usize> for Variable {
    fn from(i: usize) -> Self {
        Variable::Index(i as i64)
    }
}

impl From<&str> for Variable {
    fn from(s: &str) -> Self {
        Variable::Label(s.to_string())
    }
}

impl From<String> for Variable {
    fn from(s: String) -> Self {
        Variable::Label(s)
    }
}

/// Binary assignment of variables
///
/// Serialized as a JSON object keyed by variable, so an index and a label
/// with the same text (`1` and `"1"`) cannot be saved together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment(BTreeMap<Variable, bool>);

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an assignment from 0/1 values, rejecting anything else
    pub fn from_bits<V, I>(bits: I) -> Result<Self>
    where
        V: Into<Variable>,
        I: IntoIterator<Item = (V, u8)>,
    {
        let mut assignment = Self::new();
        for (var, bit) in bits {
            let var = var.into();
            match bit {
                0 => assignment.set(var, false),
                1 => assignment.set(var, true),
                other => {
                    return Err(PipelineError::InvalidParameter(format!(
                        "Variable {} has non-binary value {}",
                        var, other
                    )))
                }
            }
        }
        Ok(assignment)
    }

    pub fn set(&mut self, var: impl Into<Variable>, value: bool) {
        self.0.insert(var.into(), value);
    }

    pub fn get(&self, var: &Variable) -> Option<bool> {
        self.0.get(var).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, bool)> {
        self.0.iter().map(|(k, v)| (k, *v))
    }
}

impl<V: Into<Variable>> FromIterator<(V, bool)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (V, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl Serialize for Assignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let clash = self.0.keys().find(|var| match var {
            Variable::Label(label) => label
                .parse::<i64>()
                .map(|i| i.to_string() == *label && self.0.contains_key(&Variable::Index(i)))
                .unwrap_or(false),
            Variable::Index(_) => false,
        });
        if let Some(var) = clash {
            return Err(<S::Error as serde::ser::Error>::custom(format!(
                "Index {} and label \"{}\" map to the same JSON key",
                var, var
            )));
        }

        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (var, value) in &self.0 {
            map.serialize_entry(var, &u8::from(*value))?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
struct RawQubo(Vec<(Vec<Variable>, f64)>);

fn invalid(message: String) -> PipelineError {
    PipelineError::InvalidQubo(message)
}

fn variable_from_json(row: usize, value: &serde_json::Value) -> Result<Variable> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().map(Variable::Index).ok_or_else(|| {
            invalid(format!("Entry {}: {} is not an integer identifier", row, n))
        }),
        serde_json::Value::String(label) => Ok(Variable::Label(label.clone())),
        other => Err(invalid(format!(
            "Entry {}: {} is not a variable identifier",
            row, other
        ))),
    }
}

/// Validated sparse QUBO
///
/// Keys are stored in canonical `(min, max)` order so `(a, b)` and `(b, a)`
/// name the same entry, and equality is insensitive to pair order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "RawQubo")]
pub struct QuboModel {
    coefficients: BTreeMap<(Variable, Variable), f64>,
}

fn canonical(a: Variable, b: Variable) -> (Variable, Variable) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl QuboModel {
    /// Construct a model from pair-keyed coefficients
    ///
    /// Entries naming the same unordered pair are summed.
    pub fn new<A, B, I>(entries: I) -> Result<Self>
    where
        A: Into<Variable>,
        B: Into<Variable>,
        I: IntoIterator<Item = ((A, B), f64)>,
    {
        let mut model = Self::default();
        for ((a, b), value) in entries {
            model.insert(a.into(), b.into(), value)?;
        }
        Ok(model)
    }

    /// Construct a model from untyped keys, each of which must hold exactly two identifiers
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Vec<Variable>, f64)>,
    {
        let mut model = Self::default();
        for (key, value) in entries {
            let pair: [Variable; 2] = key.try_into().map_err(|key: Vec<Variable>| {
                PipelineError::InvalidQubo(format!(
                    "Key must be a pair of variables, got {} identifiers",
                    key.len()
                ))
            })?;
            let [a, b] = pair;
            model.insert(a, b, value)?;
        }
        Ok(model)
    }

    fn insert(&mut self, a: Variable, b: Variable, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(PipelineError::InvalidQubo(format!(
                "Coefficient for ({}, {}) is not finite: {}",
                a, b, value
            )));
        }

        let key = canonical(a, b);
        let merged = self.coefficients.get(&key).map_or(value, |v| v + value);
        if !merged.is_finite() {
            return Err(PipelineError::InvalidQubo(format!(
                "Merged coefficient for ({}, {}) overflows",
                key.0, key.1
            )));
        }
        self.coefficients.insert(key, merged);
        Ok(())
    }

    /// Re-check that every coefficient is finite
    pub fn validate(&self) -> Result<()> {
        match self.coefficients.iter().find(|(_, v)| !v.is_finite()) {
            Some(((a, b), v)) => Err(PipelineError::InvalidQubo(format!(
                "Coefficient for ({}, {}) is not finite: {}",
                a, b, v
            ))),
            None => Ok(()),
        }
    }

    /// Coefficient of the unordered pair `(a, b)`
    pub fn coefficient(&self, a: impl Into<Variable>, b: impl Into<Variable>) -> Option<f64> {
        self.coefficients.get(&canonical(a.into(), b.into())).copied()
    }

    /// Entries in canonical key order
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Variable, f64)> {
        self.coefficients.iter().map(|((a, b), v)| (a, b, *v))
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Every identifier appearing in any key
    pub fn variables(&self) -> BTreeSet<Variable> {
        self.coefficients
            .keys()
            .flat_map(|(a, b)| [a.clone(), b.clone()])
            .collect()
    }

    /// Energy of an assignment; extra assignment variables are ignored
    pub fn energy(&self, assignment: &Assignment) -> Result<f64> {
        let lookup = |var: &Variable| {
            assignment.get(var).ok_or_else(|| {
                PipelineError::UnknownVariable(format!(
                    "Assignment has no value for variable {}",
                    var
                ))
            })
        };

        let mut energy = 0.0;
        for ((a, b), coeff) in &self.coefficients {
            let (xa, xb) = (lookup(a)?, lookup(b)?);
            if xa && xb {
                energy += coeff;
            }
        }
        Ok(energy)
    }

    /// Sum of all coefficients
    pub fn coefficient_sum(&self) -> f64 {
        self.coefficients.values().sum()
    }

    /// `(sum of negative coefficients, sum of positive coefficients)`
    ///
    /// Every assignment's energy lies within these bounds.
    pub fn energy_bounds(&self) -> (f64, f64) {
        self.coefficients
            .values()
            .fold((0.0, 0.0), |(lo, hi), &v| {
                if v < 0.0 {
                    (lo + v, hi)
                } else {
                    (lo, hi + v)
                }
            })
    }

    /// Same keys, and every coefficient within `tolerance`
    pub fn approx_eq(&self, other: &QuboModel, tolerance: f64) -> bool {
        self.coefficients.len() == other.coefficients.len()
            && self
                .coefficients
                .iter()
                .zip(other.coefficients.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && (va - vb).abs() <= tolerance)
    }

    /// Apply `f` to every coefficient, keeping the key set
    pub(crate) fn map_coefficients(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            coefficients: self
                .coefficients
                .iter()
                .map(|(k, v)| (k.clone(), f(*v)))
                .collect(),
        }
    }

    /// Encode in the interchange format
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&RawQubo::from(self.clone()))?)
    }

    /// Decode from the interchange format, applying construction validation
    ///
    /// Text that is not JSON is a serialization error; well-formed JSON of the
    /// wrong shape is an invalid QUBO.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// Write the model to `path`, creating the parent directory if needed
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a model from `path`
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl From<QuboModel> for RawQubo {
    fn from(model: QuboModel) -> Self {
        RawQubo(
            model
                .coefficients
                .into_iter()
                .map(|((a, b), v)| (vec![a, b], v))
                .collect(),
        )
    }
}

impl TryFrom<serde_json::Value> for QuboModel {
    type Error = PipelineError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        let rows = value.as_array().ok_or_else(|| {
            invalid("QUBO must be a JSON array of [[i, j], value] entries".to_string())
        })?;

        let mut entries = Vec::with_capacity(rows.len());
        for (row, entry) in rows.iter().enumerate() {
            let (key, coeff) = match entry.as_array().map(Vec::as_slice) {
                Some([key, coeff]) => (key, coeff),
                _ => return Err(invalid(format!("Entry {} is not a [key, value] pair", row))),
            };
            let ids = key
                .as_array()
                .ok_or_else(|| invalid(format!("Entry {}: key {} is not an array", row, key)))?
                .iter()
                .map(|id| variable_from_json(row, id))
                .collect::<Result<Vec<_>>>()?;
            let coeff = coeff.as_f64().ok_or_else(|| {
                invalid(format!("Entry {}: coefficient {} is not a number", row, coeff))
            })?;
            entries.push((ids, coeff));
        }

        QuboModel::from_entries(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversed_pairs_merge() {
        let model = QuboModel::new([((1, 2), 0.5), ((2, 1), 0.25)]).unwrap();
        assert_eq!(model.len(), 1);
        assert_eq!(model.coefficient(2, 1), Some(0.75));
    }

    #[test]
    fn test_overflowing_merge_rejected() {
        let result = QuboModel::new([((1, 2), f64::MAX), ((2, 1), f64::MAX)]);
        assert!(matches!(result, Err(PipelineError::InvalidQubo(_))));
    }

    #[test]
    fn test_energy_bounds() {
        let model = QuboModel::new([((1, 1), -0.1), ((1, 2), 0.05), ((2, 2), -0.2)]).unwrap();
        let (lo, hi) = model.energy_bounds();
        assert!((lo + 0.3).abs() < 1e-12);
        assert!((hi - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_variable_display_and_order() {
        assert_eq!(Variable::from(3).to_string(), "3");
        assert_eq!(Variable::from("Position_1").to_string(), "Position_1");
        assert!(Variable::from(100) < Variable::from("a"));
    }

    #[test]
    fn test_from_bits_rejects_non_binary() {
        assert!(Assignment::from_bits([(1, 2u8)]).is_err());
        let assignment = Assignment::from_bits([(1, 1u8), (2, 0u8)]).unwrap();
        assert_eq!(assignment.get(&Variable::from(1)), Some(true));
        assert_eq!(assignment.get(&Variable::from(2)), Some(false));
    }
}
