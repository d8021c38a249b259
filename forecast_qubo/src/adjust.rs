//! Forecast-driven rescaling of a QUBO

use crate::qubo::QuboModel;

/// Multiply every coefficient of `model` by `factor`
///
/// The key set and variable set are unchanged and `model` is left untouched.
/// Zero and negative factors are accepted. A non-finite factor (or one that
/// overflows a coefficient) yields a model that fails
/// [`QuboModel::validate`], which solvers check on entry.
pub fn adjust(model: &QuboModel, factor: f64) -> QuboModel {
    model.map_coefficients(|coefficient| coefficient * factor)
}
