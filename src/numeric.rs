//! Helpers for comparing floating point values, thin wrappers around methods from the approx
//! crate. Used by the trajectory summaries and by tests.

use approx::AbsDiffEq;

/// Default accuracy for `f64` comparisons
pub const ACC: f64 = 10e-11;

/// Compares if two floats are close via `approx::abs_diff_eq` using a maximum absolute difference
/// (epsilon) of `acc`.
#[must_use]
pub fn almost_eq(a: f64, b: f64, acc: f64) -> bool {
    if a.is_infinite() && b.is_infinite() {
        return a == b;
    }
    a.abs_diff_eq(&b, acc)
}

/// `|value - reference| / |reference|`, or the absolute difference when `reference` is zero.
#[must_use]
pub fn relative_difference(value: f64, reference: f64) -> f64 {
    let difference = (value - reference).abs();
    if reference == 0.0 {
        difference
    } else {
        difference / reference.abs()
    }
}
