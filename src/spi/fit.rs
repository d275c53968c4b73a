//! Maximum-likelihood gamma fit with the location fixed at zero.

use crate::spi::error::FitError;
use ordered_float::OrderedFloat;
use statrs::distribution::{ContinuousCDF, Gamma};
use statrs::function::gamma::digamma;
use std::collections::BTreeSet;

const MAX_ITERATIONS: usize = 100;
const TOLERANCE: f64 = 1e-10;
/// Below this coefficient of variation the sample carries no usable spread.
const MIN_VARIATION: f64 = 1e-6;
/// Past this shape the gamma CDF is no longer evaluated reliably.
const MAX_SHAPE: f64 = 1e6;

/// A two-parameter gamma distribution fitted to a precipitation series, mixed with a
/// point mass at zero for the share of exactly-zero sums.
///
/// The cumulative probability is `H(x) = q + (1 - q) * G(x)` where `q` is the fraction of
/// zeros in the fitted sample and `G` the gamma CDF. A sample without zeros has `q = 0`.
#[derive(Debug, Clone)]
pub struct GammaFit {
    shape: f64,
    scale: f64,
    zero_probability: f64,
    distribution: Gamma,
}

impl GammaFit {
    /// Fits shape and scale by maximum likelihood over the strictly positive values.
    ///
    /// With `A = ln(mean) - mean(ln x)`, the shape solves `ln k - digamma(k) = A`. The
    /// search starts from Thom's approximation and refines it with Newton steps; the
    /// scale is then `mean / k`. `A` is evaluated as `-mean(ln_1p(x / mean - 1))` so it
    /// keeps its digits when the values are close together.
    ///
    /// # Errors
    ///
    /// * [`FitError::Empty`] for an empty slice.
    /// * [`FitError::NonFinite`] / [`FitError::Negative`] for values a precipitation sum cannot take.
    /// * [`FitError::Degenerate`] when fewer than two distinct positive values remain
    ///   (this covers all-zero and constant series).
    /// * [`FitError::IllConditioned`] when the values are so close together that the shape
    ///   cannot be estimated or would exceed what the CDF can resolve.
    pub fn fit(values: &[f64]) -> Result<Self, FitError> {
        if values.is_empty() {
            return Err(FitError::Empty);
        }
        if let Some(&bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(FitError::NonFinite(bad));
        }
        if let Some(&bad) = values.iter().find(|v| **v < 0.0) {
            return Err(FitError::Negative(bad));
        }

        let positive: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
        let distinct = positive
            .iter()
            .map(|v| OrderedFloat(*v))
            .collect::<BTreeSet<_>>()
            .len();
        if distinct < 2 {
            return Err(FitError::Degenerate {
                distinct,
                len: values.len(),
            });
        }

        let n = positive.len() as f64;
        let mean = positive.iter().sum::<f64>() / n;
        let variation = (positive.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt() / mean;
        let a = -positive.iter().map(|v| (v / mean - 1.0).ln_1p()).sum::<f64>() / n;
        if !(variation >= MIN_VARIATION && a.is_finite() && a > 0.0) {
            return Err(FitError::IllConditioned { variation });
        }

        let shape = solve_shape(a);
        if !(shape.is_finite() && shape <= MAX_SHAPE) {
            return Err(FitError::IllConditioned { variation });
        }
        let scale = mean / shape;
        let distribution =
            Gamma::new(shape, 1.0 / scale).map_err(|e| FitError::Distribution(e.to_string()))?;

        Ok(Self {
            shape,
            scale,
            zero_probability: (values.len() - positive.len()) as f64 / values.len() as f64,
            distribution,
        })
    }

    pub fn shape(&self) -> f64 {
        self.shape
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Share of exactly-zero values in the fitted sample.
    pub fn zero_probability(&self) -> f64 {
        self.zero_probability
    }

    /// Mean of the gamma component, `shape * scale`.
    pub fn mean(&self) -> f64 {
        self.shape * self.scale
    }

    /// Cumulative probability of `x`, including the point mass at zero.
    pub fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return self.zero_probability;
        }
        self.zero_probability + (1.0 - self.zero_probability) * self.distribution.cdf(x)
    }
}

fn solve_shape(a: f64) -> f64 {
    let mut shape = (1.0 + (1.0 + 4.0 * a / 3.0).sqrt()) / (4.0 * a);
    for _ in 0..MAX_ITERATIONS {
        let objective = shape.ln() - digamma(shape) - a;
        let slope = 1.0 / shape - trigamma(shape);
        let mut next = shape - objective / slope;
        if next.is_nan() || next <= 0.0 {
            next = shape / 2.0;
        }
        let converged = ((next - shape) / shape).abs() < TOLERANCE;
        shape = next;
        if converged {
            break;
        }
    }
    shape
}

/// Trigamma function: recurrence up to x >= 10, then the asymptotic series.
fn trigamma(mut x: f64) -> f64 {
    let mut acc = 0.0;
    while x < 10.0 {
        acc += 1.0 / (x * x);
        x += 1.0;
    }
    let t = 1.0 / x;
    let t2 = t * t;
    acc + t + t2 / 2.0 + t * t2 * (1.0 / 6.0 - t2 * (1.0 / 30.0 - t2 * (1.0 / 42.0 - t2 / 30.0)))
}
