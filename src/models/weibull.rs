//! Two-parameter Weibull growth shape `f(t) = 1 - exp(-a * t^b)`.
//!
//! Used on normalized data (`t` and `f` both in `[0, 1]`). Parameters are
//! clamped to `a >= 0` and `b >= 0.7` before every evaluation, so the fitter
//! and the final regeneration see the same curve.

use nalgebra::DMatrix;

pub const MIN_SCALE: f64 = 0.0;
pub const MIN_SHAPE: f64 = 0.7;

/// Scale `a` and shape `b` of a fitted Weibull curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeibullParams {
    pub a: f64,
    pub b: f64,
}

impl WeibullParams {
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    /// Parameters with the lower bounds applied.
    pub fn clamped(self) -> Self {
        Self {
            a: self.a.max(MIN_SCALE),
            b: self.b.max(MIN_SHAPE),
        }
    }

    pub fn as_slice(&self) -> [f64; 2] {
        [self.a, self.b]
    }
}

pub fn weibull(t: f64, params: WeibullParams) -> f64 {
    let p = params.clamped();
    1.0 - (-p.a * t.powf(p.b)).exp()
}

/// Partial derivatives `(∂f/∂a, ∂f/∂b)` at `t`. Zero at `t <= 0`.
pub fn weibull_gradient(t: f64, params: WeibullParams) -> (f64, f64) {
    if t <= 0.0 {
        return (0.0, 0.0);
    }
    let p = params.clamped();
    let tb = t.powf(p.b);
    let e = (-p.a * tb).exp();
    (tb * e, p.a * tb * t.ln() * e)
}

/// Jacobian of `weibull(t_i)` with respect to `(a, b)`, one row per `t_i`.
pub fn weibull_jacobian(t: &[f64], params: WeibullParams) -> DMatrix<f64> {
    let mut jac = DMatrix::zeros(t.len(), 2);
    for (row, ti) in t.iter().enumerate() {
        let (da, db) = weibull_gradient(*ti, params);
        jac[(row, 0)] = da;
        jac[(row, 1)] = db;
    }
    jac
}
