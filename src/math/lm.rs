//! Bounded Levenberg–Marquardt least squares.
//!
//! Minimizes `½ Σ r_i(x)²` for small parameter vectors. The caller supplies the
//! residuals and their Jacobian; steps solve the damped normal equations
//!
//! ```text
//! (JᵀJ + λ·diag(|JᵀJ|ᵢᵢ + 1)) δ = -Jᵀr
//! ```
//!
//! and are projected back onto the box `[lower, upper]`. λ shrinks after an
//! accepted step and grows after a rejected one.

use nalgebra::{DMatrix, DVector};

#[derive(Debug, Clone, Copy)]
pub struct LmOptions {
    pub max_iterations: usize,
    pub initial_lambda: f64,
    pub lambda_up: f64,
    pub lambda_down: f64,
    pub gradient_tolerance: f64,
    pub step_tolerance: f64,
    pub objective_tolerance: f64,
    pub max_stagnation: usize,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            initial_lambda: 1e-2,
            lambda_up: 3.0,
            lambda_down: 0.35,
            gradient_tolerance: 1e-10,
            step_tolerance: 1e-10,
            objective_tolerance: 1e-14,
            max_stagnation: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Gradient,
    Step,
    Objective,
    Stagnation,
    MaxIterations,
}

#[derive(Debug, Clone)]
pub struct LmReport {
    pub x: Vec<f64>,
    pub objective: f64,
    pub iterations: usize,
    pub termination: Termination,
}

/// Box constraints, one `[lower, upper]` pair per parameter.
#[derive(Debug, Clone)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    pub fn clamp(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.lower.iter().zip(&self.upper))
            .map(|(v, (lo, hi))| v.clamp(*lo, *hi))
            .collect()
    }
}

fn objective(residuals: &[f64]) -> f64 {
    0.5 * residuals.iter().map(|r| r * r).sum::<f64>()
}

/// Run LM from `initial`.
///
/// `residual_fn` returns one residual per observation; `jacobian_fn` returns
/// the matching `m × n` Jacobian. Errors when the problem is malformed or the
/// objective is not finite at the start.
pub fn levenberg_marquardt<R, J>(
    initial: &[f64],
    bounds: &Bounds,
    options: LmOptions,
    residual_fn: R,
    jacobian_fn: J,
) -> Result<LmReport, String>
where
    R: Fn(&[f64]) -> Vec<f64>,
    J: Fn(&[f64]) -> DMatrix<f64>,
{
    if initial.len() != bounds.lower.len() || initial.len() != bounds.upper.len() {
        return Err("initial vector dimension does not match bounds".to_string());
    }

    let mut x = bounds.clamp(initial);
    let mut residuals = residual_fn(&x);
    if residuals.is_empty() {
        return Err("no residuals to fit".to_string());
    }
    let mut obj = objective(&residuals);
    if !obj.is_finite() {
        return Err("objective is not finite at the initial point".to_string());
    }

    let mut lambda = options.initial_lambda.max(1e-12);
    let mut stagnation = 0usize;
    let mut iterations = 0usize;
    let mut termination = Termination::MaxIterations;

    for iter in 0..options.max_iterations {
        iterations = iter + 1;

        let jacobian = jacobian_fn(&x);
        let jt = jacobian.transpose();
        let mut a = &jt * &jacobian;
        let g = &jt * DVector::from_column_slice(&residuals);

        let gradient_norm = g.norm();
        if !gradient_norm.is_finite() {
            return Err("gradient is not finite".to_string());
        }
        if gradient_norm <= options.gradient_tolerance {
            termination = Termination::Gradient;
            break;
        }

        for i in 0..a.nrows() {
            a[(i, i)] += lambda * (a[(i, i)].abs() + 1.0);
        }

        let Some(delta) = a.lu().solve(&(-g)) else {
            lambda = (lambda * options.lambda_up).min(1e12);
            stagnation += 1;
            if stagnation >= options.max_stagnation {
                termination = Termination::Stagnation;
                break;
            }
            continue;
        };

        if delta.norm() <= options.step_tolerance {
            termination = Termination::Step;
            break;
        }

        let stepped: Vec<f64> = x.iter().zip(delta.iter()).map(|(xi, di)| xi + di).collect();
        let candidate = bounds.clamp(&stepped);
        let candidate_residuals = residual_fn(&candidate);
        let candidate_obj = objective(&candidate_residuals);

        if candidate_obj.is_finite() && candidate_obj + 1e-16 < obj {
            let improvement = obj - candidate_obj;
            x = candidate;
            residuals = candidate_residuals;
            obj = candidate_obj;
            lambda = (lambda * options.lambda_down).max(1e-12);
            stagnation = 0;
            if improvement <= options.objective_tolerance {
                termination = Termination::Objective;
                break;
            }
        } else {
            lambda = (lambda * options.lambda_up).min(1e12);
            stagnation += 1;
            if stagnation >= options.max_stagnation {
                termination = Termination::Stagnation;
                break;
            }
        }
    }

    Ok(LmReport {
        x,
        objective: obj,
        iterations,
        termination,
    })
}
