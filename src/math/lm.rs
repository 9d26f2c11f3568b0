//! Levenberg–Marquardt for two-equation nonlinear least squares.
//!
//! ```text
//! minimize ‖r(u)‖²,  r: R² → R²
//! ```
//!
//! The staffing problem only ever has two unknowns, so everything runs on stack
//! `Matrix2`/`Vector2` values. Notes:
//! - Damping uses Marquardt's diagonal scaling (`JᵀJ + λ·diag(JᵀJ)`), which
//!   makes the step invariant to the very different scales of the two residuals.
//! - Each trial step is capped at `max_step` in Euclidean length. Residuals
//!   built from exponentials can ask for enormous Gauss–Newton steps far from
//!   the solution; the cap keeps trial points finite.
//! - The gradient test is scale-free: it compares `|J_jᵀ r|` against
//!   `‖J_j‖ · ‖r‖` per column, so a Jacobian that fades away as the iterate
//!   runs off to infinity does not look like a stationary point.
//! - Iterates are kept inside `|u_i| <= max_abs_u`; leaving that box is an
//!   `Unbounded` failure.
//! - Only non-increasing steps are accepted, so the iteration is deterministic
//!   and monotone. Equal cost is allowed: near a non-zero minimum the cost
//!   rounds to a constant before the gradient test is met.

use nalgebra::{Matrix2, Vector2};

const INITIAL_DAMPING: f64 = 1e-3;
const MIN_DAMPING: f64 = 1e-12;
const MAX_DAMPING: f64 = 1e16;
const MIN_DIAG: f64 = 1e-300;

/// A square two-residual system with an analytic Jacobian.
pub trait ResidualSystem {
    fn residuals(&self, u: &Vector2<f64>) -> Vector2<f64>;
    fn jacobian(&self, u: &Vector2<f64>) -> Matrix2<f64>;
}

/// Iteration budget and tolerances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    pub max_iterations: usize,
    /// Converged once every residual is within this absolute bound.
    pub residual_tolerance: f64,
    /// Converged once every column satisfies `|J_jᵀ r| <= gradient_tolerance · ‖J_j‖ · ‖r‖`.
    pub gradient_tolerance: f64,
    /// Largest accepted step length.
    pub max_step: f64,
    /// Box `|u_i| <= max_abs_u` the iterate must stay in.
    pub max_abs_u: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            residual_tolerance: 1e-9,
            gradient_tolerance: 1e-10,
            max_step: 2.0,
            max_abs_u: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    ResidualTolerance,
    GradientTolerance,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    pub u: Vector2<f64>,
    pub residuals: Vector2<f64>,
    /// Sum of squared residuals at `u`.
    pub cost: f64,
    pub iterations: usize,
    pub termination: Termination,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolverFailure {
    /// Residuals are not finite at the given point.
    NonFinite { iterations: usize },
    /// No descent step exists even under maximal damping.
    Stalled { iterations: usize, cost: f64 },
    /// The iterate left the `max_abs_u` box: the objective only decreases toward infinity.
    Unbounded { iterations: usize, cost: f64 },
    MaxIterations { iterations: usize, cost: f64 },
}

impl std::fmt::Display for SolverFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFinite { iterations } => {
                write!(f, "non-finite residuals after {iterations} iterations")
            }
            Self::Stalled { iterations, cost } => {
                write!(f, "no descent direction after {iterations} iterations (objective {cost:.6e})")
            }
            Self::Unbounded { iterations, cost } => {
                write!(
                    f,
                    "iterate diverged after {iterations} iterations (objective {cost:.6e}); no finite minimizer"
                )
            }
            Self::MaxIterations { iterations, cost } => {
                write!(f, "did not converge within {iterations} iterations (objective {cost:.6e})")
            }
        }
    }
}

/// Minimize `‖r(u)‖²` starting from `start`.
pub fn levenberg_marquardt<S: ResidualSystem>(
    system: &S,
    start: Vector2<f64>,
    opts: &SolverOptions,
) -> Result<Solution, SolverFailure> {
    let mut u = start;
    let mut r = system.residuals(&u);
    if !r.iter().all(|v| v.is_finite()) || !u.iter().all(|v| v.is_finite()) {
        return Err(SolverFailure::NonFinite { iterations: 0 });
    }
    let mut cost = r.norm_squared();
    let mut lambda = INITIAL_DAMPING;

    for iter in 0..opts.max_iterations {
        let jac = system.jacobian(&u);
        if let Some(termination) = check_convergence(&r, &jac, opts) {
            return Ok(Solution {
                u,
                residuals: r,
                cost,
                iterations: iter,
                termination,
            });
        }

        let grad = jac.transpose() * r;
        let jtj = jac.transpose() * jac;
        let mut accepted = false;
        while lambda <= MAX_DAMPING {
            let mut damped = jtj;
            for i in 0..2 {
                damped[(i, i)] += lambda * jtj[(i, i)].max(MIN_DIAG);
            }
            let Some(step) = damped.lu().solve(&(-grad)) else {
                lambda *= 10.0;
                continue;
            };
            let step = cap_step(step, opts.max_step);

            let candidate = u + step;
            let r_new = system.residuals(&candidate);
            let cost_new = r_new.norm_squared();
            if cost_new.is_finite() && cost_new <= cost {
                u = candidate;
                r = r_new;
                cost = cost_new;
                lambda = (lambda * 0.1).max(MIN_DAMPING);
                accepted = true;
                break;
            }
            lambda *= 10.0;
        }

        if !accepted {
            return Err(SolverFailure::Stalled {
                iterations: iter + 1,
                cost,
            });
        }
        if u.amax() > opts.max_abs_u {
            return Err(SolverFailure::Unbounded {
                iterations: iter + 1,
                cost,
            });
        }
    }

    match check_convergence(&r, &system.jacobian(&u), opts) {
        Some(termination) => Ok(Solution {
            u,
            residuals: r,
            cost,
            iterations: opts.max_iterations,
            termination,
        }),
        None => Err(SolverFailure::MaxIterations {
            iterations: opts.max_iterations,
            cost,
        }),
    }
}

fn check_convergence(r: &Vector2<f64>, jac: &Matrix2<f64>, opts: &SolverOptions) -> Option<Termination> {
    if r.amax() <= opts.residual_tolerance {
        return Some(Termination::ResidualTolerance);
    }

    // Cosine between r and each Jacobian column. A column that is exactly zero
    // everywhere (the residuals ignore that unknown) carries no information.
    let r_norm = r.norm();
    let mut any_column = false;
    for j in 0..2 {
        let col = jac.column(j);
        let col_norm = col.norm();
        if !(col_norm.is_finite() && r_norm.is_finite()) {
            return None;
        }
        if col_norm == 0.0 {
            continue;
        }
        any_column = true;
        if col.dot(r).abs() > opts.gradient_tolerance * col_norm * r_norm {
            return None;
        }
    }
    any_column.then_some(Termination::GradientTolerance)
}

fn cap_step(step: Vector2<f64>, max_step: f64) -> Vector2<f64> {
    let len = step.norm();
    if len > max_step && len.is_finite() {
        step * (max_step / len)
    } else {
        step
    }
}
