//! Ordinary least squares solver.
//!
//! We solve small dense regression problems of the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T b)^2
//! ```
//!
//! Implementation choices:
//! - SVD handles tall design matrices directly (more rows than columns).
//! - Rank is checked explicitly. A pseudo-inverse would quietly return the
//!   minimum-norm solution for a singular design, which is meaningless for
//!   coefficient interpretation, so rank deficiency is reported instead.
//! - The same decomposition yields `(X^T X)^{-1} = V Σ^{-2} V^T` for standard
//!   errors without forming the normal equations.

use nalgebra::{DMatrix, DVector, SVD};

/// Why a least-squares problem could not be solved.
#[derive(Debug, Clone, PartialEq)]
pub enum LeastSquaresFailure {
    /// Fewer observations than unknowns.
    Underdetermined { rows: usize, cols: usize },
    /// Numerical rank below the column count.
    RankDeficient { rank: usize, cols: usize },
    /// SVD did not produce a usable solution.
    Numerical(String),
}

impl std::fmt::Display for LeastSquaresFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Underdetermined { rows, cols } => {
                write!(f, "underdetermined system: {rows} observations for {cols} coefficients")
            }
            Self::RankDeficient { rank, cols } => {
                write!(f, "design matrix is rank deficient (rank {rank} < {cols} columns)")
            }
            Self::Numerical(msg) => write!(f, "{msg}"),
        }
    }
}

/// Solution of a full-rank least-squares problem.
#[derive(Debug, Clone)]
pub struct LeastSquaresSolution {
    pub coefficients: DVector<f64>,
    pub residuals: DVector<f64>,
    /// Diagonal of `(X^T X)^{-1}`.
    pub inverse_gram_diagonal: DVector<f64>,
    pub rank: usize,
}

/// Solve a full-rank least squares problem using SVD.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<LeastSquaresSolution, LeastSquaresFailure> {
    let (rows, cols) = x.shape();
    if rows < cols {
        return Err(LeastSquaresFailure::Underdetermined { rows, cols });
    }
    if y.len() != rows {
        return Err(LeastSquaresFailure::Numerical(format!(
            "response length {} does not match {rows} design rows",
            y.len()
        )));
    }

    let svd = SVD::new(x.clone(), true, true);
    let max_sv = svd.singular_values.max();
    if !(max_sv.is_finite() && max_sv > 0.0) {
        return Err(LeastSquaresFailure::RankDeficient { rank: 0, cols });
    }

    // Same cutoff LAPACK's default rank estimate uses.
    let tol = max_sv * rows.max(cols) as f64 * f64::EPSILON;
    let rank = svd.rank(tol);
    if rank < cols {
        return Err(LeastSquaresFailure::RankDeficient { rank, cols });
    }

    let coefficients = svd
        .solve(y, tol)
        .map_err(|e| LeastSquaresFailure::Numerical(e.to_string()))?;
    if coefficients.iter().any(|v| !v.is_finite()) {
        return Err(LeastSquaresFailure::Numerical("non-finite coefficients".to_string()));
    }

    let residuals = y - x * &coefficients;

    let v_t = svd
        .v_t
        .as_ref()
        .ok_or_else(|| LeastSquaresFailure::Numerical("SVD did not compute V^T".to_string()))?;
    let mut inverse_gram_diagonal = DVector::<f64>::zeros(cols);
    for j in 0..cols {
        let mut acc = 0.0;
        for k in 0..svd.singular_values.len() {
            let s = svd.singular_values[k];
            acc += v_t[(k, j)] * v_t[(k, j)] / (s * s);
        }
        inverse_gram_diagonal[j] = acc;
    }

    Ok(LeastSquaresSolution {
        coefficients,
        residuals,
        inverse_gram_diagonal,
        rank,
    })
}
