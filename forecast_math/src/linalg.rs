//! Dense linear algebra for small regression problems
//!
//! The design matrices fitted here have a few dozen columns at most, so a
//! row-major `Vec<Vec<f64>>` and a plain Cholesky factorisation are enough.

use crate::{MathError, Result};

/// Solve the penalised least squares problem `(XᵀX + diag(penalty)) β = Xᵀy`.
///
/// `design` is row-major with one row per observation. `penalty` holds one
/// non-negative weight per column.
pub fn ridge_least_squares(design: &[Vec<f64>], target: &[f64], penalty: &[f64]) -> Result<Vec<f64>> {
    if design.is_empty() {
        return Err(MathError::InsufficientData(
            "Design matrix has no rows".to_string(),
        ));
    }
    if design.len() != target.len() {
        return Err(MathError::InvalidInput(format!(
            "Design matrix has {} rows but target has {} values",
            design.len(),
            target.len()
        )));
    }

    let p = penalty.len();
    if let Some(row) = design.iter().find(|row| row.len() != p) {
        return Err(MathError::InvalidInput(format!(
            "Design row has {} columns, expected {}",
            row.len(),
            p
        )));
    }
    if penalty.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(MathError::InvalidInput(
            "Penalty weights must be finite and non-negative".to_string(),
        ));
    }

    let mut gram = vec![vec![0.0; p]; p];
    let mut rhs = vec![0.0; p];

    for (row, &y) in design.iter().zip(target.iter()) {
        for i in 0..p {
            if row[i] == 0.0 {
                continue;
            }
            rhs[i] += row[i] * y;
            for j in i..p {
                gram[i][j] += row[i] * row[j];
            }
        }
    }

    for i in 0..p {
        gram[i][i] += penalty[i];
        for j in 0..i {
            gram[i][j] = gram[j][i];
        }
    }

    let factor = cholesky(&gram)?;
    Ok(cholesky_solve(&factor, &rhs))
}

/// Lower triangular Cholesky factor `L` of a symmetric positive definite matrix
pub fn cholesky(matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    let n = matrix.len();
    let mut lower = vec![vec![0.0; n]; n];

    for i in 0..n {
        if matrix[i].len() != n {
            return Err(MathError::InvalidInput("Matrix must be square".to_string()));
        }
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| lower[i][k] * lower[j][k]).sum();

            if i == j {
                let diag = matrix[i][i] - sum;
                if !diag.is_finite() || diag <= 1e-12 {
                    return Err(MathError::CalculationError(format!(
                        "Matrix is not positive definite (pivot {} = {:e})",
                        i, diag
                    )));
                }
                lower[i][j] = diag.sqrt();
            } else {
                lower[i][j] = (matrix[i][j] - sum) / lower[j][j];
            }
        }
    }

    Ok(lower)
}

/// Solve `L Lᵀ x = b` given the Cholesky factor `L`
pub fn cholesky_solve(lower: &[Vec<f64>], rhs: &[f64]) -> Vec<f64> {
    let n = lower.len();

    // Forward substitution: L z = b
    let mut z = vec![0.0; n];
    for i in 0..n {
        let sum: f64 = (0..i).map(|k| lower[i][k] * z[k]).sum();
        z[i] = (rhs[i] - sum) / lower[i][i];
    }

    // Back substitution: Lᵀ x = z
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|k| lower[k][i] * x[k]).sum();
        x[i] = (z[i] - sum) / lower[i][i];
    }

    x
}

/// Multiply a row-major matrix by a coefficient vector
pub fn mat_vec(design: &[Vec<f64>], coefficients: &[f64]) -> Vec<f64> {
    design
        .iter()
        .map(|row| row.iter().zip(coefficients).map(|(x, b)| x * b).sum())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_line_fit() {
        // y = 2 + 3x
        let design: Vec<Vec<f64>> = (0..5).map(|i| vec![1.0, i as f64]).collect();
        let target: Vec<f64> = (0..5).map(|i| 2.0 + 3.0 * i as f64).collect();

        let beta = ridge_least_squares(&design, &target, &[0.0, 0.0]).unwrap();
        assert_relative_eq!(beta[0], 2.0, epsilon = 1e-9);
        assert_relative_eq!(beta[1], 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_penalty_shrinks_coefficients() {
        let design: Vec<Vec<f64>> = (0..5).map(|i| vec![1.0, i as f64]).collect();
        let target: Vec<f64> = (0..5).map(|i| 3.0 * i as f64).collect();

        let free = ridge_least_squares(&design, &target, &[0.0, 0.0]).unwrap();
        let shrunk = ridge_least_squares(&design, &target, &[0.0, 100.0]).unwrap();
        assert!(shrunk[1].abs() < free[1].abs());
    }

    #[test]
    fn test_singular_system_is_rejected() {
        // Two identical columns and no penalty
        let design: Vec<Vec<f64>> = (0..4).map(|i| vec![i as f64, i as f64]).collect();
        let target = vec![0.0, 1.0, 2.0, 3.0];

        let result = ridge_least_squares(&design, &target, &[0.0, 0.0]);
        assert!(matches!(result, Err(MathError::CalculationError(_))));
    }

    #[test]
    fn test_shape_mismatch() {
        let design = vec![vec![1.0, 2.0]];
        assert!(ridge_least_squares(&design, &[1.0, 2.0], &[0.0, 0.0]).is_err());
        assert!(ridge_least_squares(&design, &[1.0], &[0.0]).is_err());
        assert!(ridge_least_squares(&[], &[], &[]).is_err());
    }

    #[test]
    fn test_mat_vec() {
        let design = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        assert_eq!(mat_vec(&design, &[1.0, 1.0]), vec![3.0, 7.0]);
    }
}
