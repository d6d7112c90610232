//! Discrete LQR building blocks for the unicycle error model
//!
//! All matrices are fixed-size nalgebra types: three error states
//! (forward, lateral, heading) and two inputs (linear and angular velocity).

use nalgebra::{Matrix2, Matrix2x3, Matrix3, Matrix3x2, SMatrix};
use crate::common::{ControlResult, ControllerError};

/// Iteration cap for the doubling algorithm. It converges quadratically,
/// so hitting this means the problem is not stabilizable.
const DARE_MAX_ITER: usize = 64;
/// Relative change in the Riccati iterate that counts as converged
const DARE_TOLERANCE: f64 = 1e-10;

/// Diagonal cost matrix from per-element maximum tolerances (Bryson's rule).
///
/// Each diagonal entry is `1 / tol^2`; an infinite tolerance yields zero cost.
pub fn make_cost_matrix<const N: usize>(tolerances: &[f64; N]) -> SMatrix<f64, N, N> {
    SMatrix::<f64, N, N>::from_fn(|i, j| {
        if i != j || tolerances[i].is_infinite() {
            0.0
        } else {
            1.0 / (tolerances[i] * tolerances[i])
        }
    })
}

/// Unicycle error dynamics linearized at forward velocity `v`.
///
/// Heading error feeds lateral error proportionally to `v`; that is the
/// only nonzero entry.
pub fn linearized_model(velocity: f64) -> (Matrix3<f64>, Matrix3x2<f64>) {
    let mut a = Matrix3::zeros();
    a[(1, 2)] = velocity;

    let b = Matrix3x2::new(
        1.0, 0.0,
        0.0, 0.0,
        0.0, 1.0,
    );

    (a, b)
}

/// Zero-order-hold discretization of a continuous model.
///
/// Takes the matrix exponential of the block matrix `[[A, B], [0, 0]] * dt`;
/// its upper blocks are `Ad` and `Bd`.
pub fn discretize_ab(a: &Matrix3<f64>, b: &Matrix3x2<f64>, dt: f64) -> (Matrix3<f64>, Matrix3x2<f64>) {
    let mut m = SMatrix::<f64, 5, 5>::zeros();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(&(a * dt));
    m.fixed_view_mut::<3, 2>(0, 3).copy_from(&(b * dt));

    let phi = m.exp();
    (
        phi.fixed_view::<3, 3>(0, 0).into_owned(),
        phi.fixed_view::<3, 2>(0, 3).into_owned(),
    )
}

/// Solve the Discrete Algebraic Riccati Equation
///
/// `A^T S A - A^T S B (B^T S B + R)^-1 B^T S A + Q = S`
///
/// using the structure-preserving doubling algorithm.
pub fn solve_dare(
    a: &Matrix3<f64>,
    b: &Matrix3x2<f64>,
    q: &Matrix3<f64>,
    r: &Matrix2<f64>,
) -> ControlResult<Matrix3<f64>> {
    let r_inv = r.try_inverse().ok_or_else(|| {
        ControllerError::NumericalError("input cost matrix R is singular".to_string())
    })?;

    let mut a_k = *a;
    let mut g_k = b * r_inv * b.transpose();
    let mut h_k = *q;

    for iteration in 0..DARE_MAX_ITER {
        let w = Matrix3::identity() + g_k * h_k;
        let lu = w.lu();
        let singular = || {
            ControllerError::NumericalError(format!(
                "singular doubling step at iteration {}",
                iteration
            ))
        };
        let v1 = lu.solve(&a_k).ok_or_else(singular)?;
        let v2 = lu.solve(&g_k).ok_or_else(singular)?;

        let g_next = g_k + a_k * v2 * a_k.transpose();
        let h_next = h_k + a_k.transpose() * h_k * v1;
        a_k *= v1;

        if h_next.iter().any(|x| !x.is_finite()) {
            return Err(ControllerError::NumericalError(format!(
                "Riccati iterate diverged at iteration {}",
                iteration
            )));
        }

        let converged = (h_next - h_k).norm() <= DARE_TOLERANCE * h_next.norm();
        g_k = g_next;
        h_k = h_next;

        if converged {
            return Ok((h_k + h_k.transpose()) * 0.5);
        }
    }

    Err(ControllerError::NumericalError(format!(
        "Riccati solve did not converge in {} iterations",
        DARE_MAX_ITER
    )))
}

/// Compute the discrete LQR gain `K = (B^T S B + R)^-1 B^T S A`
pub fn dlqr(
    a: &Matrix3<f64>,
    b: &Matrix3x2<f64>,
    q: &Matrix3<f64>,
    r: &Matrix2<f64>,
) -> ControlResult<Matrix2x3<f64>> {
    let s = solve_dare(a, b, q, r)?;
    let bt_s = b.transpose() * s;
    (bt_s * b + r).lu().solve(&(bt_s * a)).ok_or_else(|| {
        ControllerError::NumericalError("B^T S B + R is singular".to_string())
    })
}
