//! Velocity-indexed LQR gain schedule for the unicycle error model
//!
//! The linearized error dynamics depend on forward velocity, so the optimal
//! gain does too. Solving a Riccati equation every control cycle is too slow
//! for a tight loop; instead the gains are solved once for a set of sample
//! velocities and linearly interpolated at runtime.

use nalgebra::{Matrix2, Matrix2x3, Matrix3};
use tracing::{debug, warn};

use crate::common::{ControlResult, ControllerError};
use crate::control::lqr::{discretize_ab, dlqr, linearized_model, make_cost_matrix};

/// Smallest tabulated speed [m/s]. At zero the lateral error is
/// uncontrollable and the Riccati equation has no stabilizing solution.
pub const MIN_VELOCITY: f64 = 1e-3;
/// Default upper end of the table [m/s]
pub const DEFAULT_MAX_VELOCITY: f64 = 9.0;
/// Default number of tabulated velocities
pub const DEFAULT_SAMPLES: usize = 128;

/// Immutable table of `(velocity, K)` pairs with strictly increasing velocity.
/// Construction fails if the sampling cannot keep neighbours distinct.
#[derive(Debug, Clone)]
pub struct GainSchedule {
    velocities: Vec<f64>,
    gains: Vec<Matrix2x3<f64>>,
    dt: f64,
}

fn invalid(msg: String) -> ControllerError {
    warn!("rejecting gain schedule configuration: {}", msg);
    ControllerError::InvalidParameter(msg)
}

/// Sample velocities in `[MIN_VELOCITY, max_velocity]` with quadratic
/// spacing, so that samples crowd near zero where the gain changes fastest.
pub fn sample_velocities(max_velocity: f64, samples: usize) -> Vec<f64> {
    let span = max_velocity - MIN_VELOCITY;
    let last = (samples - 1) as f64;
    (0..samples)
        .map(|i| {
            let t = i as f64 / last;
            MIN_VELOCITY + span * t * t
        })
        .collect()
}

impl GainSchedule {
    /// Solve the gain table.
    ///
    /// * `q_elems` - maximum tolerable forward, lateral and heading error
    /// * `r_elems` - maximum tolerable linear and angular velocity effort
    /// * `dt` - discretization timestep [s], should match the control period
    /// * `max_velocity` - fastest tabulated speed [m/s]
    /// * `samples` - number of tabulated speeds
    pub fn new(
        q_elems: &[f64; 3],
        r_elems: &[f64; 2],
        dt: f64,
        max_velocity: f64,
        samples: usize,
    ) -> ControlResult<Self> {
        if let Some(q) = q_elems.iter().find(|q| q.is_nan() || **q <= 0.0) {
            return Err(invalid(format!("state tolerances must be positive, got {}", q)));
        }
        if let Some(r) = r_elems.iter().find(|r| !r.is_finite() || **r <= 0.0) {
            return Err(invalid(format!("input tolerances must be positive and finite, got {}", r)));
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(invalid(format!("dt must be positive and finite, got {}", dt)));
        }
        if !max_velocity.is_finite() || max_velocity <= MIN_VELOCITY {
            return Err(invalid(format!(
                "max velocity must be finite and above {} m/s, got {}",
                MIN_VELOCITY, max_velocity
            )));
        }
        if samples < 2 {
            return Err(invalid(format!("need at least 2 velocity samples, got {}", samples)));
        }

        let q: Matrix3<f64> = make_cost_matrix(q_elems);
        let r: Matrix2<f64> = make_cost_matrix(r_elems);

        let velocities = sample_velocities(max_velocity, samples);
        if velocities.windows(2).any(|w| w[1] <= w[0]) {
            return Err(invalid(format!(
                "{} samples do not resolve the span [{}, {}] m/s",
                samples, MIN_VELOCITY, max_velocity
            )));
        }

        let gains = velocities
            .iter()
            .map(|&v| {
                let (a, b) = linearized_model(v);
                let (ad, bd) = discretize_ab(&a, &b, dt);
                dlqr(&ad, &bd, &q, &r).map_err(|e| {
                    ControllerError::NumericalError(format!(
                        "no stabilizing gain at {:.4} m/s: {}",
                        v, e
                    ))
                })
            })
            .collect::<ControlResult<Vec<_>>>()?;

        debug!(
            samples,
            max_velocity,
            dt,
            "built LTV unicycle gain schedule"
        );

        Ok(GainSchedule { velocities, gains, dt })
    }

    /// Gain for a signed forward velocity.
    ///
    /// Uses `|velocity|`, clamps to the tabulated range and interpolates
    /// elementwise between the bracketing samples.
    pub fn gain_at(&self, velocity: f64) -> Matrix2x3<f64> {
        let speed = velocity.abs();
        let last = self.velocities.len() - 1;

        // also catches NaN
        if !(speed > self.velocities[0]) {
            return self.gains[0];
        }
        if speed >= self.velocities[last] {
            return self.gains[last];
        }

        let hi = self.velocities.partition_point(|&v| v <= speed);
        let lo = hi - 1;
        let t = (speed - self.velocities[lo]) / (self.velocities[hi] - self.velocities[lo]);
        self.gains[lo] + (self.gains[hi] - self.gains[lo]) * t
    }

    /// Tabulated velocities, strictly increasing
    pub fn velocities(&self) -> &[f64] {
        &self.velocities
    }

    /// Iterate over `(velocity, K)` pairs
    pub fn entries(&self) -> impl Iterator<Item = (f64, &Matrix2x3<f64>)> + '_ {
        self.velocities.iter().copied().zip(self.gains.iter())
    }

    pub fn len(&self) -> usize {
        self.velocities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.velocities.is_empty()
    }

    /// Discretization timestep the gains were solved for
    pub fn dt(&self) -> f64 {
        self.dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const Q: [f64; 3] = [0.0625, 0.125, 2.0];
    const R: [f64; 2] = [1.0, 2.0];

    fn schedule() -> GainSchedule {
        GainSchedule::new(&Q, &R, 0.02, DEFAULT_MAX_VELOCITY, DEFAULT_SAMPLES).unwrap()
    }

    #[test]
    fn test_sample_velocities_quadratic_spacing() {
        let v = sample_velocities(9.0, 64);
        assert_eq!(v.len(), 64);
        assert_eq!(v[0], MIN_VELOCITY);
        assert!((v[63] - 9.0).abs() < 1e-12);
        assert!(v.windows(2).all(|w| w[1] > w[0]));
        // denser near zero
        assert!(v[1] - v[0] < v[63] - v[62]);
    }

    #[test]
    fn test_schedule_shape() {
        let s = schedule();
        assert_eq!(s.len(), DEFAULT_SAMPLES);
        assert!(!s.is_empty());
        assert_eq!(s.dt(), 0.02);
        assert_eq!(s.entries().count(), DEFAULT_SAMPLES);
        assert!(s.velocities().windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_gain_at_clamps_to_boundary_samples() {
        let s = schedule();
        let (v_first, k_first) = s.entries().next().unwrap();
        let (v_last, k_last) = s.entries().last().unwrap();

        assert_eq!(s.gain_at(0.0), *k_first);
        assert_eq!(s.gain_at(v_first * 0.5), *k_first);
        assert_eq!(s.gain_at(f64::NAN), *k_first);
        assert_eq!(s.gain_at(v_last), *k_last);
        assert_eq!(s.gain_at(1e6), *k_last);
        assert_eq!(s.gain_at(-1e6), *k_last);
        assert_eq!(s.gain_at(f64::INFINITY), *k_last);
    }

    #[test]
    fn test_gain_at_sign_symmetry() {
        let s = schedule();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let v: f64 = rng.gen_range(0.0..12.0);
            assert_eq!(s.gain_at(v), s.gain_at(-v));
        }
    }

    #[test]
    fn test_gain_at_exact_on_samples() {
        let s = schedule();
        for (v, k) in s.entries() {
            assert_eq!(s.gain_at(v), *k);
        }
    }

    #[test]
    fn test_gain_at_interpolates_between_neighbours() {
        let s = schedule();
        let entries: Vec<_> = s.entries().collect();
        for pair in entries.windows(2).step_by(9) {
            let (v0, k0) = pair[0];
            let (v1, k1) = pair[1];

            let mid = s.gain_at(0.5 * (v0 + v1));
            assert!((mid - (k0 + k1) * 0.5).norm() < 1e-9);

            let quarter = s.gain_at(v0 + 0.25 * (v1 - v0));
            for i in 0..2 {
                for j in 0..3 {
                    let (lo, hi) = if k0[(i, j)] <= k1[(i, j)] {
                        (k0[(i, j)], k1[(i, j)])
                    } else {
                        (k1[(i, j)], k0[(i, j)])
                    };
                    assert!(quarter[(i, j)] >= lo - 1e-12 && quarter[(i, j)] <= hi + 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_heading_gain_grows_with_speed() {
        // heading error turns into lateral error at rate v, so the turn
        // command leans harder on heading error as speed rises
        let s = schedule();
        let slow = s.gain_at(0.5);
        let fast = s.gain_at(5.0);
        assert!(slow[(1, 1)] > 0.0 && fast[(1, 1)] > 0.0);
        assert!(slow[(1, 2)] > 0.0);
        assert!(fast[(1, 2)] > slow[(1, 2)]);
        // forward gain does not depend on velocity
        assert!((slow[(0, 0)] - fast[(0, 0)]).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_invalid_configuration() {
        let bad = |q: [f64; 3], r: [f64; 2], dt: f64, vmax: f64, n: usize| {
            matches!(
                GainSchedule::new(&q, &r, dt, vmax, n),
                Err(ControllerError::InvalidParameter(_))
            )
        };
        assert!(bad([0.0, 0.125, 2.0], R, 0.02, 9.0, 16));
        assert!(bad([0.0625, -0.125, 2.0], R, 0.02, 9.0, 16));
        assert!(bad([0.0625, 0.125, f64::NAN], R, 0.02, 9.0, 16));
        assert!(bad(Q, [1.0, 0.0], 0.02, 9.0, 16));
        assert!(bad(Q, [f64::INFINITY, 2.0], 0.02, 9.0, 16));
        assert!(bad(Q, R, 0.0, 9.0, 16));
        assert!(bad(Q, R, -0.02, 9.0, 16));
        assert!(bad(Q, R, f64::NAN, 9.0, 16));
        assert!(bad(Q, R, 0.02, MIN_VELOCITY, 16));
        assert!(bad(Q, R, 0.02, f64::INFINITY, 16));
        assert!(bad(Q, R, 0.02, 9.0, 1));
    }

    #[test]
    fn test_rejects_span_too_narrow_for_samples() {
        // two ULPs above the floor cannot hold 64 distinct samples
        let vmax = f64::from_bits(MIN_VELOCITY.to_bits() + 2);
        assert!(matches!(
            GainSchedule::new(&Q, &R, 0.02, vmax, 64),
            Err(ControllerError::InvalidParameter(_))
        ));
        // the two endpoints alone are distinct
        let s = GainSchedule::new(&Q, &R, 0.02, vmax, 2).unwrap();
        assert!(s.velocities().windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_infinite_state_tolerance_is_accepted() {
        let s = GainSchedule::new(&[f64::INFINITY, 0.125, 2.0], &R, 0.02, 4.0, 16).unwrap();
        // no cost on forward error means no forward correction
        assert!(s.gain_at(1.0)[(0, 0)].abs() < 1e-12);
    }
}
