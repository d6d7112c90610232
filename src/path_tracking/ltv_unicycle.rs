//! Linear time-varying unicycle controller
//!
//! Trajectory tracking for a differential drive robot. The control law has
//! the form of an LQR, but the model behind the gain is the unicycle error
//! dynamics linearized around the reference velocity, so the gain is looked
//! up from a velocity-indexed [`GainSchedule`] every cycle.
//!
//! Reference: "Controls Engineering in FRC", section 8.9.

use std::path::Path;

use nalgebra::{Matrix2x3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::common::{ChassisSpeeds, ControlResult, Pose2D, TrajectoryState, TrajectoryTracker};
use crate::control::gain_schedule::{GainSchedule, DEFAULT_MAX_VELOCITY, DEFAULT_SAMPLES};

/// Configuration for the LTV unicycle controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LtvUnicycleConfig {
    /// Maximum tolerable forward, lateral [m] and heading [rad] error
    pub q_elems: [f64; 3],
    /// Maximum tolerable linear [m/s] and angular [rad/s] correction
    pub r_elems: [f64; 2],
    /// Discretization timestep [s]
    pub dt: f64,
    /// Fastest speed covered by the gain table [m/s]
    pub max_velocity: f64,
    /// Number of velocities in the gain table
    pub samples: usize,
}

impl Default for LtvUnicycleConfig {
    fn default() -> Self {
        Self {
            q_elems: [0.0625, 0.125, 2.0],
            r_elems: [1.0, 2.0],
            dt: 0.02,
            max_velocity: DEFAULT_MAX_VELOCITY,
            samples: DEFAULT_SAMPLES,
        }
    }
}

impl LtvUnicycleConfig {
    /// Parse a TOML document; missing keys take their default values
    pub fn from_toml_str(s: &str) -> ControlResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> ControlResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        debug!("loading LTV unicycle config from {}", path.as_ref().display());
        Self::from_toml_str(&text)
    }
}

/// Gain for reverse driving from the gain tabulated at `|v|`.
///
/// Negating `v` is the same as negating heading error and turn rate, so
/// `K(-v) = diag(1, -1) K(|v|) diag(1, 1, -1)`.
fn mirror_for_reverse(k: Matrix2x3<f64>) -> Matrix2x3<f64> {
    let mut k = k;
    k[(0, 2)] = -k[(0, 2)];
    k[(1, 0)] = -k[(1, 0)];
    k[(1, 1)] = -k[(1, 1)];
    k
}

/// LTV unicycle trajectory tracking controller
pub struct LtvUnicycleController {
    schedule: GainSchedule,
    pose_error: Option<Pose2D>,
    pose_tolerance: Pose2D,
    enabled: bool,
}

impl LtvUnicycleController {
    /// Create a controller covering speeds up to the default maximum.
    ///
    /// * `q_elems` - maximum desired error tolerance for each state
    /// * `r_elems` - maximum desired control effort for each input
    /// * `dt` - discretization timestep [s]
    pub fn new(q_elems: [f64; 3], r_elems: [f64; 2], dt: f64) -> ControlResult<Self> {
        Self::with_max_velocity(q_elems, r_elems, dt, DEFAULT_MAX_VELOCITY)
    }

    /// Create a controller whose gain table spans `(0, max_velocity]`
    pub fn with_max_velocity(
        q_elems: [f64; 3],
        r_elems: [f64; 2],
        dt: f64,
        max_velocity: f64,
    ) -> ControlResult<Self> {
        Self::from_config(&LtvUnicycleConfig {
            q_elems,
            r_elems,
            dt,
            max_velocity,
            ..LtvUnicycleConfig::default()
        })
    }

    /// Create from a full configuration
    pub fn from_config(config: &LtvUnicycleConfig) -> ControlResult<Self> {
        let schedule = GainSchedule::new(
            &config.q_elems,
            &config.r_elems,
            config.dt,
            config.max_velocity,
            config.samples,
        )?;

        Ok(LtvUnicycleController {
            schedule,
            pose_error: None,
            pose_tolerance: Pose2D::origin(),
            enabled: true,
        })
    }

    /// Create with default configuration
    pub fn with_defaults() -> ControlResult<Self> {
        Self::from_config(&LtvUnicycleConfig::default())
    }

    /// Linear and angular velocity command for tracking `pose_ref`.
    ///
    /// The reference pose and velocities should come from a drivetrain
    /// trajectory. The pose error is recorded even while disabled.
    pub fn calculate(
        &mut self,
        current_pose: &Pose2D,
        pose_ref: &Pose2D,
        linear_velocity_ref: f64,
        angular_velocity_ref: f64,
    ) -> ChassisSpeeds {
        let error = pose_ref.relative_to(current_pose);
        self.pose_error = Some(error);

        if !self.enabled {
            return ChassisSpeeds::new(linear_velocity_ref, angular_velocity_ref);
        }

        let mut k = self.schedule.gain_at(linear_velocity_ref);
        if linear_velocity_ref < 0.0 {
            k = mirror_for_reverse(k);
        }
        let u = k * Vector3::new(error.x, error.y, error.yaw);

        trace!(
            error_x = error.x,
            error_y = error.y,
            error_yaw = error.yaw,
            dv = u[0],
            domega = u[1],
            "ltv unicycle correction"
        );

        ChassisSpeeds::new(linear_velocity_ref + u[0], angular_velocity_ref + u[1])
    }

    /// Most recent pose error, expressed in the robot frame
    pub fn pose_error(&self) -> Option<Pose2D> {
        self.pose_error
    }

    /// True if the last pose error is within tolerance (bounds inclusive).
    ///
    /// Always false before the first call to `calculate`.
    pub fn at_reference(&self) -> bool {
        match self.pose_error {
            Some(e) => {
                let tol = &self.pose_tolerance;
                e.x.abs() <= tol.x.abs()
                    && e.y.abs() <= tol.y.abs()
                    && e.yaw.abs() <= tol.yaw.abs()
            }
            None => false,
        }
    }

    /// Set the pose error considered tolerable by `at_reference`
    pub fn set_tolerance(&mut self, pose_tolerance: Pose2D) {
        self.pose_tolerance = pose_tolerance;
    }

    pub fn tolerance(&self) -> Pose2D {
        self.pose_tolerance
    }

    /// Enable or disable feedback, for troubleshooting.
    ///
    /// While disabled `calculate` passes the reference velocities through.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn schedule(&self) -> &GainSchedule {
        &self.schedule
    }
}

impl TrajectoryTracker for LtvUnicycleController {
    fn calculate_state(&mut self, current_pose: &Pose2D, desired_state: &TrajectoryState) -> ChassisSpeeds {
        self.calculate(
            current_pose,
            &desired_state.pose,
            desired_state.velocity,
            desired_state.angular_velocity(),
        )
    }

    fn at_reference(&self) -> bool {
        LtvUnicycleController::at_reference(self)
    }
}
