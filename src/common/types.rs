//! Common types used throughout ltv_unicycle

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalize an angle to `(-PI, PI]`.
///
/// Angles already inside the range are returned untouched, so an exact
/// difference of two headings is never perturbed by the wrap arithmetic.
pub fn normalize_angle(angle: f64) -> f64 {
    if angle > -PI && angle <= PI {
        return angle;
    }
    PI - (PI - angle).rem_euclid(2.0 * PI)
}

/// 2D pose (position + orientation)
///
/// `yaw` is measured counter-clockwise from the global x axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, yaw: 0.0 }
    }

    /// Normalize yaw to (-pi, pi]
    pub fn normalize_yaw(&mut self) {
        self.yaw = normalize_angle(self.yaw);
    }

    /// Express this pose in the frame attached to `origin`.
    ///
    /// The global positional difference is rotated by `-origin.yaw`, so the
    /// result's `x` is the forward offset and `y` the lateral offset as seen
    /// from `origin`. The heading difference is normalized to (-pi, pi].
    pub fn relative_to(&self, origin: &Pose2D) -> Pose2D {
        let dx = self.x - origin.x;
        let dy = self.y - origin.y;
        let (sin, cos) = origin.yaw.sin_cos();
        Pose2D {
            x: dx * cos + dy * sin,
            y: -dx * sin + dy * cos,
            yaw: normalize_angle(self.yaw - origin.yaw),
        }
    }

    /// Apply a transform expressed in this pose's local frame.
    ///
    /// Inverse of [`Pose2D::relative_to`]: `origin.transform_by(&p.relative_to(&origin))`
    /// recovers `p` up to heading normalization.
    pub fn transform_by(&self, delta: &Pose2D) -> Pose2D {
        let (sin, cos) = self.yaw.sin_cos();
        Pose2D {
            x: self.x + delta.x * cos - delta.y * sin,
            y: self.y + delta.x * sin + delta.y * cos,
            yaw: normalize_angle(self.yaw + delta.yaw),
        }
    }
}

impl fmt::Display for Pose2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x: {:.3}, y: {:.3}, yaw: {:.3} rad)", self.x, self.y, self.yaw)
    }
}

/// Chassis velocity command for a unicycle / differential drive robot
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChassisSpeeds {
    pub v: f64,      // linear velocity [m/s]
    pub omega: f64,  // angular velocity [rad/s]
}

impl ChassisSpeeds {
    pub fn new(v: f64, omega: f64) -> Self {
        Self { v, omega }
    }
}

impl fmt::Display for ChassisSpeeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(v: {:.3} m/s, omega: {:.3} rad/s)", self.v, self.omega)
    }
}

/// One sample of a time-parameterized drivetrain trajectory
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrajectoryState {
    /// Time since the start of the trajectory [s]
    pub time: f64,
    /// Signed forward velocity [m/s]; negative when driving in reverse
    pub velocity: f64,
    /// Forward acceleration [m/s^2]
    pub acceleration: f64,
    /// Desired pose at `time`
    pub pose: Pose2D,
    /// Path curvature [rad/m]
    pub curvature: f64,
}

impl TrajectoryState {
    pub fn new(time: f64, velocity: f64, acceleration: f64, pose: Pose2D, curvature: f64) -> Self {
        Self { time, velocity, acceleration, pose, curvature }
    }

    /// Turn rate implied by following `curvature` at `velocity`
    pub fn angular_velocity(&self) -> f64 {
        self.velocity * self.curvature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_angle_range() {
        for &a in &[4.0, -4.0, 7.5, -7.5, 100.0, -100.0, 2.0 * PI, -2.0 * PI] {
            let n = normalize_angle(a);
            assert!(n > -PI && n <= PI, "{} -> {}", a, n);
            let turns = (a - n) / (2.0 * PI);
            assert!((turns - turns.round()).abs() < 1e-9);
        }
        assert_eq!(normalize_angle(PI), PI);
        assert_eq!(normalize_angle(-PI), PI);
        assert_eq!(normalize_angle(0.3), 0.3);
    }

    #[test]
    fn test_pose2d_normalize_yaw() {
        let mut pose = Pose2D::new(0.0, 0.0, 4.0);
        pose.normalize_yaw();
        assert!(pose.yaw > -PI && pose.yaw <= PI);
    }

    #[test]
    fn test_relative_to_rotates_into_local_frame() {
        let origin = Pose2D::new(1.0, 1.0, PI / 2.0);
        let target = Pose2D::new(1.0, 3.0, PI / 2.0);
        let e = target.relative_to(&origin);
        // two meters straight ahead of a robot facing +y
        assert!((e.x - 2.0).abs() < 1e-12);
        assert!(e.y.abs() < 1e-12);
        assert!(e.yaw.abs() < 1e-12);
    }

    #[test]
    fn test_relative_to_heading_wrap() {
        let current = Pose2D::new(0.0, 0.0, 179.0_f64.to_radians());
        let reference = Pose2D::new(0.0, 0.0, (-179.0_f64).to_radians());
        let e = reference.relative_to(&current);
        assert!((e.yaw.abs() - 2.0_f64.to_radians()).abs() < 1e-9);
        assert!((e.yaw - 2.0_f64.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn test_transform_by_inverts_relative_to() {
        let origin = Pose2D::new(-2.0, 0.5, 2.5);
        let p = Pose2D::new(3.0, -1.0, -2.8);
        let back = origin.transform_by(&p.relative_to(&origin));
        assert!((back.x - p.x).abs() < 1e-12);
        assert!((back.y - p.y).abs() < 1e-12);
        assert!(normalize_angle(back.yaw - p.yaw).abs() < 1e-12);
    }

    #[test]
    fn test_trajectory_state_angular_velocity() {
        let state = TrajectoryState::new(0.0, -2.0, 0.0, Pose2D::origin(), 0.5);
        assert_eq!(state.angular_velocity(), -1.0);
    }
}
