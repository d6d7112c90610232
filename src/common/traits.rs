//! Common traits defining interfaces for trajectory tracking

use crate::common::types::*;

/// Trait for feedback controllers that track a time-parameterized trajectory
pub trait TrajectoryTracker {
    /// Compute the chassis command that steers `current_pose` toward `desired_state`
    fn calculate_state(&mut self, current_pose: &Pose2D, desired_state: &TrajectoryState) -> ChassisSpeeds;

    /// Check if the most recent tracking error is within tolerance
    fn at_reference(&self) -> bool;
}
