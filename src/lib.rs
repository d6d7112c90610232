//! ltv_unicycle - linear time-varying trajectory tracking for unicycles
//!
//! A gain-scheduled LQR feedback law for differential drive robots: the
//! optimal gain is solved offline for a range of forward velocities and
//! interpolated every control cycle.

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod control;
pub mod path_tracking;

// Re-export common types for convenience
pub use common::{Pose2D, ChassisSpeeds, TrajectoryState, normalize_angle};
pub use common::TrajectoryTracker;
pub use common::{ControllerError, ControlResult};
pub use control::GainSchedule;
pub use path_tracking::{LtvUnicycleController, LtvUnicycleConfig};
