//! Control algorithms module
//!
//! Discrete LQR primitives and the velocity-indexed gain schedule built on them.

pub mod lqr;
pub mod gain_schedule;

pub use gain_schedule::GainSchedule;
