//! Common types, traits, and error definitions for ltv_unicycle
//!
//! Small value types shared by the gain schedule, the feedback law and
//! the simulation binary.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
