// Path Tracking algorithms module

pub mod ltv_unicycle;

pub use ltv_unicycle::*;
