//! Core abstractions shared by the controller and its callers
//!
//! - `traits`: the [`SpeedController`] seam used by the request layer

pub mod traits;

pub use traits::*;
