//! Jerk-limited motion profiles and the servo / mechanism layer that follows
//! them.
//!
//! Data flows `generator` -> `profile` -> `servo` -> `mechanism` -> hardware;
//! feedback flows back through `Option` readings so that a missing sample
//! skips a cycle instead of commanding from a stale value.

pub mod config;
pub mod error;
pub mod generator;
pub mod mechanism;
pub mod profile;
pub mod sequencer;
pub mod servo;
pub mod state;
pub mod telemetry;
pub mod timer;

pub use error::ConfigError;
pub use generator::{Limits, ProfileGenerator};
pub use profile::MotionProfile;
pub use state::{AngleTarget, LengthTarget, MotionState};
