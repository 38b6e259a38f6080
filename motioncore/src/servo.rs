//! Profile-following servos over mechanisms.

mod axis;
mod position;
mod velocity;

pub use axis::{Linear, Rotary, ServoAxis};
pub(crate) use axis::normalize_angle;
pub use position::PositionServo;
pub use velocity::VelocityServo;
