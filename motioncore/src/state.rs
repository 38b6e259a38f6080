use serde::{Deserialize, Serialize};
use uom::si::{
    acceleration::meter_per_second_squared,
    angle::radian,
    angular_acceleration::radian_per_second_squared,
    angular_jerk::radian_per_second_cubed,
    angular_velocity::radian_per_second,
    f64::{
        Acceleration, Angle, AngularAcceleration, AngularJerk, AngularVelocity, Jerk, Length,
        Velocity,
    },
    jerk::meter_per_second_cubed,
    length::meter,
    velocity::meter_per_second,
};

/// Kinematic state of one axis, in the SI base units of that axis (m or rad).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    pub x: f64,
    pub v: f64,
    pub a: f64,
    #[serde(default)]
    pub j: f64,
}

impl MotionState {
    pub const fn new(x: f64, v: f64, a: f64, j: f64) -> Self {
        Self { x, v, a, j }
    }

    /// A state at rest at `x`.
    pub const fn at(x: f64) -> Self {
        Self::new(x, 0.0, 0.0, 0.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.v.is_finite() && self.a.is_finite() && self.j.is_finite()
    }

    /// Compares position, velocity and acceleration within `tolerance`.
    ///
    /// Jerk is left out: it is piecewise constant and jumps at every phase
    /// boundary, so it says nothing about whether two states coincide.
    pub fn near(&self, other: &Self, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.v - other.v).abs() <= tolerance
            && (self.a - other.a).abs() <= tolerance
    }

    /// Advances this state by `t` under constant jerk `j`.
    pub(crate) fn integrate(&self, j: f64, t: f64) -> Self {
        let tt = t * t;
        Self {
            x: self.x + self.v * t + self.a * tt / 2.0 + j * tt * t / 6.0,
            v: self.v + self.a * t + j * tt / 2.0,
            a: self.a + j * t,
            j,
        }
    }
}

/// Kinematic state of a linear axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LengthTarget {
    pub x: Length,
    pub v: Velocity,
    pub a: Acceleration,
    pub j: Jerk,
}

/// Kinematic state of a rotary axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AngleTarget {
    pub x: Angle,
    pub v: AngularVelocity,
    pub a: AngularAcceleration,
    pub j: AngularJerk,
}

impl From<LengthTarget> for MotionState {
    fn from(target: LengthTarget) -> Self {
        Self::new(
            target.x.get::<meter>(),
            target.v.get::<meter_per_second>(),
            target.a.get::<meter_per_second_squared>(),
            target.j.get::<meter_per_second_cubed>(),
        )
    }
}

impl From<MotionState> for LengthTarget {
    fn from(state: MotionState) -> Self {
        Self {
            x: Length::new::<meter>(state.x),
            v: Velocity::new::<meter_per_second>(state.v),
            a: Acceleration::new::<meter_per_second_squared>(state.a),
            j: Jerk::new::<meter_per_second_cubed>(state.j),
        }
    }
}

impl From<AngleTarget> for MotionState {
    fn from(target: AngleTarget) -> Self {
        Self::new(
            target.x.get::<radian>(),
            target.v.get::<radian_per_second>(),
            target.a.get::<radian_per_second_squared>(),
            target.j.get::<radian_per_second_cubed>(),
        )
    }
}

impl From<MotionState> for AngleTarget {
    fn from(state: MotionState) -> Self {
        Self {
            x: Angle::new::<radian>(state.x),
            v: AngularVelocity::new::<radian_per_second>(state.v),
            a: AngularAcceleration::new::<radian_per_second_squared>(state.a),
            j: AngularJerk::new::<radian_per_second_cubed>(state.j),
        }
    }
}
