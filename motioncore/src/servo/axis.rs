use core::f64::consts::{PI, TAU};

use uom::si::{
    acceleration::meter_per_second_squared,
    angle::radian,
    angular_acceleration::radian_per_second_squared,
    angular_velocity::radian_per_second,
    f64::{
        Acceleration, Angle, AngularAcceleration, AngularVelocity, Force, Length, Torque, Velocity,
    },
    length::meter,
    velocity::meter_per_second,
};

use crate::{
    mechanism::{LinearMechanism, RotaryMechanism},
    state::{AngleTarget, LengthTarget, MotionState},
};

/// A mechanism seen by a servo: plain numbers in the SI base unit of the
/// axis (m or rad), no force feedforward.
pub trait ServoAxis {
    /// Kinematic state in the axis' own quantities.
    type Target: Copy + From<MotionState> + Into<MotionState>;

    fn set_position(&mut self, x: f64, v: f64);

    fn set_velocity(&mut self, v: f64, a: f64);

    fn position(&mut self) -> Option<f64>;

    fn velocity(&mut self) -> Option<f64>;

    /// Nearest reachable position.
    fn limit(&self, x: f64) -> f64 {
        x
    }

    /// Signed distance to travel from `from` to reach `to`.
    fn error(&self, from: f64, to: f64) -> f64 {
        to - from
    }

    fn stop(&mut self);

    fn close(&mut self);
}

#[derive(Debug)]
pub struct Linear<M> {
    mechanism: M,
}

impl<M: LinearMechanism> Linear<M> {
    pub fn new(mechanism: M) -> Self {
        Self { mechanism }
    }

    pub fn mechanism(&self) -> &M {
        &self.mechanism
    }

    pub fn mechanism_mut(&mut self) -> &mut M {
        &mut self.mechanism
    }
}

impl<M: LinearMechanism> ServoAxis for Linear<M> {
    type Target = LengthTarget;

    fn set_position(&mut self, x: f64, v: f64) {
        self.mechanism.set_position(
            Length::new::<meter>(x),
            Velocity::new::<meter_per_second>(v),
            Force::default(),
        );
    }

    fn set_velocity(&mut self, v: f64, a: f64) {
        self.mechanism.set_velocity(
            Velocity::new::<meter_per_second>(v),
            Acceleration::new::<meter_per_second_squared>(a),
            Force::default(),
        );
    }

    fn position(&mut self) -> Option<f64> {
        self.mechanism.position().map(|x| x.get::<meter>())
    }

    fn velocity(&mut self) -> Option<f64> {
        self.mechanism.velocity().map(|v| v.get::<meter_per_second>())
    }

    fn limit(&self, x: f64) -> f64 {
        self.mechanism
            .limit_position(Length::new::<meter>(x))
            .get::<meter>()
    }

    fn stop(&mut self) {
        self.mechanism.stop();
    }

    fn close(&mut self) {
        self.mechanism.close();
    }
}

#[derive(Debug)]
pub struct Rotary<M> {
    mechanism: M,
    continuous: bool,
}

impl<M: RotaryMechanism> Rotary<M> {
    pub fn new(mechanism: M) -> Self {
        Self {
            mechanism,
            continuous: false,
        }
    }

    /// An axis that turns without end, e.g. a steering shaft. Errors are
    /// taken the short way round.
    pub fn continuous(mechanism: M) -> Self {
        Self {
            mechanism,
            continuous: true,
        }
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    pub fn mechanism(&self) -> &M {
        &self.mechanism
    }

    pub fn mechanism_mut(&mut self) -> &mut M {
        &mut self.mechanism
    }
}

impl<M: RotaryMechanism> ServoAxis for Rotary<M> {
    type Target = AngleTarget;

    fn set_position(&mut self, x: f64, v: f64) {
        self.mechanism.set_position(
            Angle::new::<radian>(x),
            AngularVelocity::new::<radian_per_second>(v),
            Torque::default(),
        );
    }

    fn set_velocity(&mut self, v: f64, a: f64) {
        self.mechanism.set_velocity(
            AngularVelocity::new::<radian_per_second>(v),
            AngularAcceleration::new::<radian_per_second_squared>(a),
            Torque::default(),
        );
    }

    fn position(&mut self) -> Option<f64> {
        self.mechanism.position().map(|x| x.get::<radian>())
    }

    fn velocity(&mut self) -> Option<f64> {
        self.mechanism
            .velocity()
            .map(|v| v.get::<radian_per_second>())
    }

    fn limit(&self, x: f64) -> f64 {
        self.mechanism
            .limit_position(Angle::new::<radian>(x))
            .get::<radian>()
    }

    fn error(&self, from: f64, to: f64) -> f64 {
        if self.continuous {
            normalize_angle(to - from)
        } else {
            to - from
        }
    }

    fn stop(&mut self) {
        self.mechanism.stop();
    }

    fn close(&mut self) {
        self.mechanism.close();
    }
}

// normalize angle to [-pi, pi].
pub(crate) fn normalize_angle(angle: f64) -> f64 {
    let raw_angle = angle.rem_euclid(TAU);
    if raw_angle > PI {
        raw_angle - TAU
    } else {
        raw_angle
    }
}
