use uom::si::{
    angle::radian,
    angular_acceleration::radian_per_second_squared,
    angular_velocity::radian_per_second,
    f64::{Angle, AngularAcceleration, AngularVelocity, Ratio, Torque},
    torque::newton_meter,
};

use super::{Encoder, Motor, RotaryMechanism};
use crate::error::{finite, positive, ConfigError};

/// A motor and a gearbox. `gear_ratio` is motor turns per output turn.
#[derive(Debug)]
pub struct SimpleRotaryMechanism<M, E> {
    motor: M,
    encoder: E,
    gear_ratio: f64,
}

impl<M, E> SimpleRotaryMechanism<M, E>
where
    M: Motor,
    E: Encoder,
{
    pub fn new(motor: M, encoder: E, gear_ratio: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            motor,
            encoder,
            gear_ratio: positive("gear ratio", gear_ratio)?,
        })
    }

    pub fn gear_ratio(&self) -> f64 {
        self.gear_ratio
    }

    pub fn motor(&self) -> &M {
        &self.motor
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }
}

impl<M, E> RotaryMechanism for SimpleRotaryMechanism<M, E>
where
    M: Motor,
    E: Encoder,
{
    fn set_duty_cycle(&mut self, output: Ratio) {
        self.motor.set_duty_cycle(output);
    }

    fn set_velocity(
        &mut self,
        velocity: AngularVelocity,
        acceleration: AngularAcceleration,
        torque: Torque,
    ) {
        let g = self.gear_ratio;
        self.motor.set_velocity(
            AngularVelocity::new::<radian_per_second>(velocity.get::<radian_per_second>() * g),
            AngularAcceleration::new::<radian_per_second_squared>(
                acceleration.get::<radian_per_second_squared>() * g,
            ),
            Torque::new::<newton_meter>(torque.get::<newton_meter>() / g),
        );
    }

    fn set_position(&mut self, position: Angle, velocity: AngularVelocity, torque: Torque) {
        let g = self.gear_ratio;
        self.motor.set_position(
            Angle::new::<radian>(position.get::<radian>() * g),
            AngularVelocity::new::<radian_per_second>(velocity.get::<radian_per_second>() * g),
            Torque::new::<newton_meter>(torque.get::<newton_meter>() / g),
        );
    }

    fn velocity(&mut self) -> Option<AngularVelocity> {
        let velocity = self.encoder.velocity()?;
        Some(AngularVelocity::new::<radian_per_second>(
            velocity.get::<radian_per_second>() / self.gear_ratio,
        ))
    }

    fn position(&mut self) -> Option<Angle> {
        let position = self.encoder.position()?;
        Some(Angle::new::<radian>(
            position.get::<radian>() / self.gear_ratio,
        ))
    }

    fn stop(&mut self) {
        self.motor.stop();
    }

    fn close(&mut self) {
        self.motor.close();
        self.encoder.close();
    }

    fn reset_encoder_position(&mut self) {
        self.encoder.reset();
    }
}

/// A rotary mechanism confined to `[min, max]`, e.g. a turret with cabling
/// that must not wind up.
///
/// Position commands are clamped into range. Velocity commands that would
/// drive further past a limit are replaced by zero velocity.
#[derive(Debug)]
pub struct TurretMechanism<R> {
    inner: R,
    min: Angle,
    max: Angle,
}

impl<R: RotaryMechanism> TurretMechanism<R> {
    pub fn new(inner: R, min: Angle, max: Angle) -> Result<Self, ConfigError> {
        let lower = finite("min angle", min.get::<radian>())?;
        let upper = finite("max angle", max.get::<radian>())?;
        if lower >= upper {
            return Err(ConfigError::InvalidRange {
                min: lower,
                max: upper,
            });
        }
        Ok(Self { inner, min, max })
    }

    /// Half a turn either side of zero.
    pub fn half_turn(inner: R) -> Result<Self, ConfigError> {
        Self::new(
            inner,
            Angle::new::<radian>(-core::f64::consts::PI),
            Angle::new::<radian>(core::f64::consts::PI),
        )
    }

    pub fn range(&self) -> (Angle, Angle) {
        (self.min, self.max)
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    fn blocks(&mut self, velocity: AngularVelocity) -> bool {
        let v = velocity.get::<radian_per_second>();
        match self.inner.position() {
            Some(position) => {
                (position >= self.max && v > 0.0) || (position <= self.min && v < 0.0)
            }
            None => false,
        }
    }
}

impl<R: RotaryMechanism> RotaryMechanism for TurretMechanism<R> {
    fn set_duty_cycle(&mut self, output: Ratio) {
        self.inner.set_duty_cycle(output);
    }

    fn set_velocity(
        &mut self,
        velocity: AngularVelocity,
        acceleration: AngularAcceleration,
        torque: Torque,
    ) {
        if self.blocks(velocity) {
            self.inner.set_velocity(
                AngularVelocity::default(),
                AngularAcceleration::default(),
                torque,
            );
        } else {
            self.inner.set_velocity(velocity, acceleration, torque);
        }
    }

    fn set_position(&mut self, position: Angle, velocity: AngularVelocity, torque: Torque) {
        let limited = self.limit_position(position);
        if limited == position {
            self.inner.set_position(position, velocity, torque);
        } else {
            self.inner
                .set_position(limited, AngularVelocity::default(), torque);
        }
    }

    fn velocity(&mut self) -> Option<AngularVelocity> {
        self.inner.velocity()
    }

    fn position(&mut self) -> Option<Angle> {
        self.inner.position()
    }

    fn limit_position(&self, position: Angle) -> Angle {
        if position < self.min {
            self.min
        } else if position > self.max {
            self.max
        } else {
            position
        }
    }

    fn stop(&mut self) {
        self.inner.stop();
    }

    fn close(&mut self) {
        self.inner.close();
    }

    fn reset_encoder_position(&mut self) {
        self.inner.reset_encoder_position();
    }
}
