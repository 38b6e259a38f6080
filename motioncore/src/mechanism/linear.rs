use uom::si::{
    acceleration::meter_per_second_squared,
    angle::radian,
    angular_acceleration::radian_per_second_squared,
    angular_velocity::radian_per_second,
    f64::{
        Acceleration, Angle, AngularAcceleration, AngularVelocity, Force, Length, Ratio, Torque,
        Velocity,
    },
    force::newton,
    length::meter,
    torque::newton_meter,
    velocity::meter_per_second,
};

use super::{Encoder, LinearMechanism, Motor};
use crate::error::{positive, ConfigError};

/// A motor, gears and a wheel producing linear output, e.g. a drive wheel or
/// a conveyor belt.
#[derive(Debug)]
pub struct SimpleLinearMechanism<M, E> {
    motor: M,
    encoder: E,
    gear_ratio: f64,
    wheel_radius: Length,
}

impl<M, E> SimpleLinearMechanism<M, E>
where
    M: Motor,
    E: Encoder,
{
    pub fn new(
        motor: M,
        encoder: E,
        gear_ratio: f64,
        wheel_diameter: Length,
    ) -> Result<Self, ConfigError> {
        let gear_ratio = positive("gear ratio", gear_ratio)?;
        let wheel_diameter = positive("wheel diameter", wheel_diameter.get::<meter>())?;
        Ok(Self {
            motor,
            encoder,
            gear_ratio,
            wheel_radius: Length::new::<meter>(wheel_diameter / 2.0),
        })
    }

    pub fn gear_ratio(&self) -> f64 {
        self.gear_ratio
    }

    pub fn wheel_radius(&self) -> Length {
        self.wheel_radius
    }

    pub fn motor(&self) -> &M {
        &self.motor
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Output meters (or m/s, m/s²) to shaft radians.
    #[inline]
    fn to_shaft(&self, output: f64) -> f64 {
        output / self.wheel_radius.get::<meter>() * self.gear_ratio
    }

    /// Shaft radians (or rad/s) to output meters.
    #[inline]
    fn to_output(&self, shaft: f64) -> f64 {
        shaft * self.wheel_radius.get::<meter>() / self.gear_ratio
    }

    #[inline]
    fn to_torque(&self, force: Force) -> Torque {
        Torque::new::<newton_meter>(
            force.get::<newton>() * self.wheel_radius.get::<meter>() / self.gear_ratio,
        )
    }
}

impl<M, E> LinearMechanism for SimpleLinearMechanism<M, E>
where
    M: Motor,
    E: Encoder,
{
    fn set_duty_cycle(&mut self, output: Ratio) {
        self.motor.set_duty_cycle(output);
    }

    fn set_velocity(&mut self, velocity: Velocity, acceleration: Acceleration, force: Force) {
        self.motor.set_velocity(
            AngularVelocity::new::<radian_per_second>(
                self.to_shaft(velocity.get::<meter_per_second>()),
            ),
            AngularAcceleration::new::<radian_per_second_squared>(
                self.to_shaft(acceleration.get::<meter_per_second_squared>()),
            ),
            self.to_torque(force),
        );
    }

    fn set_position(&mut self, position: Length, velocity: Velocity, force: Force) {
        self.motor.set_position(
            Angle::new::<radian>(self.to_shaft(position.get::<meter>())),
            AngularVelocity::new::<radian_per_second>(
                self.to_shaft(velocity.get::<meter_per_second>()),
            ),
            self.to_torque(force),
        );
    }

    fn velocity(&mut self) -> Option<Velocity> {
        let velocity = self.encoder.velocity()?;
        Some(Velocity::new::<meter_per_second>(
            self.to_output(velocity.get::<radian_per_second>()),
        ))
    }

    fn position(&mut self) -> Option<Length> {
        let position = self.encoder.position()?;
        Some(Length::new::<meter>(
            self.to_output(position.get::<radian>()),
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
