//! Output-space mechanisms over actuator-space hardware.
//!
//! Hardware is reached only through [`Motor`] and [`Encoder`], both in
//! motor shaft units. A mechanism owns one of each and converts to the units
//! of what it moves: meters for a wheel or belt, radians at the output of a
//! gearbox for a turret or steering shaft.

mod linear;
#[cfg(test)]
pub(crate) mod mock;
mod rotary;

pub use linear::SimpleLinearMechanism;
pub use rotary::{SimpleRotaryMechanism, TurretMechanism};

use uom::si::f64::{
    Acceleration, Angle, AngularAcceleration, AngularVelocity, Force, Length, Ratio, Torque,
    Velocity,
};

/// A motor with an outboard controller, commanded in shaft units.
pub trait Motor {
    fn set_duty_cycle(&mut self, output: Ratio);

    fn set_velocity(
        &mut self,
        velocity: AngularVelocity,
        acceleration: AngularAcceleration,
        torque: Torque,
    );

    fn set_position(&mut self, position: Angle, velocity: AngularVelocity, torque: Torque);

    fn stop(&mut self);

    fn close(&mut self);
}

/// Shaft feedback. `None` means the sensor cannot report right now; callers
/// skip the dependent update rather than substitute a value.
pub trait Encoder {
    fn velocity(&mut self) -> Option<AngularVelocity>;

    fn position(&mut self) -> Option<Angle>;

    fn reset(&mut self);

    fn close(&mut self);
}

/// A mechanism whose output moves along a line.
pub trait LinearMechanism {
    fn set_duty_cycle(&mut self, output: Ratio);

    fn set_velocity(&mut self, velocity: Velocity, acceleration: Acceleration, force: Force);

    fn set_position(&mut self, position: Length, velocity: Velocity, force: Force);

    fn velocity(&mut self) -> Option<Velocity>;

    fn position(&mut self) -> Option<Length>;

    /// Nearest reachable position.
    fn limit_position(&self, position: Length) -> Length {
        position
    }

    fn stop(&mut self);

    fn close(&mut self);

    fn reset_encoder_position(&mut self);
}

/// A mechanism whose output rotates.
pub trait RotaryMechanism {
    fn set_duty_cycle(&mut self, output: Ratio);

    fn set_velocity(
        &mut self,
        velocity: AngularVelocity,
        acceleration: AngularAcceleration,
        torque: Torque,
    );

    fn set_position(&mut self, position: Angle, velocity: AngularVelocity, torque: Torque);

    fn velocity(&mut self) -> Option<AngularVelocity>;

    fn position(&mut self) -> Option<Angle>;

    /// Nearest reachable position.
    fn limit_position(&self, position: Angle) -> Angle {
        position
    }

    fn stop(&mut self);

    fn close(&mut self);

    fn reset_encoder_position(&mut self);
}
