//! Simulated motor and encoder sharing one ideal shaft.
//!
//! The outboard controller is ideal: velocity commands take effect at once,
//! position commands put the shaft where it was told. Position integrates
//! from velocity between clock readings. The encoder can be made to drop out
//! to exercise the `None` paths of the core.

use std::{cell::RefCell, rc::Rc};

use motioncore::{
    mechanism::{Encoder, Motor},
    timer::Clock,
};
use typed_builder::TypedBuilder;
use uom::si::{
    angle::radian,
    angular_velocity::radian_per_second,
    f64::{Angle, AngularAcceleration, AngularVelocity, Ratio, Torque},
    ratio::ratio,
    time::second,
};

/// Last command written to a simulated motor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotorCommand {
    DutyCycle(Ratio),
    Velocity {
        velocity: AngularVelocity,
        acceleration: AngularAcceleration,
        torque: Torque,
    },
    Position {
        position: Angle,
        velocity: AngularVelocity,
        torque: Torque,
    },
    Stop,
}

#[derive(Debug, TypedBuilder)]
pub struct Shaft<C> {
    clock: C,
    /// Speed at full duty cycle.
    #[builder(default = AngularVelocity::new::<radian_per_second>(100.0))]
    free_speed: AngularVelocity,
    #[builder(default, setter(skip))]
    position: f64,
    #[builder(default, setter(skip))]
    velocity: f64,
    #[builder(default, setter(skip))]
    offset: f64,
    #[builder(default, setter(skip))]
    last: Option<f64>,
    #[builder(default, setter(skip))]
    command: Option<MotorCommand>,
    #[builder(default, setter(skip))]
    writes: usize,
    #[builder(default = true, setter(skip))]
    available: bool,
    #[builder(default, setter(skip))]
    motor_closed: bool,
    #[builder(default, setter(skip))]
    encoder_closed: bool,
}

impl<C: Clock> Shaft<C> {
    /// Splits the shaft into the two hardware halves and a handle for the
    /// test to inspect and disturb it.
    pub fn split(self) -> (SimulatedMotor<C>, SimulatedEncoder<C>, ShaftHandle<C>) {
        let shaft = Rc::new(RefCell::new(self));
        (
            SimulatedMotor {
                shaft: Rc::clone(&shaft),
            },
            SimulatedEncoder {
                shaft: Rc::clone(&shaft),
            },
            ShaftHandle { shaft },
        )
    }

    fn advance(&mut self) {
        let now = self.clock.now().get::<second>();
        if let Some(last) = self.last {
            self.position += self.velocity * (now - last);
        }
        self.last = Some(now);
    }

    fn apply(&mut self, command: MotorCommand) {
        self.advance();
        match command {
            MotorCommand::DutyCycle(duty) => {
                self.velocity = duty.get::<ratio>() * self.free_speed.get::<radian_per_second>();
            }
            MotorCommand::Velocity { velocity, .. } => {
                self.velocity = velocity.get::<radian_per_second>();
            }
            MotorCommand::Position {
                position, velocity, ..
            } => {
                self.position = position.get::<radian>() + self.offset;
                self.velocity = velocity.get::<radian_per_second>();
            }
            MotorCommand::Stop => self.velocity = 0.0,
        }
        self.command = Some(command);
        self.writes += 1;
    }
}

#[derive(Debug)]
pub struct SimulatedMotor<C> {
    shaft: Rc<RefCell<Shaft<C>>>,
}

impl<C: Clock> Motor for SimulatedMotor<C> {
    fn set_duty_cycle(&mut self, output: Ratio) {
        self.shaft
            .borrow_mut()
            .apply(MotorCommand::DutyCycle(output));
    }

    fn set_velocity(
        &mut self,
        velocity: AngularVelocity,
        acceleration: AngularAcceleration,
        torque: Torque,
    ) {
        self.shaft.borrow_mut().apply(MotorCommand::Velocity {
            velocity,
            acceleration,
            torque,
        });
    }

    fn set_position(&mut self, position: Angle, velocity: AngularVelocity, torque: Torque) {
        self.shaft.borrow_mut().apply(MotorCommand::Position {
            position,
            velocity,
            torque,
        });
    }

    fn stop(&mut self) {
        self.shaft.borrow_mut().apply(MotorCommand::Stop);
    }

    fn close(&mut self) {
        self.shaft.borrow_mut().motor_closed = true;
    }
}

#[derive(Debug)]
pub struct SimulatedEncoder<C> {
    shaft: Rc<RefCell<Shaft<C>>>,
}

impl<C: Clock> Encoder for SimulatedEncoder<C> {
    fn velocity(&mut self) -> Option<AngularVelocity> {
        let mut shaft = self.shaft.borrow_mut();
        shaft.advance();
        shaft
            .available
            .then(|| AngularVelocity::new::<radian_per_second>(shaft.velocity))
    }

    fn position(&mut self) -> Option<Angle> {
        let mut shaft = self.shaft.borrow_mut();
        shaft.advance();
        shaft
            .available
            .then(|| Angle::new::<radian>(shaft.position - shaft.offset))
    }

    fn reset(&mut self) {
        let mut shaft = self.shaft.borrow_mut();
        shaft.advance();
        shaft.offset = shaft.position;
    }

    fn close(&mut self) {
        self.shaft.borrow_mut().encoder_closed = true;
    }
}

/// Test-side view of a shaft.
#[derive(Debug, Clone)]
pub struct ShaftHandle<C> {
    shaft: Rc<RefCell<Shaft<C>>>,
}

impl<C: Clock> ShaftHandle<C> {
    /// True shaft angle, unaffected by encoder resets or dropout.
    pub fn position(&self) -> Angle {
        let mut shaft = self.shaft.borrow_mut();
        shaft.advance();
        Angle::new::<radian>(shaft.position)
    }

    pub fn velocity(&self) -> AngularVelocity {
        AngularVelocity::new::<radian_per_second>(self.shaft.borrow().velocity)
    }

    pub fn last_command(&self) -> Option<MotorCommand> {
        self.shaft.borrow().command
    }

    /// Number of commands the motor has received, stops included.
    pub fn writes(&self) -> usize {
        self.shaft.borrow().writes
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.last_command(), Some(MotorCommand::Stop))
    }

    pub fn is_closed(&self) -> bool {
        let shaft = self.shaft.borrow();
        shaft.motor_closed && shaft.encoder_closed
    }

    /// Makes the encoder report nothing until set back.
    pub fn set_available(&self, available: bool) {
        self.shaft.borrow_mut().available = available;
    }

    pub fn acceleration_feedforward(&self) -> Option<AngularAcceleration> {
        match self.last_command() {
            Some(MotorCommand::Velocity { acceleration, .. }) => Some(acceleration),
            _ => None,
        }
    }

    pub fn torque_feedforward(&self) -> Option<Torque> {
        match self.last_command() {
            Some(MotorCommand::Velocity { torque, .. } | MotorCommand::Position { torque, .. }) => {
                Some(torque)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use motioncore::timer::ManualClock;
    use uom::si::{
        angular_acceleration::radian_per_second_squared, f64::Time, torque::newton_meter,
    };

    #[test]
    fn test_velocity_integrates() {
        let clock = ManualClock::new();
        let (mut motor, mut encoder, handle) =
            Shaft::builder().clock(clock.clone()).build().split();

        motor.set_velocity(
            AngularVelocity::new::<radian_per_second>(2.0),
            AngularAcceleration::new::<radian_per_second_squared>(1.0),
            Torque::new::<newton_meter>(0.5),
        );
        clock.advance(Time::new::<second>(1.5));
        let position = encoder.position().unwrap().get::<radian>();
        assert_relative_eq!(position, 3.0);
        let acceleration = handle.acceleration_feedforward().unwrap();
        assert_relative_eq!(acceleration.get::<radian_per_second_squared>(), 1.0);
        let torque = handle.torque_feedforward().unwrap();
        assert_relative_eq!(torque.get::<newton_meter>(), 0.5);

        motor.stop();
        clock.advance(Time::new::<second>(1.0));
        assert_relative_eq!(encoder.position().unwrap().get::<radian>(), 3.0);
        assert!(handle.is_stopped());
        assert_eq!(handle.writes(), 2);
    }

    #[test]
    fn test_position_and_reset() {
        let clock = ManualClock::new();
        let (mut motor, mut encoder, handle) = Shaft::builder().clock(clock).build().split();

        motor.set_position(
            Angle::new::<radian>(4.0),
            AngularVelocity::default(),
            Torque::default(),
        );
        assert_relative_eq!(encoder.position().unwrap().get::<radian>(), 4.0);

        encoder.reset();
        assert_relative_eq!(encoder.position().unwrap().get::<radian>(), 0.0);
        assert_relative_eq!(handle.position().get::<radian>(), 4.0);

        motor.set_position(
            Angle::new::<radian>(1.0),
            AngularVelocity::default(),
            Torque::default(),
        );
        assert_relative_eq!(encoder.position().unwrap().get::<radian>(), 1.0);
        assert_relative_eq!(handle.position().get::<radian>(), 5.0);
    }

    #[test]
    fn test_dropout_and_close() {
        let (mut motor, mut encoder, handle) =
            Shaft::builder().clock(ManualClock::new()).build().split();
        handle.set_available(false);
        assert!(encoder.position().is_none());
        assert!(encoder.velocity().is_none());
        handle.set_available(true);
        assert!(encoder.velocity().is_some());

        motor.set_duty_cycle(Ratio::new::<ratio>(0.5));
        assert_relative_eq!(handle.velocity().get::<radian_per_second>(), 50.0);

        motor.close();
        assert!(!handle.is_closed());
        encoder.close();
        assert!(handle.is_closed());
    }
}
