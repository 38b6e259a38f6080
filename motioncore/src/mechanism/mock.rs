//! Recording hardware for unit tests. Handles are shared, so a test keeps a
//! clone after moving the other into a mechanism.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use uom::si::{
    angle::radian,
    angular_acceleration::radian_per_second_squared,
    angular_velocity::radian_per_second,
    f64::{Angle, AngularAcceleration, AngularVelocity, Ratio, Torque},
    ratio::ratio,
    torque::newton_meter,
};

use super::{Encoder, Motor};

/// Last write in shaft units.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Command {
    DutyCycle(f64),
    Velocity {
        velocity: f64,
        acceleration: f64,
        torque: f64,
    },
    Position {
        position: f64,
        velocity: f64,
        torque: f64,
    },
    Stop,
}

#[derive(Debug, Default)]
struct MotorLog {
    commands: Vec<Command>,
    closed: bool,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct MockMotor {
    log: Rc<RefCell<MotorLog>>,
}

impl MockMotor {
    pub(crate) fn last(&self) -> Option<Command> {
        self.log.borrow().commands.last().cloned()
    }

    pub(crate) fn writes(&self) -> usize {
        self.log.borrow().commands.len()
    }

    pub(crate) fn closed(&self) -> bool {
        self.log.borrow().closed
    }

    fn push(&self, command: Command) {
        self.log.borrow_mut().commands.push(command);
    }
}

impl Motor for MockMotor {
    fn set_duty_cycle(&mut self, output: Ratio) {
        self.push(Command::DutyCycle(output.get::<ratio>()));
    }

    fn set_velocity(
        &mut self,
        velocity: AngularVelocity,
        acceleration: AngularAcceleration,
        torque: Torque,
    ) {
        self.push(Command::Velocity {
            velocity: velocity.get::<radian_per_second>(),
            acceleration: acceleration.get::<radian_per_second_squared>(),
            torque: torque.get::<newton_meter>(),
        });
    }

    fn set_position(&mut self, position: Angle, velocity: AngularVelocity, torque: Torque) {
        self.push(Command::Position {
            position: position.get::<radian>(),
            velocity: velocity.get::<radian_per_second>(),
            torque: torque.get::<newton_meter>(),
        });
    }

    fn stop(&mut self) {
        self.push(Command::Stop);
    }

    fn close(&mut self) {
        self.log.borrow_mut().closed = true;
    }
}

/// Reports whatever the test last set, in shaft radians.
#[derive(Clone, Debug)]
pub(crate) struct MockEncoder {
    position: Rc<Cell<Option<f64>>>,
    velocity: Rc<Cell<Option<f64>>>,
    reads: Rc<Cell<usize>>,
    resets: Rc<Cell<usize>>,
    closed: Rc<Cell<bool>>,
}

impl Default for MockEncoder {
    fn default() -> Self {
        Self {
            position: Rc::new(Cell::new(Some(0.0))),
            velocity: Rc::new(Cell::new(Some(0.0))),
            reads: Rc::default(),
            resets: Rc::default(),
            closed: Rc::default(),
        }
    }
}

impl MockEncoder {
    pub(crate) fn set_position(&self, position: Option<f64>) {
        self.position.set(position);
    }

    pub(crate) fn set_velocity(&self, velocity: Option<f64>) {
        self.velocity.set(velocity);
    }

    /// Position and velocity reads so far.
    pub(crate) fn reads(&self) -> usize {
        self.reads.get()
    }

    pub(crate) fn resets(&self) -> usize {
        self.resets.get()
    }

    pub(crate) fn closed(&self) -> bool {
        self.closed.get()
    }
}

impl Encoder for MockEncoder {
    fn velocity(&mut self) -> Option<AngularVelocity> {
        self.reads.set(self.reads.get() + 1);
        self.velocity
            .get()
            .map(AngularVelocity::new::<radian_per_second>)
    }

    fn position(&mut self) -> Option<Angle> {
        self.reads.set(self.reads.get() + 1);
        self.position.get().map(Angle::new::<radian>)
    }

    fn reset(&mut self) {
        self.resets.set(self.resets.get() + 1);
        if self.position.get().is_some() {
            self.position.set(Some(0.0));
        }
    }

    fn close(&mut self) {
        self.closed.set(true);
    }
}
