//! Drive-then-steer sequencing over a set of swerve modules.
//!
//! The phase logic is a pure function, [`next`], so it can be tested without
//! hardware. [`DriveInASquare`] wires it to a clock and a [`Swerve`].

use serde::Serialize;
use tracing::debug;
use uom::si::{
    acceleration::meter_per_second_squared,
    angle::{degree, radian},
    f64::{Acceleration, Angle, Time, Velocity},
    time::second,
    velocity::meter_per_second,
};

use crate::{
    error::ConfigError,
    generator::ProfileGenerator,
    mechanism::{LinearMechanism, RotaryMechanism},
    profile::MotionProfile,
    servo::{normalize_angle, Linear, PositionServo, Rotary, VelocityServo},
    state::{AngleTarget, MotionState},
    telemetry::{Level, Logger},
    timer::{Clock, Timer},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Phase {
    Driving,
    Steering,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SquareState {
    pub phase: Phase,
    /// Steering goal shared by every module, in `[-pi, pi]`.
    pub heading: Angle,
}

impl Default for SquareState {
    fn default() -> Self {
        Self {
            phase: Phase::Driving,
            heading: Angle::default(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Inputs {
    /// Time since the drive profile started.
    pub elapsed: Time,
    /// True only if every module reports at goal.
    pub steering_at_goal: bool,
}

/// What one module is told to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ModuleState {
    pub speed: Velocity,
    pub acceleration: Acceleration,
    pub angle: Angle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    pub state: SquareState,
    pub restart_timer: bool,
    pub command: ModuleState,
}

/// One transition of the square sequence.
pub fn next(state: SquareState, inputs: Inputs, profile: &MotionProfile, turn: Angle) -> Step {
    let elapsed = inputs.elapsed.get::<second>();
    let (state, restart_timer, setpoint) = match state.phase {
        Phase::Driving if elapsed >= profile.duration() => {
            let heading = normalize_angle((state.heading + turn).get::<radian>());
            let steering = SquareState {
                phase: Phase::Steering,
                heading: Angle::new::<radian>(heading),
            };
            (steering, false, None)
        }
        Phase::Driving => (state, false, Some(profile.get(elapsed))),
        Phase::Steering if inputs.steering_at_goal => {
            let driving = SquareState {
                phase: Phase::Driving,
                ..state
            };
            (driving, true, Some(profile.get(0.0)))
        }
        Phase::Steering => (state, false, None),
    };
    let setpoint = setpoint.unwrap_or_default();
    Step {
        state,
        restart_timer,
        command: ModuleState {
            speed: Velocity::new::<meter_per_second>(setpoint.v),
            acceleration: Acceleration::new::<meter_per_second_squared>(setpoint.a),
            angle: state.heading,
        },
    }
}

/// A drivetrain taking raw per-module commands.
pub trait Swerve<const N: usize> {
    fn set_module_states(&mut self, states: &[ModuleState; N]);

    fn at_goal(&mut self) -> [bool; N];

    fn stop(&mut self);
}

/// A drive wheel under velocity control and a steering shaft under profiled
/// position control.
#[derive(Debug)]
pub struct SwerveModule<D, S, C> {
    drive: VelocityServo<Linear<D>>,
    steer: PositionServo<Rotary<S>, C>,
}

impl<D, S, C> SwerveModule<D, S, C>
where
    D: LinearMechanism,
    S: RotaryMechanism,
    C: Clock,
{
    pub fn new(drive: VelocityServo<Linear<D>>, steer: PositionServo<Rotary<S>, C>) -> Self {
        Self { drive, steer }
    }

    pub fn set_state(&mut self, state: &ModuleState) {
        self.steer.set_target(AngleTarget {
            x: state.angle,
            ..Default::default()
        });
        self.steer.update();
        self.drive.set_velocity(
            state.speed.get::<meter_per_second>(),
            state.acceleration.get::<meter_per_second_squared>(),
        );
    }

    pub fn at_goal(&mut self) -> bool {
        self.steer.at_goal()
    }

    pub fn stop(&mut self) {
        self.drive.stop();
        self.steer.stop();
    }

    pub fn drive(&self) -> &VelocityServo<Linear<D>> {
        &self.drive
    }

    pub fn steer(&self) -> &PositionServo<Rotary<S>, C> {
        &self.steer
    }
}

#[derive(Debug)]
pub struct SwerveDrive<D, S, C, const N: usize> {
    modules: [SwerveModule<D, S, C>; N],
}

impl<D, S, C, const N: usize> SwerveDrive<D, S, C, N>
where
    D: LinearMechanism,
    S: RotaryMechanism,
    C: Clock,
{
    pub fn new(modules: [SwerveModule<D, S, C>; N]) -> Self {
        Self { modules }
    }

    pub fn modules(&self) -> &[SwerveModule<D, S, C>; N] {
        &self.modules
    }
}

impl<D, S, C, const N: usize> Swerve<N> for SwerveDrive<D, S, C, N>
where
    D: LinearMechanism,
    S: RotaryMechanism,
    C: Clock,
{
    fn set_module_states(&mut self, states: &[ModuleState; N]) {
        for (module, state) in self.modules.iter_mut().zip(states) {
            module.set_state(state);
        }
    }

    fn at_goal(&mut self) -> [bool; N] {
        let modules = &mut self.modules;
        core::array::from_fn(|i| modules[i].at_goal())
    }

    fn stop(&mut self) {
        for module in &mut self.modules {
            module.stop();
        }
    }
}

/// Drives a small square: a straight profiled leg, then all modules steer a
/// quarter turn in place, and again.
///
/// Meant for tuning steering, which has to settle quickly at every corner.
/// The swerve is stopped by [`end`](Self::end), or on drop if `end` was
/// never called.
#[derive(Debug)]
pub struct DriveInASquare<S, C, const N: usize>
where
    S: Swerve<N>,
{
    swerve: S,
    timer: Timer<C>,
    profile: MotionProfile,
    turn: Angle,
    state: SquareState,
    logger: Logger,
    ended: bool,
}

impl<S, C, const N: usize> DriveInASquare<S, C, N>
where
    S: Swerve<N>,
    C: Clock,
{
    pub const DRIVE_LENGTH: f64 = 1.0;
    pub const MAX_VELOCITY: f64 = 1.0;
    pub const MAX_ACCELERATION: f64 = 1.0;
    pub const MAX_JERK: f64 = 1.0;
    pub const TURN_DEGREES: f64 = 90.0;

    /// A one meter square at unit limits.
    pub fn square(swerve: S, timer: Timer<C>) -> Result<Self, ConfigError> {
        let generator =
            ProfileGenerator::simple(Self::MAX_VELOCITY, Self::MAX_ACCELERATION, Self::MAX_JERK)?;
        Ok(Self::new(
            swerve,
            timer,
            &generator,
            Self::DRIVE_LENGTH,
            Angle::new::<degree>(Self::TURN_DEGREES),
        ))
    }

    pub fn new(
        swerve: S,
        timer: Timer<C>,
        generator: &ProfileGenerator,
        length: f64,
        turn: Angle,
    ) -> Self {
        let profile = generator.generate(MotionState::at(0.0), MotionState::at(length));
        Self {
            swerve,
            timer,
            profile,
            turn,
            state: SquareState::default(),
            logger: Logger::disabled(),
            ended: false,
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn initialize(&mut self) {
        self.state = SquareState::default();
        self.ended = false;
        self.timer.restart();
        debug!("square started");
    }

    pub fn execute(&mut self) {
        let steering_at_goal =
            self.state.phase == Phase::Steering && self.swerve.at_goal().iter().all(|&at| at);
        let inputs = Inputs {
            elapsed: self.timer.elapsed(),
            steering_at_goal,
        };
        let step = next(self.state, inputs, &self.profile, self.turn);
        if step.restart_timer {
            self.timer.restart();
        }
        if step.state.phase != self.state.phase {
            let heading = step.state.heading.get::<radian>();
            debug!(phase = ?step.state.phase, heading, "square phase");
        }
        self.state = step.state;
        self.swerve.set_module_states(&[step.command; N]);

        self.logger.log(Level::Debug, "phase", || step.state.phase);
        self.logger.log(Level::Debug, "command", || step.command);
    }

    pub fn end(&mut self, interrupted: bool) {
        debug!(interrupted, "square ended");
        self.swerve.stop();
        self.ended = true;
    }

    pub fn state(&self) -> SquareState {
        self.state
    }

    pub fn profile(&self) -> &MotionProfile {
        &self.profile
    }

    pub fn swerve(&self) -> &S {
        &self.swerve
    }

    pub fn timer(&self) -> &Timer<C> {
        &self.timer
    }
}

impl<S, C, const N: usize> Drop for DriveInASquare<S, C, N>
where
    S: Swerve<N>,
{
    fn drop(&mut self) {
        if !self.ended {
            self.swerve.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        telemetry::{MemorySink, Primitive},
        timer::ManualClock,
    };
    use approx::assert_relative_eq;
    use core::f64::consts::PI;
    use std::{cell::RefCell, rc::Rc};

    fn profile() -> MotionProfile {
        ProfileGenerator::simple(1.0, 1.0, 1.0)
            .unwrap()
            .generate(MotionState::at(0.0), MotionState::at(1.0))
    }

    fn quarter() -> Angle {
        Angle::new::<degree>(90.0)
    }

    fn inputs(elapsed: f64, steering_at_goal: bool) -> Inputs {
        Inputs {
            elapsed: Time::new::<second>(elapsed),
            steering_at_goal,
        }
    }

    #[test]
    fn test_driving_follows_profile() {
        let profile = profile();
        let step = next(SquareState::default(), inputs(1.0, true), &profile, quarter());
        let expected = profile.get(1.0);
        assert_eq!(step.state, SquareState::default());
        assert!(!step.restart_timer);
        assert_relative_eq!(step.command.speed.get::<meter_per_second>(), expected.v);
        assert_relative_eq!(
            step.command.acceleration.get::<meter_per_second_squared>(),
            expected.a
        );
        assert_relative_eq!(step.command.angle.get::<radian>(), 0.0);
    }

    #[test]
    fn test_driving_done_turns() {
        let profile = profile();
        let step = next(
            SquareState::default(),
            inputs(profile.duration(), false),
            &profile,
            quarter(),
        );
        assert_eq!(step.state.phase, Phase::Steering);
        assert_relative_eq!(step.state.heading.get::<radian>(), PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(step.command.angle.get::<radian>(), PI / 2.0, epsilon = 1e-12);
        assert_eq!(step.command.speed.get::<meter_per_second>(), 0.0);
        assert!(!step.restart_timer);
    }

    #[test]
    fn test_steering_waits_for_modules() {
        let profile = profile();
        let steering = SquareState {
            phase: Phase::Steering,
            heading: Angle::new::<radian>(PI / 2.0),
        };
        let step = next(steering, inputs(100.0, false), &profile, quarter());
        assert_eq!(step.state, steering);
        assert!(!step.restart_timer);
        assert_eq!(step.command.speed.get::<meter_per_second>(), 0.0);

        let step = next(steering, inputs(100.0, true), &profile, quarter());
        assert_eq!(step.state.phase, Phase::Driving);
        assert_eq!(step.state.heading, steering.heading);
        assert!(step.restart_timer);
        assert_relative_eq!(step.command.speed.get::<meter_per_second>(), profile.get(0.0).v);
    }

    #[test]
    fn test_heading_wraps() {
        let profile = profile();
        let mut state = SquareState::default();
        let mut headings = Vec::new();
        for _ in 0..4 {
            state = next(state, inputs(10.0, true), &profile, quarter()).state;
            headings.push(state.heading.get::<radian>());
            state = next(state, inputs(10.0, true), &profile, quarter()).state;
        }
        let expected = [PI / 2.0, PI, -PI / 2.0, 0.0];
        for (heading, expected) in headings.into_iter().zip(expected) {
            assert_relative_eq!(heading, expected, epsilon = 1e-9);
        }
    }

    #[derive(Debug, Default)]
    struct Log {
        commands: Vec<[ModuleState; 2]>,
        at_goal_queries: usize,
        stops: usize,
    }

    #[derive(Clone, Debug, Default)]
    struct FakeSwerve {
        log: Rc<RefCell<Log>>,
        at_goal: Rc<RefCell<[bool; 2]>>,
    }

    impl Swerve<2> for FakeSwerve {
        fn set_module_states(&mut self, states: &[ModuleState; 2]) {
            self.log.borrow_mut().commands.push(*states);
        }

        fn at_goal(&mut self) -> [bool; 2] {
            self.log.borrow_mut().at_goal_queries += 1;
            *self.at_goal.borrow()
        }

        fn stop(&mut self) {
            self.log.borrow_mut().stops += 1;
        }
    }

    #[test]
    fn test_square_sequence() {
        let swerve = FakeSwerve::default();
        let clock = ManualClock::new();
        let sink = Rc::new(MemorySink::new());
        let timer = Timer::new(clock.clone());
        let mut square = DriveInASquare::<_, _, 2>::square(swerve.clone(), timer)
            .unwrap()
            .with_logger(Logger::new(sink.clone(), "square", Level::Debug).unwrap());
        let duration = square.profile().duration();

        square.initialize();
        square.execute();
        assert_eq!(square.state().phase, Phase::Driving);
        assert_eq!(swerve.log.borrow().at_goal_queries, 0);

        clock.advance(Time::new::<second>(duration));
        square.execute();
        assert_eq!(square.state().phase, Phase::Steering);
        assert_eq!(
            sink.latest("square/phase"),
            Some(Primitive::Text(String::from("Steering")))
        );

        // one module still turning
        *swerve.at_goal.borrow_mut() = [true, false];
        square.execute();
        assert_eq!(square.state().phase, Phase::Steering);

        *swerve.at_goal.borrow_mut() = [true, true];
        square.execute();
        assert_eq!(square.state().phase, Phase::Driving);
        assert_relative_eq!(square.timer().elapsed().get::<second>(), 0.0);

        let log = swerve.log.borrow();
        assert_eq!(log.commands.len(), 4);
        for states in &log.commands {
            assert_eq!(states[0], states[1]);
        }
        assert_eq!(log.commands[1][0].speed.get::<meter_per_second>(), 0.0);
        assert_relative_eq!(
            log.commands[3][0].angle.get::<radian>(),
            PI / 2.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_end_stops_once() {
        let swerve = FakeSwerve::default();
        let timer = Timer::new(ManualClock::new());
        let mut square = DriveInASquare::<_, _, 2>::square(swerve.clone(), timer).unwrap();
        square.initialize();
        square.execute();
        square.end(false);
        drop(square);
        assert_eq!(swerve.log.borrow().stops, 1);
    }

    #[test]
    fn test_drop_without_end_stops() {
        let swerve = FakeSwerve::default();
        {
            let timer = Timer::new(ManualClock::new());
            let mut square = DriveInASquare::<_, _, 2>::square(swerve.clone(), timer).unwrap();
            square.initialize();
            square.execute();
        }
        assert_eq!(swerve.log.borrow().stops, 1);
    }
}
