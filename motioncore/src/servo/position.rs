use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;
use uom::si::time::second;

use super::ServoAxis;
use crate::{
    generator::ProfileGenerator,
    profile::MotionProfile,
    state::MotionState,
    telemetry::{Level, Logger},
    timer::{Clock, Timer},
};

/// Drives an axis to a goal along a jerk-limited profile.
///
/// A new goal replaces the profile wholesale. The profile starts from the
/// last commanded setpoint so consecutive goals chain without a jump; the
/// first profile starts from measured feedback.
#[derive(Debug, TypedBuilder)]
pub struct PositionServo<A, C> {
    axis: A,
    generator: ProfileGenerator,
    timer: Timer<C>,
    /// Largest |measured - goal| still counted as arrived.
    tolerance: f64,
    #[builder(default)]
    logger: Logger,
    #[builder(default, setter(skip))]
    goal: Option<MotionState>,
    #[builder(default, setter(skip))]
    profile: Option<MotionProfile>,
    #[builder(default, setter(skip))]
    setpoint: Option<MotionState>,
}

impl<A, C> PositionServo<A, C>
where
    A: ServoAxis,
    C: Clock,
{
    /// Sets a new goal. Re-sending the current goal keeps the running
    /// profile.
    pub fn set_goal(&mut self, goal: MotionState) {
        let goal = MotionState {
            x: self.axis.limit(goal.x),
            ..goal
        };
        if self.goal == Some(goal) {
            return;
        }
        self.goal = Some(goal);
        self.logger.log(Level::Comp, "goal", || goal);

        let start = match self.setpoint {
            Some(setpoint) => Some(setpoint),
            None => self.measure(),
        };
        match start {
            Some(start) => self.start_profile(start, goal),
            None => {
                debug!(?goal, "no feedback yet, goal pending");
                self.profile = None;
            }
        }
    }

    /// Goal at rest at `x`.
    pub fn set_position(&mut self, x: f64) {
        self.set_goal(MotionState::at(x));
    }

    pub fn set_target(&mut self, target: A::Target) {
        self.set_goal(target.into());
    }

    /// The last setpoint in the axis' own quantities.
    pub fn target(&self) -> Option<A::Target> {
        self.setpoint.map(A::Target::from)
    }

    /// Commands the current setpoint. Writes at most once per call.
    pub fn update(&mut self) {
        let Some(goal) = self.goal else {
            trace!("no goal, nothing to command");
            return;
        };
        if self.profile.is_none() {
            match self.measure() {
                Some(start) => self.start_profile(start, goal),
                None => {
                    warn!(?goal, "feedback unavailable, skipping write");
                    return;
                }
            }
        }
        let Some(profile) = &self.profile else {
            return;
        };

        let setpoint = profile.get(self.timer.elapsed().get::<second>());
        self.axis.set_position(setpoint.x, setpoint.v);
        self.setpoint = Some(setpoint);

        self.logger.log(Level::Debug, "setpoint", || setpoint);
        self.logger
            .log(Level::Debug, "measurement", || self.axis.position());
    }

    /// Whether the profile has finished and the measured position is within
    /// tolerance. Without feedback the servo is never at its goal.
    pub fn at_goal(&mut self) -> bool {
        let at_goal = self.check_goal();
        self.logger.log(Level::Debug, "at_goal", || at_goal);
        at_goal
    }

    fn check_goal(&mut self) -> bool {
        let (Some(goal), Some(duration)) = (self.goal, self.profile.as_ref().map(|p| p.duration()))
        else {
            return false;
        };
        if self.timer.elapsed().get::<second>() < duration {
            return false;
        }
        match self.axis.position() {
            Some(x) => self.axis.error(x, goal.x).abs() <= self.tolerance,
            None => false,
        }
    }

    /// Stops the axis and forgets the goal.
    pub fn stop(&mut self) {
        self.axis.stop();
        self.reset();
    }

    pub fn close(&mut self) {
        self.axis.close();
        self.reset();
    }

    /// Forgets goal, profile and setpoint. The next goal starts from
    /// measured feedback.
    pub fn reset(&mut self) {
        self.goal = None;
        self.profile = None;
        self.setpoint = None;
    }

    pub fn goal(&self) -> Option<MotionState> {
        self.goal
    }

    pub fn setpoint(&self) -> Option<MotionState> {
        self.setpoint
    }

    pub fn profile(&self) -> Option<&MotionProfile> {
        self.profile.as_ref()
    }

    pub fn position(&mut self) -> Option<f64> {
        self.axis.position()
    }

    pub fn axis(&self) -> &A {
        &self.axis
    }

    pub fn timer(&self) -> &Timer<C> {
        &self.timer
    }

    fn measure(&mut self) -> Option<MotionState> {
        let x = self.axis.position()?;
        let v = self.axis.velocity()?;
        Some(MotionState::new(x, v, 0.0, 0.0))
    }

    fn start_profile(&mut self, start: MotionState, goal: MotionState) {
        let target = MotionState {
            x: start.x + self.axis.error(start.x, goal.x),
            ..goal
        };
        let profile = self.generator.generate(start, target);
        debug!(?start, ?target, duration = profile.duration(), "new profile");
        self.profile = Some(profile);
        self.timer.restart();
    }
}
