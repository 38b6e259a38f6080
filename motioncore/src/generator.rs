use heapless::Vec;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    error::{positive, ConfigError},
    profile::{MotionProfile, Segment, MAX_SEGMENTS},
    state::MotionState,
};

/// Kinematic limits of one axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Limits {
    v_max: f64,
    a_max: f64,
    j_max: f64,
}

impl Limits {
    pub fn new(v_max: f64, a_max: f64, j_max: f64) -> Result<Self, ConfigError> {
        let j_max = if j_max == f64::INFINITY {
            j_max
        } else {
            positive("max jerk", j_max)?
        };
        Ok(Self {
            v_max: positive("max velocity", v_max)?,
            a_max: positive("max acceleration", a_max)?,
            j_max,
        })
    }

    /// Limits without a jerk bound: the generator degenerates to a plain
    /// trapezoid whose acceleration steps between phases.
    pub fn trapezoidal(v_max: f64, a_max: f64) -> Result<Self, ConfigError> {
        Self::new(v_max, a_max, f64::INFINITY)
    }

    pub fn max_velocity(&self) -> f64 {
        self.v_max
    }

    pub fn max_acceleration(&self) -> f64 {
        self.a_max
    }

    pub fn max_jerk(&self) -> f64 {
        self.j_max
    }
}

/// Unsigned shape of a velocity change: jerk phase, constant phase, jerk phase.
#[derive(Clone, Copy, Debug)]
struct Ramp {
    t_jerk: f64,
    t_const: f64,
    a_peak: f64,
}

impl Ramp {
    fn duration(&self) -> f64 {
        2.0 * self.t_jerk + self.t_const
    }
}

/// Builds jerk-limited S-curve profiles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ProfileGenerator {
    limits: Limits,
}

impl ProfileGenerator {
    const LOOP_COUNT: u8 = 100;
    const EPSILON: f64 = 1e-9;

    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn simple(v_max: f64, a_max: f64, j_max: f64) -> Result<Self, ConfigError> {
        Limits::new(v_max, a_max, j_max).map(Self::new)
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Generates a profile from `start` to `goal`.
    ///
    /// Boundary accelerations are taken as zero and `goal.v` is limited to
    /// `max_velocity`. A start faster than `max_velocity` first slows down to
    /// it. When `goal.v` cannot be met over the available distance the
    /// profile stops past the goal and comes back, so it always ends in the
    /// goal state.
    pub fn generate(&self, start: MotionState, goal: MotionState) -> MotionProfile {
        if !start.is_finite() || !goal.is_finite() {
            warn!(?start, ?goal, "non-finite profile request, holding start");
            return MotionProfile::stationary(start);
        }

        let v_max = self.limits.v_max;
        let goal = MotionState::new(goal.x, goal.v.clamp(-v_max, v_max), 0.0, 0.0);
        let mut builder = SegmentBuilder::new(start);
        self.append(&mut builder, goal);
        builder.build(goal)
    }

    /// Appends the phases that take the builder's current state to `goal`.
    fn append(&self, builder: &mut SegmentBuilder, goal: MotionState) {
        let from = builder.state();
        let displacement = goal.x - from.x;
        let sign = if displacement < 0.0 { -1.0 } else { 1.0 };
        let distance = displacement.abs();
        let v_start = from.v * sign;
        let v_goal = goal.v * sign;
        let v_max = self.limits.v_max;

        if distance <= Self::EPSILON && (v_goal - v_start).abs() <= Self::EPSILON {
            return;
        }

        if v_start.abs() > v_max {
            let v_limit = v_max.copysign(v_start);
            debug!(v_start = from.v, "start velocity over the limit");
            builder.ramp(sign, v_start, v_limit, self.calculate_ramp(v_limit - v_start));
            self.append(builder, goal);
            return;
        }

        if self.calculate_acceleration_distance(v_start, v_goal) > distance {
            if v_start.abs() > Self::EPSILON {
                debug!(v_start = from.v, v_goal = goal.v, "goal overrun, stopping first");
                builder.ramp(sign, v_start, 0.0, self.calculate_ramp(v_start));
                self.append(builder, goal);
                return;
            }
            // at rest but too close to reach goal.v: back up for a run-up
            let run_up = self.calculate_acceleration_distance(0.0, v_goal);
            self.append(builder, MotionState::at(goal.x - sign * run_up));
            builder.ramp(sign, 0.0, v_goal, self.calculate_ramp(v_goal));
            return;
        }

        let v_low = v_start.max(v_goal);
        let v_peak = if v_low >= v_max
            || self.calculate_ramps_distance(v_start, v_max, v_goal) <= distance
        {
            v_max
        } else {
            self.calculate_peak_velocity(v_start, v_goal, v_low, distance)
        };

        let t_cruise = if v_peak >= v_max {
            let cruise = distance - self.calculate_ramps_distance(v_start, v_peak, v_goal);
            cruise.max(0.0) / v_peak
        } else {
            0.0
        };

        builder.ramp(sign, v_start, v_peak, self.calculate_ramp(v_peak - v_start));
        builder.push(t_cruise, 0.0, 0.0);
        builder.ramp(sign, v_peak, v_goal, self.calculate_ramp(v_goal - v_peak));
    }

    fn calculate_ramp(&self, dv: f64) -> Ramp {
        let Limits { a_max, j_max, .. } = self.limits;
        let dv = dv.abs();
        let tc = a_max / j_max;
        if dv >= a_max * tc {
            Ramp {
                t_jerk: tc,
                t_const: dv / a_max - tc,
                a_peak: a_max,
            }
        } else {
            let td = (dv / j_max).sqrt();
            Ramp {
                t_jerk: td,
                t_const: 0.0,
                a_peak: j_max * td,
            }
        }
    }

    /// Signed distance covered while changing velocity from `v_start` to `v_end`.
    fn calculate_acceleration_distance(&self, v_start: f64, v_end: f64) -> f64 {
        (v_start + v_end) * self.calculate_ramp(v_end - v_start).duration() / 2.0
    }

    fn calculate_ramps_distance(&self, v_start: f64, v_peak: f64, v_end: f64) -> f64 {
        self.calculate_acceleration_distance(v_start, v_peak)
            + self.calculate_acceleration_distance(v_peak, v_end)
    }

    /// Highest peak whose two ramps fit in `distance`, searched in `[v_low, v_max]`.
    fn calculate_peak_velocity(&self, v_start: f64, v_end: f64, v_low: f64, distance: f64) -> f64 {
        let mut low = v_low;
        let mut high = self.limits.v_max;
        for _ in 0..Self::LOOP_COUNT {
            let mid = (low + high) / 2.0;
            if self.calculate_ramps_distance(v_start, mid, v_end) <= distance {
                low = mid;
            } else {
                high = mid;
            }
        }
        low
    }
}

struct SegmentBuilder {
    segments: Vec<Segment, MAX_SEGMENTS>,
    origin: MotionState,
    state: MotionState,
}

impl SegmentBuilder {
    fn new(start: MotionState) -> Self {
        let origin = MotionState::new(start.x, start.v, 0.0, 0.0);
        Self {
            segments: Vec::new(),
            origin,
            state: origin,
        }
    }

    fn state(&self) -> MotionState {
        self.state
    }

    /// Appends the three phases of a velocity change from `v_start` to
    /// `v_end`, both taken along `sign`. Ends exactly at `v_end`.
    fn ramp(&mut self, sign: f64, v_start: f64, v_end: f64, ramp: Ramp) {
        let direction = if v_end >= v_start { sign } else { -sign };
        let j = if ramp.t_jerk > 0.0 {
            ramp.a_peak / ramp.t_jerk
        } else {
            0.0
        };
        let a = direction * ramp.a_peak;
        self.push(ramp.t_jerk, 0.0, direction * j);
        self.push(ramp.t_const, a, 0.0);
        self.push(ramp.t_jerk, a, -direction * j);
        self.state = MotionState::new(self.state.x, v_end * sign, 0.0, 0.0);
    }

    /// Appends a phase unless it is too short to matter. The acceleration is
    /// set explicitly so that collapsed jerk phases leave a clean step.
    fn push(&mut self, duration: f64, a: f64, j: f64) {
        if duration <= ProfileGenerator::EPSILON {
            return;
        }
        let segment = Segment {
            duration,
            start: MotionState::new(self.state.x, self.state.v, a, j),
            jerk: j,
        };
        self.state = segment.end();
        let pushed = self.segments.push(segment);
        debug_assert!(pushed.is_ok(), "profile needs more than {} phases", MAX_SEGMENTS);
    }

    fn build(self, end: MotionState) -> MotionProfile {
        MotionProfile::new(self.segments, self.origin, end)
    }
}
