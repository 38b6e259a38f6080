use heapless::Vec;
use serde::Serialize;

use crate::state::MotionState;

/// Upper bound on phases: slowing to the velocity limit (3), stopping past
/// the goal (3), a rest-to-rest move (7) and a run-up ramp (3).
pub const MAX_SEGMENTS: usize = 16;

/// One constant-jerk phase of a profile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Segment {
    pub duration: f64,
    pub start: MotionState,
    pub jerk: f64,
}

impl Segment {
    /// Samples the segment at local time `t`, `0 <= t <= duration`.
    #[inline]
    pub fn calculate(&self, t: f64) -> MotionState {
        self.start.integrate(self.jerk, t)
    }

    pub fn end(&self) -> MotionState {
        self.calculate(self.duration)
    }
}

/// A time-parameterized trajectory, immutable once generated.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MotionProfile {
    segments: Vec<Segment, MAX_SEGMENTS>,
    start: MotionState,
    end: MotionState,
    duration: f64,
}

impl MotionProfile {
    /// A profile that holds `state` and takes no time.
    pub fn stationary(state: MotionState) -> Self {
        let state = MotionState { j: 0.0, ..state };
        Self {
            segments: Vec::new(),
            start: state,
            end: state,
            duration: 0.0,
        }
    }

    pub(crate) fn new(
        segments: Vec<Segment, MAX_SEGMENTS>,
        start: MotionState,
        end: MotionState,
    ) -> Self {
        let duration = segments.iter().map(|segment| segment.duration).sum();
        Self {
            segments,
            start,
            end,
            duration,
        }
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn start(&self) -> MotionState {
        self.start
    }

    /// The terminal state, returned for every `t >= duration()`.
    pub fn end(&self) -> MotionState {
        self.end
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Samples the profile at elapsed time `t`, clamped to `[0, duration()]`.
    pub fn get(&self, t: f64) -> MotionState {
        if t.is_nan() || t <= 0.0 {
            return self.segments.first().map_or(self.start, |segment| segment.start);
        }
        if t >= self.duration {
            return self.end;
        }
        let mut local = t;
        for segment in &self.segments {
            if local <= segment.duration {
                return segment.calculate(local);
            }
            local -= segment.duration;
        }
        self.end
    }
}
