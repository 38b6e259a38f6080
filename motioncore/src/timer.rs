use std::{cell::Cell, rc::Rc, time::Instant};

use uom::si::{f64::Time, time::second};

pub trait Clock {
    fn now(&self) -> Time;
}

/// Monotonic wall clock, zeroed at construction.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Time {
        Time::new::<second>(self.origin.elapsed().as_secs_f64())
    }
}

/// A clock advanced by hand. Clones share the same time, so one handle can
/// drive every timer in a simulation.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now: Time) {
        self.now.set(now.get::<second>());
    }

    pub fn advance(&self, period: Time) {
        self.now.set(self.now.get() + period.get::<second>());
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Time {
        Time::new::<second>(self.now.get())
    }
}

/// Elapsed time since the last restart.
#[derive(Clone, Debug)]
pub struct Timer<C> {
    clock: C,
    start: Time,
}

impl<C: Clock> Timer<C> {
    /// Creates a timer already running from now.
    pub fn new(clock: C) -> Self {
        let start = clock.now();
        Self { clock, start }
    }

    pub fn restart(&mut self) {
        self.start = self.clock.now();
    }

    pub fn elapsed(&self) -> Time {
        self.clock.now() - self.start
    }

    pub fn has_elapsed(&self, duration: Time) -> bool {
        self.elapsed() >= duration
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_timer_follows_manual_clock() {
        let clock = ManualClock::new();
        clock.set(Time::new::<second>(10.0));
        let mut timer = Timer::new(clock.clone());
        assert_relative_eq!(timer.elapsed().get::<second>(), 0.0);

        clock.advance(Time::new::<second>(0.25));
        assert_relative_eq!(timer.elapsed().get::<second>(), 0.25);
        assert!(timer.has_elapsed(Time::new::<second>(0.25)));
        assert!(!timer.has_elapsed(Time::new::<second>(0.3)));

        timer.restart();
        assert_relative_eq!(timer.elapsed().get::<second>(), 0.0);
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let earlier = clock.now();
        let later = clock.now();
        assert!(later >= earlier);
    }
}
