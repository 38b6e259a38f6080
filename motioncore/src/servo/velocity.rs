use typed_builder::TypedBuilder;

use super::ServoAxis;
use crate::telemetry::{Level, Logger};

/// Passes velocity setpoints with acceleration feedforward to an axis.
#[derive(Debug, TypedBuilder)]
pub struct VelocityServo<A> {
    axis: A,
    #[builder(default)]
    logger: Logger,
    #[builder(default, setter(skip))]
    setpoint: Option<f64>,
}

impl<A: ServoAxis> VelocityServo<A> {
    pub fn set_velocity(&mut self, v: f64, a: f64) {
        self.axis.set_velocity(v, a);
        self.setpoint = Some(v);

        self.logger.log(Level::Debug, "setpoint", || v);
        self.logger.log(Level::Trace, "feedforward", || a);
        self.logger
            .log(Level::Debug, "measurement", || self.axis.velocity());
    }

    pub fn velocity(&mut self) -> Option<f64> {
        self.axis.velocity()
    }

    pub fn setpoint(&self) -> Option<f64> {
        self.setpoint
    }

    pub fn stop(&mut self) {
        self.axis.stop();
        self.setpoint = None;
    }

    pub fn close(&mut self) {
        self.axis.close();
        self.setpoint = None;
    }

    pub fn axis(&self) -> &A {
        &self.axis
    }
}
