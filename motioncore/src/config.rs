//! TOML configuration for a swerve drivetrain and its square routine.
//!
//! ```toml
//! [telemetry]
//! root = "robot"
//! level = "debug"
//!
//! [drive]
//! gear_ratio = 5.5
//! wheel_diameter = 0.1
//!
//! [steer]
//! gear_ratio = 10.0
//!
//! [square.steer_limits]
//! max_velocity = 20.0
//! max_acceleration = 50.0
//! ```
//!
//! Lengths are meters, angles radians unless the key says degrees. A limits
//! table without `max_jerk` yields a trapezoidal profile.

use std::{path::Path, rc::Rc};

use serde::{Deserialize, Serialize};
use uom::si::{
    angle::{degree, radian},
    f64::{Angle, Length},
    length::meter,
};

use crate::{
    error::{finite, positive, ConfigError},
    generator::{Limits, ProfileGenerator},
    mechanism::{Encoder, Motor, SimpleLinearMechanism, SimpleRotaryMechanism, TurretMechanism},
    telemetry::{Level, Logger, NullSink, Sink},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    pub drive: DriveConfig,
    pub steer: SteerConfig,
    #[serde(default)]
    pub square: SquareConfig,
}

impl Config {
    /// Parses and validates.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.telemetry.logger(Rc::new(NullSink))?;
        self.drive.validate()?;
        self.steer.validate()?;
        self.square.validate()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub root: String,
    #[serde(default)]
    pub level: Level,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            root: String::from("robot"),
            level: Level::default(),
        }
    }
}

impl TelemetryConfig {
    pub fn logger(&self, sink: Rc<dyn Sink>) -> Result<Logger, ConfigError> {
        Logger::new(sink, &self.root, self.level)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriveConfig {
    pub gear_ratio: f64,
    pub wheel_diameter: f64,
}

impl DriveConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("drive gear ratio", self.gear_ratio)?;
        positive("wheel diameter", self.wheel_diameter)?;
        Ok(())
    }

    pub fn wheel_diameter(&self) -> Length {
        Length::new::<meter>(self.wheel_diameter)
    }

    pub fn mechanism<M: Motor, E: Encoder>(
        &self,
        motor: M,
        encoder: E,
    ) -> Result<SimpleLinearMechanism<M, E>, ConfigError> {
        SimpleLinearMechanism::new(motor, encoder, self.gear_ratio, self.wheel_diameter())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SteerConfig {
    pub gear_ratio: f64,
    /// Travel limits in radians; both must be given for the range to apply.
    #[serde(default)]
    pub min_angle: Option<f64>,
    #[serde(default)]
    pub max_angle: Option<f64>,
}

impl SteerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("steer gear ratio", self.gear_ratio)?;
        self.range().map(|_| ())
    }

    /// The configured travel range, if any.
    pub fn range(&self) -> Result<Option<(Angle, Angle)>, ConfigError> {
        match (self.min_angle, self.max_angle) {
            (Some(min), Some(max)) => {
                let min = finite("min angle", min)?;
                let max = finite("max angle", max)?;
                if min >= max {
                    return Err(ConfigError::InvalidRange { min, max });
                }
                Ok(Some((Angle::new::<radian>(min), Angle::new::<radian>(max))))
            }
            _ => Ok(None),
        }
    }

    pub fn mechanism<M: Motor, E: Encoder>(
        &self,
        motor: M,
        encoder: E,
    ) -> Result<SimpleRotaryMechanism<M, E>, ConfigError> {
        SimpleRotaryMechanism::new(motor, encoder, self.gear_ratio)
    }

    /// A range-limited steering mechanism. Without a configured range the
    /// travel is half a turn either side of zero.
    pub fn turret<M: Motor, E: Encoder>(
        &self,
        motor: M,
        encoder: E,
    ) -> Result<TurretMechanism<SimpleRotaryMechanism<M, E>>, ConfigError> {
        let inner = self.mechanism(motor, encoder)?;
        match self.range()? {
            Some((min, max)) => TurretMechanism::new(inner, min, max),
            None => TurretMechanism::half_turn(inner),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub max_velocity: f64,
    pub max_acceleration: f64,
    #[serde(default)]
    pub max_jerk: Option<f64>,
}

impl LimitsConfig {
    pub fn limits(&self) -> Result<Limits, ConfigError> {
        Limits::new(
            self.max_velocity,
            self.max_acceleration,
            self.max_jerk.unwrap_or(f64::INFINITY),
        )
    }

    pub fn generator(&self) -> Result<ProfileGenerator, ConfigError> {
        self.limits().map(ProfileGenerator::new)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquareConfig {
    pub drive_length: f64,
    pub turn_degrees: f64,
    /// Radians.
    pub steer_tolerance: f64,
    pub drive_limits: LimitsConfig,
    pub steer_limits: LimitsConfig,
}

impl Default for SquareConfig {
    fn default() -> Self {
        Self {
            drive_length: 1.0,
            turn_degrees: 90.0,
            steer_tolerance: 0.02,
            drive_limits: LimitsConfig {
                max_velocity: 1.0,
                max_acceleration: 1.0,
                max_jerk: Some(1.0),
            },
            steer_limits: LimitsConfig {
                max_velocity: 20.0,
                max_acceleration: 50.0,
                max_jerk: None,
            },
        }
    }
}

impl SquareConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("drive length", self.drive_length)?;
        finite("turn", self.turn_degrees)?;
        positive("steer tolerance", self.steer_tolerance)?;
        self.drive_limits.limits()?;
        self.steer_limits.limits()?;
        Ok(())
    }

    pub fn turn(&self) -> Angle {
        Angle::new::<degree>(self.turn_degrees)
    }
}
