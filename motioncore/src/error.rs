use thiserror::Error;

/// Errors raised while building the mechanism graph.
///
/// These are programming or configuration mistakes; nothing here is ever
/// produced from inside a control cycle.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("invalid range: min {min} must be less than max {max}")]
    InvalidRange { min: f64, max: f64 },

    #[error("invalid telemetry root {root:?}: {reason}")]
    InvalidRoot { root: String, reason: &'static str },

    #[error("failed to parse config: {source}")]
    Parse {
        #[from]
        source: toml::de::Error,
    },

    #[error("failed to read config: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub(crate) fn positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

pub(crate) fn finite(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { name, value })
    }
}
