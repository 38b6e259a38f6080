//! Hierarchical, lazily evaluated value publishing.
//!
//! A [`Logger`] names a subtree (`drive/front_left/servo`) and hands
//! flattened primitives to a [`Sink`]. Values are produced by closures that
//! only run when the logger's level admits them, so disabled telemetry costs
//! one comparison per call.

use core::fmt;
use std::{cell::RefCell, rc::Rc};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::error::ConfigError;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    /// Always of interest, including during competition.
    #[default]
    Comp,
}

impl Level {
    /// Whether a logger enabled at `self` publishes values logged at `level`.
    #[inline]
    pub fn admit(self, level: Level) -> bool {
        level >= self
    }
}

/// A leaf value as it reaches a sink.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Bool(bool),
    Number(f64),
    Numbers(Vec<f64>),
    Text(String),
}

pub trait Sink {
    fn publish(&self, path: &str, level: Level, value: Primitive);
}

/// Drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl Sink for NullSink {
    fn publish(&self, _path: &str, _level: Level, _value: Primitive) {}
}

/// Forwards values as `tracing` events under the `telemetry` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn publish(&self, path: &str, level: Level, value: Primitive) {
        match level {
            Level::Trace => trace!(target: "telemetry", %path, ?value),
            Level::Debug => debug!(target: "telemetry", %path, ?value),
            Level::Comp => info!(target: "telemetry", %path, ?value),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub path: String,
    pub level: Level,
    pub value: Primitive,
}

/// Keeps every published value in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: RefCell<Vec<Record>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.borrow().clone()
    }

    /// Most recent value published at `path`.
    pub fn latest(&self, path: &str) -> Option<Primitive> {
        self.records
            .borrow()
            .iter()
            .rev()
            .find(|record| record.path == path)
            .map(|record| record.value.clone())
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }
}

impl Sink for MemorySink {
    fn publish(&self, path: &str, level: Level, value: Primitive) {
        self.records.borrow_mut().push(Record {
            path: path.to_owned(),
            level,
            value,
        });
    }
}

#[derive(Clone)]
pub struct Logger {
    sink: Rc<dyn Sink>,
    root: String,
    enabled: Level,
}

impl Logger {
    pub fn new(sink: Rc<dyn Sink>, root: &str, enabled: Level) -> Result<Self, ConfigError> {
        let reason = if root.is_empty() {
            Some("empty")
        } else if root.starts_with('/') {
            Some("leading slash")
        } else if root.ends_with('/') {
            Some("trailing slash")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(ConfigError::InvalidRoot {
                root: root.to_owned(),
                reason,
            });
        }
        Ok(Self {
            sink,
            root: root.to_owned(),
            enabled,
        })
    }

    /// A logger that publishes nothing.
    pub fn disabled() -> Self {
        Self {
            sink: Rc::new(NullSink),
            root: String::from("disabled"),
            enabled: Level::Comp,
        }
    }

    /// Logger for a subordinate part, e.g. `child("front_left")`.
    pub fn child(&self, stem: &str) -> Self {
        Self {
            sink: Rc::clone(&self.sink),
            root: join(&self.root, stem.trim_matches('/')),
            enabled: self.enabled,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn enabled(&self) -> Level {
        self.enabled
    }

    /// Publishes `value()` under `root/leaf` if `level` is admitted.
    ///
    /// Structs become one path per field, sequences of numbers stay a single
    /// `Numbers` value and `None` publishes nothing.
    pub fn log<T, F>(&self, level: Level, leaf: &str, value: F)
    where
        T: Serialize,
        F: FnOnce() -> T,
    {
        if !self.enabled.admit(level) {
            return;
        }
        let path = join(&self.root, leaf);
        match serde_json::to_value(value()) {
            Ok(value) => self.walk(&path, level, value),
            Err(error) => warn!(%path, %error, "value cannot be encoded"),
        }
    }

    fn walk(&self, path: &str, level: Level, value: Value) {
        match value {
            Value::Null => {}
            Value::Bool(value) => self.sink.publish(path, level, Primitive::Bool(value)),
            Value::Number(value) => {
                if let Some(value) = value.as_f64() {
                    self.sink.publish(path, level, Primitive::Number(value));
                }
            }
            Value::String(value) => self.sink.publish(path, level, Primitive::Text(value)),
            Value::Array(items) if items.iter().all(Value::is_number) => {
                let values = items.iter().filter_map(Value::as_f64).collect();
                self.sink.publish(path, level, Primitive::Numbers(values));
            }
            Value::Array(items) => {
                for (i, item) in items.into_iter().enumerate() {
                    self.walk(&join(path, &i.to_string()), level, item);
                }
            }
            Value::Object(fields) => {
                for (key, item) in fields {
                    self.walk(&join(path, &key), level, item);
                }
            }
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::disabled()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("root", &self.root)
            .field("enabled", &self.enabled)
            .finish()
    }
}

fn join(a: &str, b: &str) -> String {
    format!("{}/{}", a, b)
}
