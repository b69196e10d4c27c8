//! Settings schema: which JACK parameters a preset controls
//!
//! The descriptor tables are fixed at build time. Declaration order is the
//! order in which the preset applier visits them.

use serde::Serialize;
use std::fmt;

use crate::types::{ParamValue, SettingValue};

/// Top-level parameter container on the JACK configure interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Engine,
    Driver,
}

impl Component {
    /// Engine before driver: driver parameters may depend on engine mode
    pub const ALL: [Component; 2] = [Component::Engine, Component::Driver];

    pub fn as_str(self) -> &'static str {
        match self {
            Component::Engine => "engine",
            Component::Driver => "driver",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a preset value is turned into a bus value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Always sent as a signed 32-bit integer
    Int32,
    /// Booleans stay booleans, integers become unsigned, text stays text
    Infer,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoercionError {
    #[error("{value} does not fit a {target} parameter")]
    OutOfRange { value: i64, target: &'static str },
    #[error("text value {0:?} cannot be sent as an integer parameter")]
    NotAnInteger(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingDescriptor {
    pub name: &'static str,
    pub component: Component,
    pub coercion: Coercion,
}

impl SettingDescriptor {
    const fn new(component: Component, name: &'static str, coercion: Coercion) -> Self {
        Self {
            name,
            component,
            coercion,
        }
    }

    /// Coerce a preset value into the value written to the server
    ///
    /// Returns `Ok(None)` for an absent value, which callers treat as a reset.
    pub fn coerce(&self, value: &SettingValue) -> Result<Option<ParamValue>, CoercionError> {
        let coerced = match (self.coercion, value) {
            (_, SettingValue::Absent) => return Ok(None),
            (Coercion::Int32, SettingValue::Bool(b)) => ParamValue::Int32(i32::from(*b)),
            (Coercion::Int32, SettingValue::Int(i)) => i32::try_from(*i)
                .map(ParamValue::Int32)
                .map_err(|_| CoercionError::OutOfRange {
                    value: *i,
                    target: "int32",
                })?,
            (Coercion::Int32, SettingValue::Str(s)) => {
                return Err(CoercionError::NotAnInteger(s.clone()));
            }
            (Coercion::Infer, SettingValue::Bool(b)) => ParamValue::Bool(*b),
            (Coercion::Infer, SettingValue::Int(i)) => u32::try_from(*i)
                .map(ParamValue::UInt32)
                .map_err(|_| CoercionError::OutOfRange {
                    value: *i,
                    target: "uint32",
                })?,
            (Coercion::Infer, SettingValue::Str(s)) => ParamValue::Str(s.clone()),
        };
        Ok(Some(coerced))
    }
}

use Coercion::{Infer, Int32};
use Component::{Driver, Engine};

pub const ENGINE_SETTINGS: &[SettingDescriptor] = &[
    SettingDescriptor::new(Engine, "realtime", Infer),
    SettingDescriptor::new(Engine, "realtime-priority", Int32),
    SettingDescriptor::new(Engine, "port-max", Infer),
    SettingDescriptor::new(Engine, "verbose", Infer),
    SettingDescriptor::new(Engine, "client-timeout", Int32),
];

pub const DRIVER_SETTINGS: &[SettingDescriptor] = &[
    SettingDescriptor::new(Driver, "driver", Infer),
    SettingDescriptor::new(Driver, "capture", Infer),
    SettingDescriptor::new(Driver, "playback", Infer),
    SettingDescriptor::new(Driver, "device", Infer),
    SettingDescriptor::new(Driver, "rate", Infer),
    SettingDescriptor::new(Driver, "period", Infer),
    SettingDescriptor::new(Driver, "nperiods", Infer),
    SettingDescriptor::new(Driver, "outchannels", Infer),
    SettingDescriptor::new(Driver, "inchannels", Infer),
    SettingDescriptor::new(Driver, "channels", Int32),
    SettingDescriptor::new(Driver, "midi", Infer),
    SettingDescriptor::new(Driver, "hwmon", Infer),
    SettingDescriptor::new(Driver, "hwmeter", Infer),
    SettingDescriptor::new(Driver, "shorts", Infer),
    SettingDescriptor::new(Driver, "softmode", Infer),
];

/// Descriptors for one component, in declaration order
pub fn settings_for(component: Component) -> &'static [SettingDescriptor] {
    match component {
        Component::Engine => ENGINE_SETTINGS,
        Component::Driver => DRIVER_SETTINGS,
    }
}
