//! Value types shared between the config translator, the preset applier and
//! the JACK control client

use serde::Serialize;
use std::fmt;

/// A setting value as read from the QjackCtl config file
///
/// `Absent` stands for an empty value in the file and means
/// "reset this parameter to the server default".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Absent,
}

impl SettingValue {
    /// Convert a raw config string: `true`/`false` literals, empty string,
    /// base-10 integers, anything else is kept as text
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "false" => Self::Bool(false),
            "true" => Self::Bool(true),
            "" => Self::Absent,
            other => other
                .parse::<i64>()
                .map(Self::Int)
                .unwrap_or_else(|_| Self::Str(other.to_string())),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Absent => f.write_str("<absent>"),
        }
    }
}

/// A typed JACK parameter value as carried over the bus
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    Byte(u8),
    Str(String),
}

impl ParamValue {
    fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Int32(i) => Some(i64::from(*i)),
            Self::UInt32(u) => Some(i64::from(*u)),
            Self::Byte(b) => Some(i64::from(*b)),
            Self::Str(_) => None,
        }
    }

    /// Compare by value, ignoring the wire type of numeric values
    ///
    /// The server reports `rate` as `u32` while a preset may carry it as
    /// `i32`; both denote the same setting and must not trigger a write.
    pub fn same_as(&self, other: &ParamValue) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (a, b) => match (a.as_integer(), b.as_integer()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int32(i) => write!(f, "{i}"),
            Self::UInt32(u) => write!(f, "{u}"),
            Self::Byte(b) => write!(f, "{:?}", char::from(*b)),
            Self::Str(s) => write!(f, "{s:?}"),
        }
    }
}
