use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ValidationError;

/// Where to search for a config file when no explicit path is given.
///
/// Listed in **priority-ascending** order on the builder: the last entry that
/// contains the file wins.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Platform config directory (XDG on Linux, ~/Library/Application Support on macOS).
    Platform,
    /// A subdirectory under the user's home directory, e.g. `Home(".myapp")`.
    Home(&'static str),
    /// Current working directory.
    Cwd,
    /// An explicit directory.
    Path(PathBuf),
}

/// The declared type of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Int,
    String,
    /// A switch: never takes an argument on the command line.
    Boolean,
    Array,
    /// A bare port number.
    IpPort,
    HostPort,
    IpAddress,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::Array => "array",
            ValueType::IpPort => "ip-port",
            ValueType::HostPort => "host-port",
            ValueType::IpAddress => "ip-address",
        }
    }

    pub fn takes_argument(&self) -> bool {
        *self != ValueType::Boolean
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" | "integer" => Ok(ValueType::Int),
            "string" | "str" => Ok(ValueType::String),
            "boolean" | "bool" => Ok(ValueType::Boolean),
            "array" => Ok(ValueType::Array),
            "ip-port" => Ok(ValueType::IpPort),
            "host-port" => Ok(ValueType::HostPort),
            "ip-address" => Ok(ValueType::IpAddress),
            other => Err(ValidationError::UnknownType {
                name: other.to_string(),
            }),
        }
    }
}
