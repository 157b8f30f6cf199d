//! Error types.
//!
//! [`OptfigError`] is the single error returned by loading and resolution.
//! Every variant that comes out of a resolution pass can be classified with
//! [`OptfigError::stage`], [`OptfigError::option`] and
//! [`OptfigError::source_kind`], so callers can report *where* a value came
//! from without parsing the message.
//!
//! [`ValidationError`] (a raw value does not fit its declared type) and
//! [`SchemaError`] (the schema itself is inconsistent) are smaller enums that
//! get wrapped into `OptfigError` with the surrounding context.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::ValueType;
use crate::value::Source;

/// A raw value failed to validate against its declared [`ValueType`](crate::ValueType).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{value}' is not a base-10 integer")]
    BadInt { value: String },

    #[error("'{value}' is not a boolean (expected true/false, yes/no, on/off or 1/0)")]
    BadBool { value: String },

    #[error("'{value}' is not a host:port address: {reason}")]
    BadAddress { value: String, reason: String },

    #[error("'{value}' is not a port number in 0-65535")]
    BadPort { value: String },

    #[error("expected a single value, found {found}")]
    NotScalar { found: String },

    #[error("unknown value type '{name}'")]
    UnknownType { name: String },
}

/// The schema violates one of its construction invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("option name cannot be empty")]
    EmptyName,

    #[error("duplicate option name: {0}")]
    DuplicateName(String),

    #[error("short switch -{short} is declared by both '{first}' and '{second}'")]
    DuplicateShort {
        short: char,
        first: String,
        second: String,
    },

    #[error("long switch --{long} is declared by both '{first}' and '{second}'")]
    DuplicateLong {
        long: String,
        first: String,
        second: String,
    },

    #[error("invalid long switch '{long}' on option '{option}'")]
    InvalidLong { option: String, long: String },

    #[error("invalid short switch '{short}' on option '{option}'")]
    InvalidShort { option: String, short: char },

    #[error("invalid config key '{key}' on option '{option}'")]
    InvalidKey { option: String, key: String },

    #[error("config key '{second_key}' of '{second}' overlaps '{first_key}' of '{first}'")]
    ConflictingKey {
        first: String,
        first_key: String,
        second: String,
        second_key: String,
    },

    #[error("option '{0}' declares only half of a short/long switch pair")]
    IncompleteSwitch(String),

    #[error("option '{option}': {source}")]
    UnknownType {
        option: String,
        source: ValidationError,
    },

    #[error("failed to parse schema definition: {0}")]
    Definition(String),
}

/// The phase of a resolution pass an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Builder or schema setup, before any source is read.
    Setup,
    CommandLine,
    Environment,
    ConfigFile,
    /// Writing winning values back into the file tree.
    Merge,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Setup => "setup",
            Stage::CommandLine => "command line",
            Stage::Environment => "environment",
            Stage::ConfigFile => "config file",
            Stage::Merge => "merge",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum OptfigError {
    #[error("Failed to read config file {path}: {source}")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(code(optfig::config_file::read), help("check that the file exists and is readable"))
    )]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(optfig::config_file::parse)))]
    ConfigFileParse { path: PathBuf, message: String },

    #[error("Cannot write '{path}' into the config tree: '{segment}' {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(optfig::config_file::malformed)))]
    MalformedTree {
        path: String,
        segment: String,
        reason: String,
    },

    #[error("Invalid option '{token}'")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(code(optfig::cli::unknown_option), help("run with --help to list the accepted options"))
    )]
    UnknownOption { token: String },

    #[error("Missing argument for option '{token}'")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(optfig::cli::missing_argument)))]
    MissingArgument { token: String },

    #[error("Invalid argument for option '{token}' ({option}): {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(optfig::cli::invalid_argument)))]
    InvalidArgument {
        token: String,
        option: String,
        value: String,
        source: ValidationError,
    },

    #[error("Invalid value in environment variable {env_name} ({option}): {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(optfig::env::invalid_value)))]
    InvalidEnvValue {
        env_name: String,
        option: String,
        value: String,
        source: ValidationError,
    },

    #[error("Invalid value for '{key}' in {path} ({option}): {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(optfig::config_file::invalid_value)))]
    InvalidFileValue {
        key: String,
        path: PathBuf,
        option: String,
        value: String,
        source: ValidationError,
    },

    #[error("Invalid schema: {0}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(optfig::schema)))]
    Schema(#[from] SchemaError),

    #[error("Config option '{0}' is not declared in the schema")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(optfig::setup::config_option)))]
    UnknownConfigOption(String),

    #[error("Config option '{option}' must be a string option, not {value_type}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(optfig::setup::config_option_type)))]
    ConfigOptionType { option: String, value_type: ValueType },

    #[error("A schema is required; call .schema() on the builder")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(optfig::setup::schema)))]
    SchemaRequired,

    #[error("App name is required to search for a config file; call .app_name() or .file_name() on the builder")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(optfig::setup::app_name)))]
    AppNameRequired,
}

impl OptfigError {
    /// The resolution phase this error was raised in.
    pub fn stage(&self) -> Stage {
        match self {
            OptfigError::UnknownOption { .. }
            | OptfigError::MissingArgument { .. }
            | OptfigError::InvalidArgument { .. } => Stage::CommandLine,
            OptfigError::InvalidEnvValue { .. } => Stage::Environment,
            OptfigError::ConfigFileRead { .. }
            | OptfigError::ConfigFileParse { .. }
            | OptfigError::InvalidFileValue { .. } => Stage::ConfigFile,
            OptfigError::MalformedTree { .. } => Stage::Merge,
            OptfigError::Schema(_)
            | OptfigError::UnknownConfigOption(_)
            | OptfigError::ConfigOptionType { .. }
            | OptfigError::SchemaRequired
            | OptfigError::AppNameRequired => Stage::Setup,
        }
    }

    /// Name of the option whose value was rejected, when there is one.
    pub fn option(&self) -> Option<&str> {
        match self {
            OptfigError::InvalidArgument { option, .. }
            | OptfigError::InvalidEnvValue { option, .. }
            | OptfigError::InvalidFileValue { option, .. } => Some(option),
            _ => None,
        }
    }

    /// The input channel that supplied the offending data.
    pub fn source_kind(&self) -> Option<Source> {
        match self.stage() {
            Stage::CommandLine => Some(Source::CommandLine),
            Stage::Environment => Some(Source::Environment),
            Stage::ConfigFile => Some(Source::File),
            Stage::Merge | Stage::Setup => None,
        }
    }

    /// The rejected raw value, when the error is a validation failure.
    pub fn raw_value(&self) -> Option<&str> {
        match self {
            OptfigError::InvalidArgument { value, .. }
            | OptfigError::InvalidEnvValue { value, .. }
            | OptfigError::InvalidFileValue { value, .. } => Some(value),
            _ => None,
        }
    }
}
