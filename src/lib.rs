//! One option set from three sources. Declare your options once, hand over
//! the command line and environment, and get back typed values.
//!
//! Optfig reconciles values for the same logical setting coming from
//! command-line switches, environment variables, and a config file. Every
//! value is validated against its declared type, and the winner is picked by a
//! fixed precedence.
//!
//! ```ignore
//! let schema = Schema::new(vec![
//!     OptionSpec::new("port", ValueType::Int)
//!         .switch('p', "port")
//!         .env("APP_PORT")
//!         .key("server.port")
//!         .summary("port")
//!         .description("Port to listen on"),
//! ])?;
//!
//! let options = Optfig::builder()
//!     .schema(schema)
//!     .app_name("myapp")
//!     .load()?;
//! let port = options.get_int("port");
//! ```
//!
//! That call scans `std::env::args_os()`, reads `APP_PORT`, looks for
//! `myapp.toml` in the platform config directory, and returns the winning
//! value together with where it came from.
//!
//! # Declaring options
//!
//! An [`OptionSpec`] names an option, gives it a [`ValueType`], and lists the
//! places it may be set:
//!
//! - **`switch('p', "port")`** accepts `-p <value>` and `--port <value>`.
//!   Boolean options are bare switches and never take an argument.
//! - **`env("APP_PORT")`** reads one environment variable. Absent or empty
//!   means unset.
//! - **`key("server.port")`** is a dotted path into the config file.
//!
//! Options are collected into a [`Schema`], which refuses duplicate names and
//! switches up front. Schemas can also be written in TOML with
//! [`Schema::from_toml_str`]. Nested `child` options are flattened to
//! `parent.child` names.
//!
//! # Value types
//!
//! | type         | accepted text                   | resolves to         |
//! |--------------|---------------------------------|---------------------|
//! | `int`        | base-10 `i64`                   | `OptionValue::Int`  |
//! | `string`     | anything                        | `OptionValue::Str`  |
//! | `boolean`    | empty, true/yes/on/1, false/... | `OptionValue::Bool` |
//! | `array`      | one value, or a file array      | `OptionValue::Seq`  |
//! | `ip-port`    | `0`-`65535`                     | `OptionValue::Int`  |
//! | `host-port`  | `host:port`, `[v6]:port`        | `OptionValue::Addr` |
//! | `ip-address` | `host:port`, `[v6]:port`        | `OptionValue::Addr` |
//!
//! # Precedence
//!
//! ```text
//! Config file           dotted key lookup
//!        ↑ overridden by
//! Environment vars      one variable per option
//!        ↑ overridden by
//! Command line          -s / --long
//! ```
//!
//! Values replace each other; arrays are never concatenated. An option that no
//! source sets is simply absent from the result.
//!
//! # Finding the config file
//!
//! The first of these that applies is read:
//!
//! 1. [`config_file()`](OptfigBuilder::config_file) on the builder.
//! 2. The value of the [`config_option()`](OptfigBuilder::config_option)
//!    (say `--config` or `APP_CONFIG`).
//! 3. The highest-priority existing `{dir}/{file_name}` across the
//!    [`SearchPath`]s, listed priority-ascending.
//!
//! No file at all is fine: the pass continues with an empty tree. Files are
//! TOML by default; [`JsonParser`], [`HclParser`] or any closure returning a
//! `toml::Table` can be plugged in with [`parser()`](OptfigBuilder::parser).
//! Repeated blocks (`[[log-settings]]`, or a repeated HCL block) are sequences
//! whose first element is consulted.
//!
//! # The effective tree
//!
//! [`OptfigBuilder::resolve`] returns a [`Resolution`] that also carries the
//! config tree after command-line and environment values were written back
//! into it under their keys, so a program can hand the same tree to code that
//! reads the file directly.
//!
//! # Errors
//!
//! All fallible operations return [`OptfigError`]. Each error knows its
//! [`Stage`], the option and raw value involved, and the [`Source`] that
//! supplied it. [`help::failure_report`] pairs the message with usage text
//! for printing before a non-zero exit. With the `rich-errors` feature the
//! error also implements `miette::Diagnostic`.
//!
//! # Logging
//!
//! The pass emits `tracing` events: `debug` for per-stage counts and the file
//! chosen, `trace` for individual option decisions. No subscriber is
//! installed by the library.

pub mod error;
pub mod help;
pub mod types;

mod builder;
mod cli;
mod env;
mod file;
mod resolve;
mod schema;
mod validate;
mod value;

#[cfg(test)]
mod fixtures;

pub use builder::{Optfig, OptfigBuilder};
pub use error::{OptfigError, SchemaError, Stage, ValidationError};
pub use cli::utf8_args;
pub use file::{FileTree, HclParser, JsonParser, TomlParser, TreeParser};
pub use resolve::{Resolution, ResolveInput, resolve};
pub use schema::{CliSwitch, OptionSpec, Schema};
pub use types::{SearchPath, ValueType};
pub use validate::{validate, validate_tree_value};
pub use value::{OptionValue, ResolvedOptions, SocketAddress, Source};
