//! Environment lookup: one declared variable per option.
//!
//! The engine never reads the process environment itself; callers pass the
//! variables in. Options already set on the command line are skipped before
//! their variable is even validated.

use std::collections::HashMap;
use std::ffi::OsString;

use tracing::trace;

use crate::error::OptfigError;
use crate::schema::Schema;
use crate::validate::validate;
use crate::value::OptionValue;

/// Collect environment pairs into a lookup map.
///
/// Takes an iterator so tests can pass synthetic data instead of `std::env::vars()`.
pub fn env_map(vars: impl IntoIterator<Item = (String, String)>) -> HashMap<String, String> {
    vars.into_iter().collect()
}

/// Like [`env_map`] over `std::env::vars_os()`: pairs whose name or value is
/// not valid UTF-8 are left out, so they read as unset.
pub fn env_map_os(vars: impl IntoIterator<Item = (OsString, OsString)>) -> HashMap<String, String> {
    vars.into_iter()
        .filter_map(|(name, value)| match (name.into_string(), value.into_string()) {
            (Ok(name), Ok(value)) => Some((name, value)),
            (name, _) => {
                trace!(name = ?name, "skipping non-UTF-8 environment entry");
                None
            }
        })
        .collect()
}

/// Read the declared environment variable of every option not already set by
/// a higher-precedence source.
///
/// `skip[i]` marks option `i` as already supplied. Absent or empty variables
/// leave the option unset. Returns `(option index, value)` pairs in
/// declaration order.
pub fn read_env(
    schema: &Schema,
    vars: &HashMap<String, String>,
    skip: &[bool],
) -> Result<Vec<(usize, OptionValue)>, OptfigError> {
    let mut found = Vec::new();

    for (index, spec) in schema.options().iter().enumerate() {
        let Some(env_name) = spec.env.as_deref().filter(|n| !n.is_empty()) else {
            continue;
        };
        if skip.get(index).copied().unwrap_or(false) {
            trace!(option = %spec.name, env_name, "set on command line; environment not consulted");
            continue;
        }
        let Some(raw) = vars.get(env_name).filter(|v| !v.is_empty()) else {
            continue;
        };

        let value = validate(spec.value_type, raw).map_err(|source| OptfigError::InvalidEnvValue {
            env_name: env_name.to_string(),
            option: spec.name.clone(),
            value: raw.clone(),
            source,
        })?;
        trace!(option = %spec.name, env_name, "environment value accepted");
        found.push((index, value));
    }

    Ok(found)
}
