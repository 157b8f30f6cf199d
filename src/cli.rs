//! Command-line scanning.
//!
//! Tokens are matched by exact string equality against `-<short>` and
//! `--<long>`; there is no `--key=value` form and no bundling of short flags.
//! When several options could match a token the first one in declaration
//! order wins. [`Schema::new`](crate::Schema::new) refuses duplicate switches,
//! so in practice at most one option matches.
//!
//! Boolean options are switches and never consume an argument. Every other
//! option consumes exactly the next token, which is validated before it is
//! accepted. Scanning stops at the first error.

use std::ffi::OsString;

use tracing::trace;

use crate::error::OptfigError;
use crate::schema::Schema;
use crate::validate::validate;
use crate::value::OptionValue;

/// Convert raw process arguments to text. An argument that is not valid
/// UTF-8 cannot match any switch, so it is reported as an unknown option.
pub fn utf8_args(args: impl IntoIterator<Item = OsString>) -> Result<Vec<String>, OptfigError> {
    args.into_iter()
        .map(|arg| {
            arg.into_string().map_err(|raw| OptfigError::UnknownOption {
                token: raw.to_string_lossy().into_owned(),
            })
        })
        .collect()
}

/// Scan `args` (program name excluded) and return `(option index, value)`
/// pairs in the order they appeared.
///
/// An option given twice shows up twice; the caller keeps the last one.
pub fn scan_args(
    schema: &Schema,
    args: &[String],
) -> Result<Vec<(usize, OptionValue)>, OptfigError> {
    let mut found = Vec::new();
    let mut tokens = args.iter();

    while let Some(token) = tokens.next() {
        let Some((index, spec)) = schema.find_switch(token) else {
            return Err(OptfigError::UnknownOption {
                token: token.clone(),
            });
        };

        if !spec.value_type.takes_argument() {
            trace!(option = %spec.name, %token, "boolean switch");
            found.push((index, OptionValue::Bool(true)));
            continue;
        }

        let Some(raw) = tokens.next() else {
            return Err(OptfigError::MissingArgument {
                token: token.clone(),
            });
        };

        let value =
            validate(spec.value_type, raw).map_err(|source| OptfigError::InvalidArgument {
                token: token.clone(),
                option: spec.name.clone(),
                value: raw.clone(),
                source,
            })?;
        trace!(option = %spec.name, %token, "argument accepted");
        found.push((index, value));
    }

    Ok(found)
}
