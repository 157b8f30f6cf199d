//! Usage text rendered from the schema.
//!
//! ```text
//! Usage: server [options]
//!   -p|--port     <port>  : Port to listen on
//!   -v|--verbose          : Enable verbose output
//!
//! Environment:
//!   APP_PORT  port
//! ```
//!
//! The long-switch column is two wider than the longest long switch; the
//! placeholder column is two wider than the longest summary, plus the angle
//! brackets. Boolean switches take no argument, so their placeholder is
//! blank.

use crate::error::OptfigError;
use crate::schema::Schema;

/// Render the usage text for `program`.
pub fn usage(schema: &Schema, program: &str) -> String {
    let switched: Vec<_> = schema
        .options()
        .iter()
        .filter_map(|o| o.switch.as_ref().map(|s| (o, s)))
        .collect();

    let long_width = switched.iter().map(|(_, s)| s.long.len()).max().unwrap_or(0) + 2;
    let summary_width = switched
        .iter()
        .filter(|(o, _)| o.value_type.takes_argument())
        .map(|(o, _)| o.summary.len())
        .max()
        .unwrap_or(0)
        + 2;

    let mut out = format!("Usage: {program} [options]\n");
    for (spec, switch) in &switched {
        let placeholder = if spec.value_type.takes_argument() {
            format!("<{}>", spec.summary)
        } else {
            String::new()
        };
        out.push_str(&format!(
            "  -{}|--{:<long_width$}{:<ph_width$}: {}\n",
            switch.short,
            switch.long,
            placeholder,
            spec.description,
            ph_width = summary_width + 2,
        ));
    }

    let with_env: Vec<_> = schema
        .options()
        .iter()
        .filter_map(|o| o.env.as_deref().map(|e| (e, o.name.as_str())))
        .collect();
    if !with_env.is_empty() {
        let env_width = with_env.iter().map(|(e, _)| e.len()).max().unwrap_or(0) + 2;
        out.push_str("\nEnvironment:\n");
        for (env, name) in with_env {
            out.push_str(&format!("  {env:<env_width$}{name}\n"));
        }
    }

    out
}

/// The error message followed by the usage text, ready to print before a
/// non-zero exit.
pub fn failure_report(err: &OptfigError, schema: &Schema, program: &str) -> String {
    format!("{program}: {err}\n\n{}", usage(schema, program))
}
