//! Type validation: turn a raw value into an [`OptionValue`] or explain why
//! it does not fit the declared [`ValueType`].
//!
//! Command-line arguments and environment variables arrive as text and go
//! through [`validate`]. Config-file leaves are already typed by the parser
//! and go through [`validate_tree_value`], which renders scalars back to text
//! so both paths share the same rules.
//!
//! Booleans are the exception. As text, presence means `true` and only the
//! words `false`, `no`, `off` and `0` turn a flag off. A file leaf names its
//! value explicitly, so it must be a native boolean or one of the boolean
//! words.

use toml::Value;

use crate::error::ValidationError;
use crate::types::ValueType;
use crate::value::{OptionValue, SocketAddress};

/// Validate a textual raw value against `ty`.
pub fn validate(ty: ValueType, raw: &str) -> Result<OptionValue, ValidationError> {
    match ty {
        ValueType::Int => raw
            .parse::<i64>()
            .map(OptionValue::Int)
            .map_err(|_| ValidationError::BadInt {
                value: raw.to_string(),
            }),
        ValueType::String => Ok(OptionValue::Str(raw.to_string())),
        ValueType::Boolean => Ok(OptionValue::Bool(bool_word(raw).unwrap_or(true))),
        ValueType::Array => Ok(OptionValue::Seq(vec![raw.to_string()])),
        ValueType::IpPort => parse_port(raw)
            .map(|p| OptionValue::Int(i64::from(p)))
            .ok_or_else(|| ValidationError::BadPort {
                value: raw.to_string(),
            }),
        ValueType::HostPort | ValueType::IpAddress => parse_host_port(raw).map(OptionValue::Addr),
    }
}

/// Validate a typed config-file leaf against `ty`.
pub fn validate_tree_value(ty: ValueType, value: &Value) -> Result<OptionValue, ValidationError> {
    match (ty, value) {
        (ValueType::Boolean, Value::Boolean(b)) => Ok(OptionValue::Bool(*b)),
        (ValueType::Boolean, other) => {
            let text = scalar_text(other)?;
            bool_word(&text)
                .map(OptionValue::Bool)
                .ok_or(ValidationError::BadBool { value: text })
        }
        (ValueType::Array, Value::Array(items)) => items
            .iter()
            .map(scalar_text)
            .collect::<Result<Vec<_>, _>>()
            .map(OptionValue::Seq),
        (_, other) => validate(ty, &scalar_text(other)?),
    }
}

fn scalar_text(value: &Value) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Datetime(dt) => Ok(dt.to_string()),
        Value::Array(_) => Err(ValidationError::NotScalar {
            found: "an array".into(),
        }),
        Value::Table(_) => Err(ValidationError::NotScalar {
            found: "a table".into(),
        }),
    }
}

/// Empty text means the flag is present.
fn bool_word(raw: &str) -> Option<bool> {
    let lowered = raw.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "" | "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u16>().ok()
}

/// Split on the last colon; `[v6]:port` hosts lose their brackets.
fn parse_host_port(raw: &str) -> Result<SocketAddress, ValidationError> {
    let bad = |reason: &str| ValidationError::BadAddress {
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let (host, port) = raw.rsplit_once(':').ok_or_else(|| bad("missing port"))?;

    let host = match host.strip_prefix('[') {
        Some(inner) => inner
            .strip_suffix(']')
            .ok_or_else(|| bad("unterminated '[' in host"))?,
        None if host.contains(':') => return Err(bad("too many colons in address")),
        None => host,
    };
    if host.is_empty() {
        return Err(bad("missing host"));
    }

    let port = parse_port(port).ok_or_else(|| bad("port must be a number in 0-65535"))?;

    Ok(SocketAddress {
        host: host.to_string(),
        port,
    })
}
