//! Typed option values and the resolved option set.

use std::fmt;

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use toml::Value;

/// The input channel a value was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    File,
    Environment,
    CommandLine,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Source::File => "config file",
            Source::Environment => "environment",
            Source::CommandLine => "command line",
        };
        f.write_str(name)
    }
}

/// A validated `host:port` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SocketAddress {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for SocketAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl Serialize for SocketAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A validated option value. `ip-port` options resolve to [`OptionValue::Int`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Int(i64),
    Str(String),
    Bool(bool),
    Seq(Vec<String>),
    Addr(SocketAddress),
}

impl OptionValue {
    /// Convert into the value written into the effective file tree.
    pub fn to_toml(&self) -> Value {
        match self {
            OptionValue::Int(i) => Value::Integer(*i),
            OptionValue::Str(s) => Value::String(s.clone()),
            OptionValue::Bool(b) => Value::Boolean(*b),
            OptionValue::Seq(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            OptionValue::Addr(addr) => Value::String(addr.to_string()),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Int(i) => write!(f, "{i}"),
            OptionValue::Str(s) => write!(f, "{s:?}"),
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Seq(items) => write!(f, "{items:?}"),
            OptionValue::Addr(addr) => write!(f, "{addr}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    name: String,
    value: OptionValue,
    source: Source,
}

/// The outcome of one resolution pass: option name → typed value, in schema
/// declaration order. Options no source supplied are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedOptions {
    entries: Vec<Entry>,
}

impl ResolvedOptions {
    pub(crate) fn push(&mut self, name: &str, value: OptionValue, source: Source) {
        self.entries.push(Entry {
            name: name.to_string(),
            value,
            source,
        });
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entry(name).map(|e| &e.value)
    }

    /// Which source the resolved value of `name` came from.
    pub fn source_of(&self, name: &str) -> Option<Source> {
        self.entry(name).map(|e| e.source)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            OptionValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn get_seq(&self, name: &str) -> Option<&[String]> {
        match self.get(name)? {
            OptionValue::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn get_addr(&self, name: &str) -> Option<&SocketAddress> {
        match self.get(name)? {
            OptionValue::Addr(addr) => Some(addr),
            _ => None,
        }
    }

    /// Iterate `(name, value, source)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue, Source)> {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), &e.value, e.source))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as a JSON object, keys in declaration order.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for ResolvedOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.name, &entry.value)?;
        }
        map.end()
    }
}

impl fmt::Display for ResolvedOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{} = {}", entry.name, entry.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResolvedOptions {
        let mut opts = ResolvedOptions::default();
        opts.push("port", OptionValue::Int(9090), Source::CommandLine);
        opts.push("name", OptionValue::Str("svc".into()), Source::File);
        opts.push("verbose", OptionValue::Bool(true), Source::Environment);
        opts.push(
            "listen",
            OptionValue::Addr(SocketAddress {
                host: "0.0.0.0".into(),
                port: 80,
            }),
            Source::File,
        );
        opts.push("tags", OptionValue::Seq(vec!["a".into()]), Source::File);
        opts
    }

    #[test]
    fn typed_accessors() {
        let opts = sample();
        assert_eq!(opts.get_int("port"), Some(9090));
        assert_eq!(opts.get_str("name"), Some("svc"));
        assert_eq!(opts.get_bool("verbose"), Some(true));
        assert_eq!(opts.get_addr("listen").unwrap().port, 80);
        assert_eq!(opts.get_seq("tags"), Some(&["a".to_string()][..]));
        assert_eq!(opts.len(), 5);
    }

    #[test]
    fn accessor_type_mismatch_is_none() {
        let opts = sample();
        assert_eq!(opts.get_str("port"), None);
        assert_eq!(opts.get_int("missing"), None);
        assert!(!opts.contains("missing"));
    }

    #[test]
    fn source_is_recorded() {
        let opts = sample();
        assert_eq!(opts.source_of("port"), Some(Source::CommandLine));
        assert_eq!(opts.source_of("verbose"), Some(Source::Environment));
        assert_eq!(opts.source_of("missing"), None);
    }

    #[test]
    fn iter_keeps_declaration_order() {
        let opts = sample();
        let names: Vec<&str> = opts.iter().map(|(n, _, _)| n).collect();
        assert_eq!(names, ["port", "name", "verbose", "listen", "tags"]);
    }

    #[test]
    fn json_is_ordered_and_untagged() {
        let json = sample().to_json().unwrap();
        let port = json.find("\"port\"").unwrap();
        let tags = json.find("\"tags\"").unwrap();
        assert!(port < tags);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["port"], 9090);
        assert_eq!(parsed["listen"], "0.0.0.0:80");
        assert_eq!(parsed["tags"][0], "a");
    }

    #[test]
    fn ipv6_address_is_bracketed() {
        let addr = SocketAddress {
            host: "::1".into(),
            port: 8080,
        };
        assert_eq!(addr.to_string(), "[::1]:8080");
    }

    #[test]
    fn display_lists_entries() {
        let text = sample().to_string();
        assert!(text.starts_with("port = 9090\nname = \"svc\""));
    }

    #[test]
    fn to_toml_round_trips_shapes() {
        assert_eq!(OptionValue::Int(3).to_toml(), Value::Integer(3));
        assert_eq!(
            OptionValue::Seq(vec!["x".into()]).to_toml(),
            Value::Array(vec![Value::String("x".into())])
        );
    }
}
