//! Option declarations and the validated [`Schema`].
//!
//! An [`OptionSpec`] says which sources may set an option: a command-line
//! switch, an environment variable, a dotted key in the config file, or any
//! combination. A [`Schema`] is the ordered list of all options for one
//! program. Declaration order is the order of help output and of
//! [`ResolvedOptions`](crate::ResolvedOptions).
//!
//! `Schema::new` rejects ambiguous schemas up front: duplicate names,
//! duplicate short or long switches, and malformed switch names. Command-line
//! matching can therefore never see two candidates for the same token.
//!
//! Nested `children` are flattened at construction time. A child `level`
//! under a parent `log` becomes the option `log.level`, placed right after
//! its parent.
//!
//! Schemas can also be declared in TOML:
//!
//! ```toml
//! [[option]]
//! name = "port"
//! type = "int"
//! short = "p"
//! long = "port"
//! env = "APP_PORT"
//! key = "server.port"
//! summary = "port"
//! description = "Port to listen on"
//! ```

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::error::SchemaError;
use crate::types::ValueType;

/// A command-line switch pair: `-<short>` and `--<long>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliSwitch {
    pub short: char,
    pub long: String,
}

impl CliSwitch {
    /// Whether `token` is exactly `-<short>` or `--<long>`.
    pub fn matches(&self, token: &str) -> bool {
        if let Some(long) = token.strip_prefix("--") {
            return long == self.long;
        }
        let mut chars = token.chars();
        chars.next() == Some('-') && chars.next() == Some(self.short) && chars.next().is_none()
    }
}

/// One declared option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    pub name: String,
    pub value_type: ValueType,
    pub switch: Option<CliSwitch>,
    pub env: Option<String>,
    pub key: Option<String>,
    /// Short description; doubles as the value placeholder in usage output.
    pub summary: String,
    pub description: String,
    pub children: Vec<OptionSpec>,
}

impl OptionSpec {
    pub fn new(name: &str, value_type: ValueType) -> Self {
        Self {
            name: name.to_string(),
            value_type,
            switch: None,
            env: None,
            key: None,
            summary: String::new(),
            description: String::new(),
            children: Vec::new(),
        }
    }

    /// Make the option settable as `-<short>` / `--<long>`.
    pub fn switch(mut self, short: char, long: &str) -> Self {
        self.switch = Some(CliSwitch {
            short,
            long: long.to_string(),
        });
        self
    }

    /// Make the option settable through the environment variable `name`.
    pub fn env(mut self, name: &str) -> Self {
        self.env = Some(name.to_string());
        self
    }

    /// Make the option settable through the dotted config-file key `key`.
    pub fn key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    pub fn summary(mut self, text: &str) -> Self {
        self.summary = text.to_string();
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.description = text.to_string();
        self
    }

    pub fn child(mut self, child: OptionSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// An ordered, validated set of options.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    options: Vec<OptionSpec>,
}

impl Schema {
    /// Flatten `specs` and check the schema invariants.
    pub fn new(specs: Vec<OptionSpec>) -> Result<Self, SchemaError> {
        let mut options = Vec::new();
        for spec in specs {
            flatten_into(spec, None, &mut options);
        }
        check(&options)?;
        Ok(Self { options })
    }

    /// Build a schema from a declarative TOML document of `[[option]]` tables.
    pub fn from_toml_str(text: &str) -> Result<Self, SchemaError> {
        let doc: SchemaDoc =
            toml::from_str(text).map_err(|e| SchemaError::Definition(e.to_string()))?;
        let specs = doc
            .option
            .into_iter()
            .map(OptionDecl::into_spec)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(specs)
    }

    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.name == name)
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.options.iter().position(|o| o.name == name)
    }

    /// The first option, in declaration order, whose switch matches `token`.
    pub fn find_switch(&self, token: &str) -> Option<(usize, &OptionSpec)> {
        self.options
            .iter()
            .enumerate()
            .find(|(_, o)| o.switch.as_ref().is_some_and(|s| s.matches(token)))
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

fn flatten_into(mut spec: OptionSpec, parent: Option<&str>, out: &mut Vec<OptionSpec>) {
    if let Some(parent) = parent {
        spec.name = format!("{parent}.{}", spec.name);
    }
    let children = std::mem::take(&mut spec.children);
    let name = spec.name.clone();
    out.push(spec);
    for child in children {
        flatten_into(child, Some(&name), out);
    }
}

fn check(options: &[OptionSpec]) -> Result<(), SchemaError> {
    let mut names: HashSet<&str> = HashSet::new();
    let mut shorts: HashMap<char, &str> = HashMap::new();
    let mut longs: HashMap<&str, &str> = HashMap::new();
    let mut keys: Vec<(&str, &str)> = Vec::new();

    for opt in options {
        if opt.name.trim().is_empty() || opt.name.split('.').any(str::is_empty) {
            return Err(SchemaError::EmptyName);
        }
        if !names.insert(opt.name.as_str()) {
            return Err(SchemaError::DuplicateName(opt.name.clone()));
        }

        if let Some(key) = &opt.key {
            if key.split('.').any(|segment| segment.trim().is_empty()) {
                return Err(SchemaError::InvalidKey {
                    option: opt.name.clone(),
                    key: key.clone(),
                });
            }
            if let Some((first, first_key)) = keys.iter().find(|(_, k)| keys_overlap(k, key)) {
                return Err(SchemaError::ConflictingKey {
                    first: first.to_string(),
                    first_key: first_key.to_string(),
                    second: opt.name.clone(),
                    second_key: key.clone(),
                });
            }
            keys.push((opt.name.as_str(), key.as_str()));
        }

        let Some(switch) = &opt.switch else {
            continue;
        };
        if !switch.short.is_ascii_alphanumeric() {
            return Err(SchemaError::InvalidShort {
                option: opt.name.clone(),
                short: switch.short,
            });
        }
        if switch.long.is_empty()
            || switch.long.starts_with('-')
            || switch.long.chars().any(char::is_whitespace)
        {
            return Err(SchemaError::InvalidLong {
                option: opt.name.clone(),
                long: switch.long.clone(),
            });
        }
        if let Some(first) = shorts.insert(switch.short, opt.name.as_str()) {
            return Err(SchemaError::DuplicateShort {
                short: switch.short,
                first: first.to_string(),
                second: opt.name.clone(),
            });
        }
        if let Some(first) = longs.insert(switch.long.as_str(), opt.name.as_str()) {
            return Err(SchemaError::DuplicateLong {
                long: switch.long.clone(),
                first: first.to_string(),
                second: opt.name.clone(),
            });
        }
    }
    Ok(())
}

/// Equal keys, or one a dotted prefix of the other, would write into the same
/// part of the config tree.
fn keys_overlap(a: &str, b: &str) -> bool {
    let is_prefix = |short: &str, long: &str| {
        long.strip_prefix(short)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
    };
    is_prefix(a, b) || is_prefix(b, a)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDoc {
    #[serde(default)]
    option: Vec<OptionDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OptionDecl {
    name: String,
    #[serde(rename = "type")]
    value_type: String,
    short: Option<char>,
    long: Option<String>,
    env: Option<String>,
    key: Option<String>,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    children: Vec<OptionDecl>,
}

impl OptionDecl {
    fn into_spec(self) -> Result<OptionSpec, SchemaError> {
        let value_type = self
            .value_type
            .parse::<ValueType>()
            .map_err(|source| SchemaError::UnknownType {
                option: self.name.clone(),
                source,
            })?;

        let switch = match (self.short, self.long) {
            (Some(short), Some(long)) => Some(CliSwitch { short, long }),
            (None, None) => None,
            _ => return Err(SchemaError::IncompleteSwitch(self.name)),
        };

        let children = self
            .children
            .into_iter()
            .map(OptionDecl::into_spec)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(OptionSpec {
            name: self.name,
            value_type,
            switch,
            env: self.env,
            key: self.key,
            summary: self.summary,
            description: self.description,
            children,
        })
    }
}
