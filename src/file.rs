//! The config file source: parser seam, file tree, and file discovery.
//!
//! # Parsing
//!
//! Text parsing is delegated to a [`TreeParser`]. [`TomlParser`] is the
//! default, [`JsonParser`] reads JSON, [`HclParser`] reads HCL, and any
//! `Fn(&str) -> Result<toml::Table, String>` closure works too. Whatever the
//! format, the result is a nested `toml::Table`.
//!
//! # Dotted paths
//!
//! [`FileTree`] addresses leaves with dotted paths (`log-settings.directory`).
//! An intermediate node may be a plain table or a sequence of tables (a TOML
//! `[[log-settings]]` block); a sequence is entered through its first
//! element. Lookups of absent paths return `None`.
//! [`FileTree::override_at`] writes a leaf, creating single-element sequences
//! of tables for missing intermediates, and fails with
//! [`OptfigError::MalformedTree`] when an existing intermediate has any other
//! shape.
//!
//! # Discovery
//!
//! Each [`SearchPath`] resolves to one directory. Directories are listed in
//! priority-ascending order, and [`find_config_file`] returns the
//! highest-priority `{dir}/{file_name}` that exists. Missing files are
//! silently skipped; only actual I/O errors (permissions, etc.) are
//! propagated when the chosen file is read.

use std::path::{Path, PathBuf};

use toml::{Table, Value};

use crate::error::OptfigError;
use crate::types::SearchPath;

/// Parses config file text into a nested table.
pub trait TreeParser {
    fn parse(&self, text: &str) -> Result<Table, String>;
}

impl<F> TreeParser for F
where
    F: Fn(&str) -> Result<Table, String>,
{
    fn parse(&self, text: &str) -> Result<Table, String> {
        self(text)
    }
}

/// TOML config files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlParser;

impl TreeParser for TomlParser {
    fn parse(&self, text: &str) -> Result<Table, String> {
        text.parse::<Table>().map_err(|e| e.to_string())
    }
}

/// JSON config files. The top level must be an object; `null` is not
/// representable and is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl TreeParser for JsonParser {
    fn parse(&self, text: &str) -> Result<Table, String> {
        serde_json::from_str::<Table>(text).map_err(|e| e.to_string())
    }
}

/// HCL config files.
///
/// Every block becomes a sequence of tables under its identifier, so a
/// repeated `listener { .. }` block appends to `listener`. Labels nest as
/// table keys inside the first element: `server "main" { port = 80 }` is
/// reachable as `server.main.port`. Attribute expressions that are not
/// literals are kept as their HCL text.
#[derive(Debug, Clone, Copy, Default)]
pub struct HclParser;

impl TreeParser for HclParser {
    fn parse(&self, text: &str) -> Result<Table, String> {
        let body = hcl::parse(text).map_err(|e| e.to_string())?;
        hcl_body(body)
    }
}

fn hcl_body(body: hcl::Body) -> Result<Table, String> {
    let mut table = Table::new();
    for structure in body {
        match structure {
            hcl::Structure::Attribute(attr) => {
                let key = attr.key.into_inner();
                let value = hcl_value(hcl::Value::from(attr.expr))
                    .map_err(|e| format!("attribute '{key}': {e}"))?;
                table.insert(key, value);
            }
            hcl::Structure::Block(block) => {
                let mut names = vec![block.identifier.into_inner()];
                names.extend(block.labels.into_iter().map(|label| label.into_inner()));
                let inner = hcl_body(block.body)?;
                insert_block(&mut table, &names, inner)?;
            }
        }
    }
    Ok(table)
}

fn insert_block(table: &mut Table, names: &[String], body: Table) -> Result<(), String> {
    let Some((name, rest)) = names.split_first() else {
        return Err("block without identifier".into());
    };
    let entry = table
        .entry(name.clone())
        .or_insert_with(|| Value::Array(Vec::new()));
    let Value::Array(items) = entry else {
        return Err(format!("block '{name}' collides with an attribute"));
    };
    if rest.is_empty() {
        items.push(Value::Table(body));
        return Ok(());
    }
    if items.is_empty() {
        items.push(Value::Table(Table::new()));
    }
    match items.first_mut() {
        Some(Value::Table(inner)) => insert_block(inner, rest, body),
        _ => Err(format!("block '{name}' is not a table")),
    }
}

fn hcl_value(value: hcl::Value) -> Result<Value, String> {
    Ok(match value {
        hcl::Value::Null => return Err("null is not representable".into()),
        hcl::Value::Bool(b) => Value::Boolean(b),
        hcl::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Float(n.as_f64().ok_or_else(|| format!("bad number {n}"))?),
        },
        hcl::Value::String(s) => Value::String(s),
        hcl::Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(hcl_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        hcl::Value::Object(map) => Value::Table(
            map.into_iter()
                .map(|(k, v)| hcl_value(v).map(|v| (k, v)))
                .collect::<Result<Table, _>>()?,
        ),
    })
}

/// The parsed config file, queried and overridden by dotted path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileTree {
    root: Table,
}

impl FileTree {
    pub fn new(root: Table) -> Self {
        Self { root }
    }

    pub fn parse(text: &str, parser: &dyn TreeParser) -> Result<Self, String> {
        parser.parse(text).map(Self::new)
    }

    /// The leaf at `dotted_key`, or `None` if any segment is missing or not
    /// traversable.
    pub fn lookup(&self, dotted_key: &str) -> Option<&Value> {
        let (path, leaf) = match dotted_key.rsplit_once('.') {
            Some((path, leaf)) => (Some(path), leaf),
            None => (None, dotted_key),
        };

        let mut current = &self.root;
        if let Some(path) = path {
            for segment in path.split('.') {
                current = match current.get(segment)? {
                    Value::Table(t) => t,
                    Value::Array(items) => match items.first()? {
                        Value::Table(t) => t,
                        _ => return None,
                    },
                    _ => return None,
                };
            }
        }
        current.get(leaf)
    }

    /// Set the leaf at `dotted_key`, replacing whatever was there.
    pub fn override_at(&mut self, dotted_key: &str, value: Value) -> Result<(), OptfigError> {
        let segments: Vec<&str> = dotted_key.split('.').collect();
        let malformed = |segment: &str, reason: &str| OptfigError::MalformedTree {
            path: dotted_key.to_string(),
            segment: segment.to_string(),
            reason: reason.to_string(),
        };

        if let Some(empty) = segments.iter().find(|s| s.is_empty()) {
            return Err(malformed(*empty, "is an empty path segment"));
        }

        let (leaf, parents) = segments
            .split_last()
            .ok_or_else(|| malformed("", "is an empty path segment"))?;

        let mut current = &mut self.root;
        for segment in parents {
            let node = current
                .entry(*segment)
                .or_insert_with(|| Value::Array(vec![Value::Table(Table::new())]));
            current = match node {
                Value::Table(t) => t,
                Value::Array(items) => match items.first_mut() {
                    Some(Value::Table(t)) => t,
                    Some(_) => return Err(malformed(*segment, "is not a sequence of tables")),
                    None => return Err(malformed(*segment, "is an empty sequence")),
                },
                _ => return Err(malformed(*segment, "is not a table")),
            };
        }

        current.insert(leaf.to_string(), value);
        Ok(())
    }

    pub fn as_table(&self) -> &Table {
        &self.root
    }

    pub fn into_table(self) -> Table {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

/// Resolve a [`SearchPath`] to a concrete directory.
///
/// `app_name` is used by `SearchPath::Platform` to construct the platform-specific
/// config directory (e.g. `~/.config/{app_name}/` on Linux).
///
/// Returns `None` if the path cannot be resolved (e.g. no home directory found).
pub fn resolve_search_path(sp: &SearchPath, app_name: &str) -> Option<PathBuf> {
    match sp {
        SearchPath::Platform => {
            let proj = directories::ProjectDirs::from("", "", app_name)?;
            Some(proj.config_dir().to_path_buf())
        }
        SearchPath::Home(subdir) => {
            let user = directories::UserDirs::new()?;
            Some(user.home_dir().join(subdir))
        }
        SearchPath::Cwd => std::env::current_dir().ok(),
        SearchPath::Path(p) => Some(p.clone()),
    }
}

/// Expand search paths into candidate file paths (priority-ascending).
pub fn candidate_files(search_paths: &[SearchPath], file_name: &str, app_name: &str) -> Vec<PathBuf> {
    search_paths
        .iter()
        .filter_map(|sp| resolve_search_path(sp, app_name))
        .map(|dir| dir.join(file_name))
        .collect()
}

/// The highest-priority candidate that exists, searching from the end.
pub fn find_config_file(candidates: &[PathBuf]) -> Option<&Path> {
    candidates
        .iter()
        .rev()
        .find(|p| p.is_file())
        .map(PathBuf::as_path)
}

/// Read and parse the config file at `path`.
pub fn load_tree(path: &Path, parser: &dyn TreeParser) -> Result<FileTree, OptfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| OptfigError::ConfigFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    FileTree::parse(&content, parser).map_err(|message| OptfigError::ConfigFileParse {
        path: path.to_path_buf(),
        message,
    })
}
