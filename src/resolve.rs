//! Core resolution pipeline: walk every source once and produce the resolved
//! option set.
//!
//! Operates on pre-collected data (`ResolveInput`): the argument vector and
//! environment pairs are handed in, never read from the process. The only
//! I/O is reading the chosen config file. Steps:
//!
//! 1. Scan the command line
//! 2. Read the environment for options the command line did not set
//! 3. Locate and parse the config file (its path may come from step 1 or 2)
//! 4. Look up file keys for options still unset
//! 5. Write command-line and environment values back into the tree
//! 6. Collect the winners in declaration order
//!
//! Precedence is fixed: command line > environment > config file. The pass
//! stops at the first error and returns nothing partial.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use toml::Value;
use tracing::{debug, trace};

use crate::cli;
use crate::env;
use crate::error::OptfigError;
use crate::file::{self, FileTree, TreeParser};
use crate::schema::Schema;
use crate::types::ValueType;
use crate::validate::validate_tree_value;
use crate::value::{OptionValue, ResolvedOptions, Source};

/// All pre-collected data needed for one resolution pass.
pub struct ResolveInput<'a> {
    /// Command-line arguments, program name excluded.
    pub args: Vec<String>,
    /// Environment variables by name. Empty when the environment is disabled.
    pub env_vars: HashMap<String, String>,
    /// A config file path fixed by the caller. Takes priority over everything.
    pub config_file: Option<PathBuf>,
    /// Name of the option whose value is the config file path.
    pub config_option: Option<String>,
    /// Discovered candidate files, priority-ascending.
    pub candidates: Vec<PathBuf>,
    pub parser: &'a dyn TreeParser,
}

/// The outcome of a successful pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub options: ResolvedOptions,
    /// The config file that was read, if any.
    pub config_path: Option<PathBuf>,
    /// The config tree with command-line and environment values written in.
    pub tree: FileTree,
}

type Slot = Option<(OptionValue, Source)>;

/// Resolve `schema` against `input`.
pub fn resolve(schema: &Schema, input: ResolveInput<'_>) -> Result<Resolution, OptfigError> {
    let config_index = match input.config_option.as_deref() {
        Some(name) => {
            let index = schema
                .position(name)
                .ok_or_else(|| OptfigError::UnknownConfigOption(name.to_string()))?;
            let value_type = schema.options()[index].value_type;
            if value_type != ValueType::String {
                return Err(OptfigError::ConfigOptionType {
                    option: name.to_string(),
                    value_type,
                });
            }
            Some(index)
        }
        None => None,
    };

    let mut slots: Vec<Slot> = vec![None; schema.len()];

    // 1: command line. A repeated switch overwrites the earlier slot.
    let from_cli = cli::scan_args(schema, &input.args)?;
    debug!(count = from_cli.len(), "command line scanned");
    for (index, value) in from_cli {
        slots[index] = Some((value, Source::CommandLine));
    }

    // 2: environment, only where the command line left a gap
    let skip: Vec<bool> = slots.iter().map(Option::is_some).collect();
    let from_env = env::read_env(schema, &input.env_vars, &skip)?;
    debug!(count = from_env.len(), "environment read");
    for (index, value) in from_env {
        slots[index] = Some((value, Source::Environment));
    }

    // 3: locate and load the config file
    let config_path = input
        .config_file
        .clone()
        .or_else(|| config_index.and_then(|i| path_from_slot(&slots[i])))
        .or_else(|| file::find_config_file(&input.candidates).map(Path::to_path_buf));

    let mut tree = match &config_path {
        Some(path) => {
            debug!(path = %path.display(), "loading config file");
            file::load_tree(path, input.parser)?
        }
        None => {
            debug!("no config file found; continuing with an empty tree");
            FileTree::default()
        }
    };

    // 4: file values for options still unset
    let mut file_count = 0usize;
    for (index, spec) in schema.options().iter().enumerate() {
        if slots[index].is_some() {
            continue;
        }
        let Some(key) = spec.key.as_deref() else {
            continue;
        };
        let Some(leaf) = tree.lookup(key) else {
            continue;
        };
        let value =
            validate_tree_value(spec.value_type, leaf).map_err(|source| {
                OptfigError::InvalidFileValue {
                    key: key.to_string(),
                    path: config_path.clone().unwrap_or_default(),
                    option: spec.name.clone(),
                    value: leaf_text(leaf),
                    source,
                }
            })?;
        trace!(option = %spec.name, key, "taken from config file");
        slots[index] = Some((value, Source::File));
        file_count += 1;
    }
    debug!(count = file_count, "config file values read");

    // 5: effective tree
    for (spec, slot) in schema.options().iter().zip(&slots) {
        let (Some(key), Some((value, source))) = (spec.key.as_deref(), slot) else {
            continue;
        };
        if *source != Source::File {
            trace!(option = %spec.name, key, %source, "overriding config tree");
            tree.override_at(key, value.to_toml())?;
        }
    }

    // 6: winners in declaration order
    let mut options = ResolvedOptions::default();
    for (spec, slot) in schema.options().iter().zip(slots) {
        if let Some((value, source)) = slot {
            options.push(&spec.name, value, source);
        }
    }
    debug!(count = options.len(), "options resolved");

    Ok(Resolution {
        options,
        config_path,
        tree,
    })
}

/// The config option is a string option; an empty value means no path.
fn path_from_slot(slot: &Slot) -> Option<PathBuf> {
    match slot {
        Some((OptionValue::Str(s), _)) if !s.is_empty() => Some(PathBuf::from(s)),
        _ => None,
    }
}

/// Strings render bare; everything else in TOML syntax.
fn leaf_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Stage, ValidationError};
    use crate::file::{JsonParser, TomlParser};
    use crate::fixtures::test::{args, server_schema, vars};
    use crate::schema::OptionSpec;
    use crate::validate::validate;
    use crate::value::SocketAddress;
    use std::fs;
    use tempfile::TempDir;

    fn input<'a>(argv: &[&str], pairs: &[(&str, &str)]) -> ResolveInput<'a> {
        ResolveInput {
            args: args(argv),
            env_vars: env::env_map(vars(pairs)),
            config_file: None,
            config_option: Some("config".into()),
            candidates: vec![],
            parser: &TomlParser,
        }
    }

    fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn port_schema() -> Schema {
        Schema::new(vec![
            OptionSpec::new("port", ValueType::Int)
                .switch('p', "port")
                .env("APP_PORT"),
        ])
        .unwrap()
    }

    // --- worked examples ---

    #[test]
    fn cli_beats_env() {
        let mut inp = input(&["--port", "9090"], &[("APP_PORT", "8080")]);
        inp.config_option = None;
        let res = resolve(&port_schema(), inp).unwrap();
        assert_eq!(res.options.get_int("port"), Some(9090));
        assert_eq!(res.options.source_of("port"), Some(Source::CommandLine));
    }

    #[test]
    fn env_used_without_cli() {
        let mut inp = input(&[], &[("APP_PORT", "8080")]);
        inp.config_option = None;
        let res = resolve(&port_schema(), inp).unwrap();
        assert_eq!(res.options.get_int("port"), Some(8080));
        assert_eq!(res.options.source_of("port"), Some(Source::Environment));
    }

    #[test]
    fn bad_address_is_command_line_error() {
        let schema = Schema::new(vec![
            OptionSpec::new("address", ValueType::IpAddress).switch('a', "address"),
        ])
        .unwrap();
        let mut inp = input(&["--address", "not-an-address"], &[]);
        inp.config_option = None;
        let err = resolve(&schema, inp).unwrap_err();
        assert_eq!(err.stage(), Stage::CommandLine);
        assert_eq!(err.option(), Some("address"));
        assert!(matches!(
            err,
            OptfigError::InvalidArgument {
                source: ValidationError::BadAddress { .. },
                ..
            }
        ));
    }

    // --- precedence ---

    #[test]
    fn precedence_triples() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "app.toml", "name = \"file\"\n");
        let schema = server_schema();

        let cases: [(&[&str], &[(&str, &str)], &str, Source); 4] = [
            (&["-n", "cli"], &[("APP_NAME", "env")], "cli", Source::CommandLine),
            (&[], &[("APP_NAME", "env")], "env", Source::Environment),
            (&["-n", "cli"], &[], "cli", Source::CommandLine),
            (&[], &[], "file", Source::File),
        ];
        for (argv, env, expected, source) in cases {
            let mut inp = input(argv, env);
            inp.config_file = Some(path.clone());
            let res = resolve(&schema, inp).unwrap();
            assert_eq!(res.options.get_str("name"), Some(expected), "{argv:?} {env:?}");
            assert_eq!(res.options.source_of("name"), Some(source));
        }
    }

    #[test]
    fn unset_everywhere_is_absent() {
        let res = resolve(&server_schema(), input(&[], &[])).unwrap();
        assert!(res.options.is_empty());
        assert_eq!(res.config_path, None);
        assert!(res.tree.is_empty());
    }

    #[test]
    fn repeated_switch_last_wins() {
        let res = resolve(&server_schema(), input(&["-t", "a", "-t", "b"], &[])).unwrap();
        assert_eq!(res.options.get_seq("tags"), Some(&["b".to_string()][..]));
    }

    #[test]
    fn env_can_switch_boolean_off_over_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "app.toml", "verbose = true\n");
        let mut inp = input(&[], &[("APP_VERBOSE", "no")]);
        inp.config_file = Some(path);
        let res = resolve(&server_schema(), inp).unwrap();
        assert_eq!(res.options.get_bool("verbose"), Some(false));
    }

    #[test]
    fn idempotent_across_fresh_passes() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "app.toml", "[server]\nport = 1\nlisten = \"0.0.0.0:1\"\n");
        let schema = server_schema();
        let run = || {
            let mut inp = input(&["-v", "-n", "x"], &[("APP_PORT", "2")]);
            inp.config_file = Some(path.clone());
            resolve(&schema, inp).unwrap()
        };
        assert_eq!(run(), run());
    }

    // --- config file ---

    #[test]
    fn file_values_fill_gaps() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "app.toml",
            r#"
tags = ["a", "b"]

[server]
port = 3000
listen = "[::1]:80"

[[log-settings]]
directory = "/var/log/app"
"#,
        );
        let mut inp = input(&[], &[]);
        inp.config_file = Some(path.clone());
        let res = resolve(&server_schema(), inp).unwrap();

        assert_eq!(res.config_path, Some(path));
        assert_eq!(res.options.get_int("port"), Some(3000));
        assert_eq!(
            res.options.get_addr("listen"),
            Some(&SocketAddress {
                host: "::1".into(),
                port: 80
            })
        );
        assert_eq!(res.options.get_seq("tags").map(<[String]>::len), Some(2));
        assert_eq!(res.options.get_str("log-dir"), Some("/var/log/app"));
        assert_eq!(res.options.source_of("log-dir"), Some(Source::File));
    }

    #[test]
    fn config_path_from_cli_option() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "custom.toml", "name = \"from-custom\"\n");
        let inp = input(&["--config", path.to_str().unwrap()], &[]);
        let res = resolve(&server_schema(), inp).unwrap();
        assert_eq!(res.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(res.options.get_str("name"), Some("from-custom"));
    }

    #[test]
    fn config_path_from_env_option() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "custom.toml", "name = \"from-env-path\"\n");
        let inp = input(&[], &[("APP_CONFIG", path.to_str().unwrap())]);
        let res = resolve(&server_schema(), inp).unwrap();
        assert_eq!(res.options.get_str("name"), Some("from-env-path"));
    }

    #[test]
    fn explicit_path_beats_config_option() {
        let dir = TempDir::new().unwrap();
        let fixed = write_config(&dir, "fixed.toml", "name = \"fixed\"\n");
        let other = write_config(&dir, "other.toml", "name = \"other\"\n");
        let mut inp = input(&["-c", other.to_str().unwrap()], &[]);
        inp.config_file = Some(fixed);
        let res = resolve(&server_schema(), inp).unwrap();
        assert_eq!(res.options.get_str("name"), Some("fixed"));
    }

    #[test]
    fn discovered_candidate_used_last() {
        let dir = TempDir::new().unwrap();
        let low = write_config(&dir, "low.toml", "name = \"low\"\n");
        let high = write_config(&dir, "high.toml", "name = \"high\"\n");
        let mut inp = input(&[], &[]);
        inp.candidates = vec![low, high.clone(), dir.path().join("missing.toml")];
        let res = resolve(&server_schema(), inp).unwrap();
        assert_eq!(res.config_path, Some(high));
        assert_eq!(res.options.get_str("name"), Some("high"));
    }

    #[test]
    fn missing_named_config_is_read_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let inp = input(&["-c", missing.to_str().unwrap()], &[]);
        let err = resolve(&server_schema(), inp).unwrap_err();
        assert!(matches!(err, OptfigError::ConfigFileRead { .. }));
        assert_eq!(err.source_kind(), Some(Source::File));
    }

    #[test]
    fn parse_error_surfaces() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "app.toml", "port = = 1\n");
        let mut inp = input(&[], &[]);
        inp.config_file = Some(path);
        let err = resolve(&server_schema(), inp).unwrap_err();
        assert!(matches!(err, OptfigError::ConfigFileParse { .. }));
    }

    #[test]
    fn json_parser_supported() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "app.json", r#"{"server": {"port": 7}}"#);
        let mut inp = input(&[], &[]);
        inp.config_file = Some(path);
        inp.parser = &JsonParser;
        let res = resolve(&server_schema(), inp).unwrap();
        assert_eq!(res.options.get_int("port"), Some(7));
    }

    #[test]
    fn unknown_config_option_rejected() {
        let mut inp = input(&[], &[]);
        inp.config_option = Some("nope".into());
        let err = resolve(&server_schema(), inp).unwrap_err();
        assert!(matches!(err, OptfigError::UnknownConfigOption(ref n) if n == "nope"));
        assert_eq!(err.stage(), Stage::Setup);
    }

    #[test]
    fn config_option_must_be_string() {
        let mut inp = input(&["-v"], &[]);
        inp.config_option = Some("verbose".into());
        let err = resolve(&server_schema(), inp).unwrap_err();
        match err {
            OptfigError::ConfigOptionType { ref option, value_type } => {
                assert_eq!(option, "verbose");
                assert_eq!(value_type, ValueType::Boolean);
            }
            ref other => panic!("Expected ConfigOptionType, got {other:?}"),
        }
        assert_eq!(err.stage(), Stage::Setup);
    }

    #[test]
    fn empty_config_option_falls_back_to_discovery() {
        let dir = TempDir::new().unwrap();
        let found = write_config(&dir, "app.toml", "name = \"found\"\n");
        let mut inp = input(&["-c", ""], &[]);
        inp.candidates = vec![found];
        let res = resolve(&server_schema(), inp).unwrap();
        assert_eq!(res.options.get_str("name"), Some("found"));
    }

    // --- every switch ---

    #[test]
    fn every_switch_resolves_its_argument() {
        let schema = server_schema();
        let sample = |ty: ValueType| match ty {
            ValueType::Int | ValueType::IpPort => "7",
            ValueType::String => "some-text",
            ValueType::Array => "a-tag",
            ValueType::HostPort | ValueType::IpAddress => "127.0.0.1:80",
            ValueType::Boolean => "",
        };

        let mut argv = Vec::new();
        for spec in schema.options() {
            let switch = spec.switch.as_ref().unwrap();
            argv.push(format!("--{}", switch.long));
            if spec.value_type.takes_argument() {
                argv.push(sample(spec.value_type).to_string());
            }
        }

        let mut inp = input(&[], &[]);
        inp.args = argv;
        inp.config_option = None;
        let res = resolve(&schema, inp).unwrap();

        assert_eq!(res.options.len(), schema.len());
        for spec in schema.options() {
            let expected = validate(spec.value_type, sample(spec.value_type)).unwrap();
            assert_eq!(res.options.get(&spec.name), Some(&expected), "{}", spec.name);
            assert_eq!(res.options.source_of(&spec.name), Some(Source::CommandLine));
        }
    }

    // --- int rejection from each source ---

    #[test]
    fn bad_int_from_each_source() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "app.toml", "[server]\nport = \"abc\"\n");
        let schema = server_schema();

        let err = resolve(&schema, input(&["-p", "abc"], &[])).unwrap_err();
        assert_eq!(err.source_kind(), Some(Source::CommandLine));
        assert_eq!(err.raw_value(), Some("abc"));

        let err = resolve(&schema, input(&[], &[("APP_PORT", "abc")])).unwrap_err();
        assert_eq!(err.source_kind(), Some(Source::Environment));
        assert_eq!(err.option(), Some("port"));

        let mut inp = input(&[], &[]);
        inp.config_file = Some(path.clone());
        let err = resolve(&schema, inp).unwrap_err();
        match err {
            OptfigError::InvalidFileValue {
                key,
                path: p,
                option,
                value,
                source,
            } => {
                assert_eq!(key, "server.port");
                assert_eq!(p, path);
                assert_eq!(option, "port");
                assert_eq!(value, "abc");
                assert!(matches!(source, ValidationError::BadInt { .. }));
            }
            other => panic!("Expected InvalidFileValue, got {other:?}"),
        }
    }

    #[test]
    fn bad_file_value_ignored_when_overridden() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "app.toml", "[server]\nport = \"abc\"\n");
        let mut inp = input(&["-p", "5"], &[]);
        inp.config_file = Some(path);
        let res = resolve(&server_schema(), inp).unwrap();
        assert_eq!(res.options.get_int("port"), Some(5));
    }

    #[test]
    fn cli_errors_any_position() {
        let schema = server_schema();
        for argv in [
            &["--bogus", "-v"][..],
            &["-v", "--bogus"][..],
            &["-n", "x", "--bogus", "-v"][..],
        ] {
            let err = resolve(&schema, input(argv, &[])).unwrap_err();
            assert!(matches!(err, OptfigError::UnknownOption { ref token } if token == "--bogus"));
        }
        let err = resolve(&schema, input(&["-v", "--port"], &[])).unwrap_err();
        assert!(matches!(err, OptfigError::MissingArgument { .. }));
    }

    // --- effective tree ---

    #[test]
    fn effective_tree_carries_overrides() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "app.toml", "[server]\nport = 1\n");
        let mut inp = input(&["-d", "/tmp/logs"], &[("APP_PORT", "2")]);
        inp.config_file = Some(path);
        let res = resolve(&server_schema(), inp).unwrap();

        assert_eq!(res.tree.lookup("server.port"), Some(&Value::Integer(2)));
        assert_eq!(
            res.tree.lookup("log-settings.directory").and_then(Value::as_str),
            Some("/tmp/logs")
        );
        // Options without a key never reach the tree.
        assert_eq!(res.tree.lookup("config"), None);
    }

    #[test]
    fn override_into_scalar_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "app.toml", "log-settings = \"flat\"\n");
        let mut inp = input(&["-d", "/tmp"], &[]);
        inp.config_file = Some(path);
        let err = resolve(&server_schema(), inp).unwrap_err();
        assert!(matches!(err, OptfigError::MalformedTree { .. }));
        assert_eq!(err.stage(), Stage::Merge);
    }

    #[test]
    fn children_resolve_like_any_option() {
        let schema = Schema::new(vec![
            OptionSpec::new("log", ValueType::String).child(
                OptionSpec::new("level", ValueType::String)
                    .switch('L', "log-level")
                    .key("log.level"),
            ),
        ])
        .unwrap();
        let mut inp = input(&["-L", "debug"], &[]);
        inp.config_option = None;
        let res = resolve(&schema, inp).unwrap();
        assert_eq!(res.options.get_str("log.level"), Some("debug"));
    }
}
