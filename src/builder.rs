//! The builder: collects schema, inputs and file discovery settings, then
//! runs one resolution pass.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli;
use crate::env;
use crate::error::OptfigError;
use crate::file::{self, TomlParser, TreeParser};
use crate::help;
use crate::resolve::{self, Resolution, ResolveInput};
use crate::schema::Schema;
use crate::types::SearchPath;
use crate::value::ResolvedOptions;

/// Entry point for building an optfig resolution.
pub struct Optfig;

impl Optfig {
    pub fn builder() -> OptfigBuilder {
        OptfigBuilder::new()
    }
}

/// Builder for configuring and running one resolution pass.
///
/// Three inputs feed the pass:
///
/// - **Command line**: [`args()`](Self::args), default `std::env::args_os().skip(1)`;
///   a non-UTF-8 argument is an unknown option.
/// - **Environment**: [`env_vars()`](Self::env_vars), default `std::env::vars_os()`
///   with non-UTF-8 entries skipped;
///   [`no_env()`](Self::no_env) turns it off.
/// - **Config file**: [`config_file()`](Self::config_file), the value of the
///   [`config_option()`](Self::config_option), or discovery over
///   [`search_paths()`](Self::search_paths), in that order.
///
/// File discovery only runs once a file name is known, either from
/// [`app_name()`](Self::app_name) or [`file_name()`](Self::file_name). A
/// builder with neither resolves from the command line and environment alone.
pub struct OptfigBuilder {
    schema: Option<Schema>,
    app_name: Option<String>,
    file_name: Option<String>,
    search_paths: Option<Vec<SearchPath>>,
    config_file: Option<PathBuf>,
    config_option: Option<String>,
    args: Option<Vec<String>>,
    env_vars: Option<Vec<(String, String)>>,
    env_enabled: bool,
    parser: Box<dyn TreeParser>,
}

impl OptfigBuilder {
    fn new() -> Self {
        Self {
            schema: None,
            app_name: None,
            file_name: None,
            search_paths: None,
            config_file: None,
            config_option: None,
            args: None,
            env_vars: None,
            env_enabled: true,
            parser: Box::new(TomlParser),
        }
    }

    /// The options to resolve. Required.
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set the application name. This derives sensible defaults:
    /// - `file_name` → `"{app_name}.toml"`
    /// - `search_paths` → `[SearchPath::Platform]`
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    /// Override the config file name (default: `"{app_name}.toml"`).
    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = Some(name.to_string());
        self
    }

    /// Replace the default search paths entirely.
    ///
    /// Paths are listed in **priority-ascending** order: the last entry has the
    /// highest priority. See [`SearchPath`] for the available variants.
    pub fn search_paths(mut self, paths: Vec<SearchPath>) -> Self {
        self.search_paths = Some(paths);
        self
    }

    /// Append a search path without replacing the defaults.
    /// If no paths have been set yet, starts from the default `[Platform]`.
    pub fn add_search_path(mut self, path: SearchPath) -> Self {
        self.search_paths
            .get_or_insert_with(|| vec![SearchPath::Platform])
            .push(path);
        self
    }

    /// Always read this file. Overrides the config option and discovery.
    pub fn config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Name of the option (typically `config`) whose command-line or
    /// environment value is the config file path.
    pub fn config_option(mut self, name: &str) -> Self {
        self.config_option = Some(name.to_string());
        self
    }

    /// Use these arguments instead of the process arguments. The program name
    /// must not be included.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Use these variables instead of the process environment.
    pub fn env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Disable environment variable loading entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Parse config files with `parser` (default: [`TomlParser`]).
    pub fn parser(mut self, parser: impl TreeParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    fn effective_schema(&self) -> Result<&Schema, OptfigError> {
        self.schema.as_ref().ok_or(OptfigError::SchemaRequired)
    }

    /// Resolve the effective file name.
    fn effective_file_name(&self) -> Result<String, OptfigError> {
        if let Some(name) = &self.file_name {
            return Ok(name.clone());
        }
        let app = self.app_name.as_deref().ok_or(OptfigError::AppNameRequired)?;
        Ok(format!("{app}.toml"))
    }

    /// Resolve the effective search paths.
    fn effective_search_paths(&self) -> Vec<SearchPath> {
        if let Some(paths) = &self.search_paths {
            return paths.clone();
        }
        vec![SearchPath::Platform]
    }

    /// Candidate config files, priority-ascending. Empty when discovery is
    /// not configured or an explicit file was given.
    fn candidates(&self) -> Result<Vec<PathBuf>, OptfigError> {
        if self.config_file.is_some() {
            return Ok(Vec::new());
        }
        if self.app_name.is_none() && self.file_name.is_none() && self.search_paths.is_none() {
            return Ok(Vec::new());
        }

        let file_name = self.effective_file_name()?;
        let search_paths = self.effective_search_paths();
        let app_name = match self.app_name.as_deref() {
            Some(app) => app,
            None if search_paths.contains(&SearchPath::Platform) => {
                return Err(OptfigError::AppNameRequired);
            }
            None => "",
        };

        let candidates = file::candidate_files(&search_paths, &file_name, app_name);
        debug!(count = candidates.len(), %file_name, "config file candidates");
        Ok(candidates)
    }

    /// Build the `ResolveInput` from current builder state.
    fn build_input(&self) -> Result<ResolveInput<'_>, OptfigError> {
        let candidates = self.candidates()?;

        let args = match &self.args {
            Some(args) => args.clone(),
            None => cli::utf8_args(std::env::args_os().skip(1))?,
        };

        let env_vars = match (&self.env_vars, self.env_enabled) {
            (_, false) => Default::default(),
            (Some(vars), true) => env::env_map(vars.iter().cloned()),
            (None, true) => env::env_map_os(std::env::vars_os()),
        };

        Ok(ResolveInput {
            args,
            env_vars,
            config_file: self.config_file.clone(),
            config_option: self.config_option.clone(),
            candidates,
            parser: self.parser.as_ref(),
        })
    }

    /// Run the pass and return the options together with the config path and
    /// effective tree.
    pub fn resolve(&self) -> Result<Resolution, OptfigError> {
        let schema = self.effective_schema()?;
        let input = self.build_input()?;
        resolve::resolve(schema, input)
    }

    /// Run the pass and return the resolved options.
    pub fn load(&self) -> Result<ResolvedOptions, OptfigError> {
        self.resolve().map(|r| r.options)
    }

    /// Usage text for the configured schema.
    pub fn usage(&self, program: &str) -> Result<String, OptfigError> {
        Ok(help::usage(self.effective_schema()?, program))
    }
}
