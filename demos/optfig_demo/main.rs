//! # optfig demo application
//!
//! A sample server launcher that shows how to wire
//! [optfig](https://docs.rs/optfig) into a real program. It resolves its
//! options and prints them; nothing is actually served.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example optfig_demo -- --listen 0.0.0.0:8080 -v
//! RUST_LOG=optfig=trace cargo run --example optfig_demo
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                 | How to exercise it                                                      |
//! |-------------------------|-------------------------------------------------------------------------|
//! | Command line            | `cargo run --example optfig_demo -- -w 4 -t blue`                       |
//! | Environment             | `OPTFIG_DEMO_WORKERS=8 cargo run --example optfig_demo`                 |
//! | Config file (cwd)       | Create `optfig-demo.toml` in cwd, then run without arguments            |
//! | Config file (explicit)  | `cargo run --example optfig_demo -- --config /etc/demo.toml`            |
//! | Precedence              | `OPTFIG_DEMO_WORKERS=8 cargo run --example optfig_demo -- -w 2`         |
//! | Validation failure      | `cargo run --example optfig_demo -- --listen nowhere`                   |
//! | Usage text              | `cargo run --example optfig_demo -- --help`                             |
//! | Effective tree          | Run with `-v` to print the config tree with overrides applied           |
//! | Debug logging           | `RUST_LOG=optfig=debug cargo run --example optfig_demo`                 |

mod options;

use std::process::ExitCode;

use tracing_subscriber::filter::EnvFilter;

use optfig::{Optfig, OptfigBuilder, Resolution, Schema, SearchPath, help, utf8_args};

const PROGRAM: &str = "optfig-demo";

fn make_builder(schema: Schema) -> OptfigBuilder {
    Optfig::builder()
        .schema(schema)
        .app_name(PROGRAM)
        .search_paths(vec![
            SearchPath::Platform,
            SearchPath::Home(".optfig-demo"),
            SearchPath::Cwd,
        ])
        .config_option("config")
}

fn report(resolution: &Resolution, verbose: bool) {
    match &resolution.config_path {
        Some(path) => println!("config file: {}", path.display()),
        None => println!("config file: (none)"),
    }
    println!();

    let width = resolution
        .options
        .iter()
        .map(|(name, _, _)| name.len())
        .max()
        .unwrap_or(0);
    for (name, value, source) in resolution.options.iter() {
        if verbose {
            println!("{name:<width$}  {value}  ({source})");
        } else {
            println!("{name:<width$}  {value}");
        }
    }

    if verbose && !resolution.tree.is_empty() {
        println!();
        println!("effective config tree:");
        match toml::to_string_pretty(resolution.tree.as_table()) {
            Ok(text) => print!("{text}"),
            Err(e) => eprintln!("(could not render tree: {e})"),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let schema = match options::schema() {
        Ok(schema) => schema,
        Err(e) => {
            eprintln!("{PROGRAM}: bad option declarations: {e}");
            return ExitCode::FAILURE;
        }
    };

    let args = match utf8_args(std::env::args_os().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprint!("{}", help::failure_report(&err, &schema, PROGRAM));
            return ExitCode::FAILURE;
        }
    };
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print!("{}", help::usage(&schema, PROGRAM));
        return ExitCode::SUCCESS;
    }

    let builder = make_builder(schema.clone()).args(args);
    match builder.resolve() {
        Ok(resolution) => {
            let verbose = resolution.options.get_bool("verbose").unwrap_or(false);
            report(&resolution, verbose);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprint!("{}", help::failure_report(&err, &schema, PROGRAM));
            ExitCode::FAILURE
        }
    }
}
