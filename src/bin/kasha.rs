//! Command-line interface for kasha
//!
//! Usage:
//!   kasha `<path>` [-o `<output>`] [--ldflags a,b]   - Build a native executable (default a.out)
//!   kasha `<path>` --run                            - Interpret the program with the VM
//!   kasha `<path>` --emit `<format>`                - Print an intermediate artifact
//!
//! `--config <toml>` layers a configuration file over the built-in defaults and
//! `--stack-capacity <n>` overrides `vm.stack_capacity`. Logging goes to stderr
//! and is controlled with `RUST_LOG`.

use clap::builder::PossibleValuesParser;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use kasha::kasha::config::{KashaConfig, Loader};
use kasha::kasha::parsing::{format_source_context, ParseError};
use kasha::kasha::pipeline::{OutputFormat, Pipeline, PipelineError};
use std::io;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();
    let matches = build_cli().get_matches();

    let config = load_config(&matches).unwrap_or_else(|e| fail(&e, None));
    let pipeline = Pipeline::new(config);

    let path = matches
        .get_one::<String>("path")
        .expect("path is a required argument");
    let source = Pipeline::load_source(path).unwrap_or_else(|e| fail(&e, None));

    if let Err(e) = execute(&pipeline, &source, &matches) {
        fail(&e, Some(&source));
    }
}

fn build_cli() -> Command {
    Command::new("kasha")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compile or interpret kasha programs")
        .arg_required_else_help(true)
        .arg(
            Arg::new("path")
                .help("Path to the source file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Path of the native executable")
                .default_value("a.out"),
        )
        .arg(
            Arg::new("run")
                .long("run")
                .help("Interpret the program instead of building an executable")
                .action(ArgAction::SetTrue)
                .conflicts_with("emit"),
        )
        .arg(
            Arg::new("ldflags")
                .long("ldflags")
                .help("Extra linker flags, comma separated (e.g. -lc,-static)")
                .value_delimiter(',')
                .allow_hyphen_values(true)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("emit")
                .long("emit")
                .help("Print an intermediate artifact instead of building")
                .value_parser(PossibleValuesParser::new(OutputFormat::names())),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Configuration file layered over the defaults"),
        )
        .arg(
            Arg::new("stack-capacity")
                .long("stack-capacity")
                .help("VM value stack capacity")
                .value_parser(value_parser!(usize)),
        )
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_config(matches: &ArgMatches) -> Result<KashaConfig, PipelineError> {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if let Some(capacity) = matches.get_one::<usize>("stack-capacity") {
        let capacity = i64::try_from(*capacity).unwrap_or(i64::MAX);
        loader = loader.set_override("vm.stack_capacity", capacity)?;
    }
    Ok(loader.build()?)
}

fn execute(pipeline: &Pipeline, source: &str, matches: &ArgMatches) -> Result<(), PipelineError> {
    if let Some(name) = matches.get_one::<String>("emit") {
        let format: OutputFormat = name.parse()?;
        let rendered = pipeline.emit(source, format)?;
        if rendered.ends_with('\n') {
            print!("{}", rendered);
        } else {
            println!("{}", rendered);
        }
        return Ok(());
    }

    if matches.get_flag("run") {
        pipeline.run(source, io::stdout().lock())?;
        return Ok(());
    }

    let output = matches
        .get_one::<String>("output")
        .expect("output has a default value");
    let ldflags: Vec<String> = matches
        .get_many::<String>("ldflags")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    pipeline.build_native(source, Path::new(output), &ldflags)
}

/// Report `error` on stderr and exit with status 1
fn fail(error: &PipelineError, source: Option<&str>) -> ! {
    eprintln!("Error: {}", error);
    if let (PipelineError::Parse(ParseError::Syntax(syntax)), Some(source)) = (error, source) {
        eprintln!();
        eprint!("{}", format_source_context(source, &syntax.range));
    }
    std::process::exit(1);
}
