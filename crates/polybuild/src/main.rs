//! polybuild CLI - workspace build orchestrator

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use miette::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use polybuild::build::{BuildTypeRegistry, VerbOptions};
use polybuild::cache::ManifestCache;
use polybuild::commands;

/// polybuild - workspace build orchestrator
#[derive(Debug, Parser)]
#[command(name = "polybuild")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build all packages in a workspace
    Build(commands::build::BuildArgs),

    /// Build a single package
    BuildPkg(commands::build_pkg::BuildPkgArgs),
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let registry = BuildTypeRegistry::with_default_handlers()?;
    let mut cache = ManifestCache::new();

    let raw_args: Vec<String> = std::env::args().collect();
    let verb = raw_args.get(1).cloned().unwrap_or_default();

    // Let the handler preprocessors split their pass-through groups off
    // the command line before clap parses it, then let the handlers add
    // their own options to the verb's parser. Failures to detect a
    // build type here must not abort the process, so that help output
    // can still be produced.
    let mut command = Cli::command();
    let (args, extras) = match verb.as_str() {
        "build" => {
            let (args, extras) = commands::preprocess_build_args(&registry, raw_args);
            command = command.mut_subcommand("build", |sub| {
                registry
                    .handlers()
                    .fold(sub, |sub, handler| handler.prepare_arguments(sub))
            });
            (args, extras)
        }
        "build-pkg" => {
            let (args, extras, handler) =
                commands::preprocess_build_pkg_args(&registry, &mut cache, raw_args);
            if let Some(handler) = handler {
                command = command.mut_subcommand("build-pkg", |sub| handler.prepare_arguments(sub));
            }
            (args, extras)
        }
        _ => (raw_args, Default::default()),
    };

    let matches = command.get_matches_from(args);
    let cli = Cli::from_arg_matches(&matches).map_err(|e| miette::miette!("{}", e))?;

    let verb_matches = matches
        .subcommand()
        .map(|(_, m)| m.clone())
        .unwrap_or_default();
    let options = VerbOptions::new(verb_matches, extras);

    let exit_code = match cli.command {
        Commands::Build(args) => commands::build::run(args, &options, &registry, &mut cache)?,
        Commands::BuildPkg(args) => {
            commands::build_pkg::run(args, &options, &registry, &mut cache)?
        }
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
