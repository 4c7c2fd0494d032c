//! Buzzy - a cross-distribution package builder
//!
//! Main entry point for the buzzy CLI application.

use std::process::ExitCode;

use console::style;
use tracing_subscriber::EnvFilter;

use buzzy::cli::{self, Cli, Commands};
use buzzy::error::Result;
use buzzy::os::RealOs;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    setup_logging(&cli);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Set up logging from the cumulative `-v`/`-q` count.
fn setup_logging(cli: &Cli) {
    let level = match cli.verbosity() {
        v if v >= 2 => "debug",
        v if v >= 1 => "info",
        v if v <= -1 => "error",
        _ => "warn",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let os = RealOs::new();
    let verbosity = cli.verbosity();

    if cli.force {
        buzzy::env::global_env().add_override("force", buzzy::value::Value::scalar("true"));
    }

    match cli.command {
        Commands::Build(args) => cli::execute_build(&args, &os, verbosity),
        Commands::Install(args) => cli::execute_install(&args, &os, verbosity),
        Commands::Uninstall(args) => cli::execute_uninstall(&args, &os, verbosity),
        Commands::Test(args) => cli::execute_test(&args, &os, verbosity),
        Commands::Update => cli::execute_update(&os),
        Commands::Info => cli::execute_info(&os),
        Commands::Doc(args) => cli::execute_doc(&args, &os),
        Commands::Get(args) => cli::execute_get(&args, &os),
        Commands::Vercmp(args) => cli::execute_vercmp(&args),
        Commands::Raw(raw) => match raw {
            cli::RawCommands::Build(args) => cli::execute_raw_build(&args, &os, cli.force),
            cli::RawCommands::Pkg(args) => cli::execute_raw_pkg(&args, &os, cli.force),
        },
        Commands::Config(args) => cli::execute_config(&args),
    }
}
