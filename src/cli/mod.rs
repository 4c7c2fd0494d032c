//! Command-line interface for buzzy

mod commands;

pub use commands::*;

use clap::{Parser, Subcommand};

/// Buzzy - a cross-distribution package builder
#[derive(Parser, Debug)]
#[command(name = "buzzy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Print out more information about the steps being performed.
    /// Providing this option multiple times increases the verbosity further.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print out less information about the steps being performed.
    /// Providing this option multiple times decreases the verbosity further.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Ignore idempotence checks and rebuild/repackage/reinstall anyway.
    #[arg(short, long, global = true)]
    pub force: bool,
}

impl Cli {
    /// Net verbosity after cumulative `-v`/`-q`: positive is more verbose,
    /// negative is quieter than the default.
    pub fn verbosity(&self) -> i64 {
        self.verbose as i64 - self.quiet as i64
    }

    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a package, and anything it depends on
    Build(DepsArgs),

    /// Install a package, and anything it depends on
    Install(DepsArgs),

    /// Uninstall a package
    Uninstall(DepsArgs),

    /// Build and test a package, and anything it depends on
    Test(DepsArgs),

    /// Update the current repository and its dependencies
    Update,

    /// Print information about the current Buzzy repository
    Info,

    /// Describe a Buzzy configuration variable
    Doc(VarArgs),

    /// Get the value of a Buzzy configuration variable
    Get(VarArgs),

    /// Compare two Buzzy version strings
    Vercmp(VercmpArgs),

    /// Low-level functions for working with packages, without a repository
    #[command(subcommand)]
    Raw(RawCommands),

    /// Manage the on-disk CLI configuration file
    Config(ConfigArgs),
}

/// One or more dependency specs (`name` or `name >= version`). If omitted,
/// operates on the current directory's default package.
#[derive(Parser, Debug)]
pub struct DepsArgs {
    /// Dependencies to satisfy (e.g. `jansson` or `"jansson >= 2.4"`)
    pub dependencies: Vec<String>,
}

/// A single configuration variable name.
#[derive(Parser, Debug)]
pub struct VarArgs {
    /// Variable name
    pub variable: String,
}

/// Arguments for the vercmp command
#[derive(Parser, Debug)]
pub struct VercmpArgs {
    /// First version string
    pub v1: String,
    /// Second version string
    pub v2: String,
}

/// Low-level `raw` subcommands, operating on a working directory without a repository
#[derive(Subcommand, Debug)]
pub enum RawCommands {
    /// Build a package whose source code is in the current directory
    Build(RawBuildArgs),
    /// Create a binary package from a staging directory
    Pkg(RawPkgArgs),
}

/// Arguments for `raw build`
#[derive(Parser, Debug)]
pub struct RawBuildArgs {
    /// Override the value of a package-specific configuration option
    /// (`name=value`)
    #[arg(short = 'P', long = "package-var")]
    pub package_var: Vec<String>,
}

/// Arguments for `raw pkg`
#[derive(Parser, Debug)]
pub struct RawPkgArgs {
    /// Staging directory containing the full installation prefix
    pub staging_dir: std::path::PathBuf,

    /// Package name
    #[arg(long)]
    pub name: String,

    /// Package version
    #[arg(long)]
    pub version: String,

    /// Native packager to use (auto-detected if omitted)
    #[arg(long)]
    pub packager: Option<String>,

    /// Override the value of a package-specific configuration option
    /// (`name=value`)
    #[arg(short = 'P', long = "package-var")]
    pub package_var: Vec<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Edit configuration file
    Edit,
    /// Reset configuration to defaults
    Reset,
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn verbosity_nets_quiet_against_verbose() {
        let cli = Cli::parse_from(["buzzy", "-v", "-v", "-q", "info"]);
        assert_eq!(cli.verbosity(), 1);
    }
}
