//! Command execution handlers

use std::rc::Rc;

use crate::config::CliConfig;
use crate::dependency::Dependency;
use crate::env::{self, Env};
use crate::error::{BuzzyError, Result};
use crate::os::Os;
use crate::package::Package;
use crate::repo::{self, Repo};
use crate::value::{InterpolatedScalar, Value};
use crate::version::Version;

/// Build the repository rooted at the current working directory, applying
/// the CLI config's initial overrides and the host's native-distro overrides
/// to the global env. Called once, at the top of every subcommand.
fn open_base_repo(os: &dyn Os) -> Result<Rc<Repo>> {
    let config = CliConfig::load()?;
    seed_global_env(&config);
    crate::distro::apply_overrides(&env::global_env(), os);

    let cwd = std::env::current_dir()?;
    let repo = Rc::new(Repo::filesystem(cwd));
    repo.load(os)?;
    Ok(repo)
}

fn seed_global_env(config: &CliConfig) {
    let global = env::global_env();
    if let Some(ref cache_dir) = config.cache_dir_override {
        global.add_override("cache_path", Value::scalar(cache_dir.display().to_string()));
    }
    if let Some(ref packager) = config.preferred_packager {
        global.add_override("packager", Value::scalar(packager.clone()));
    }
    if config.always_force {
        global.add_override("force", Value::scalar("true"));
    }
}

/// Apply a `-P name=value` package-var override, in the teacher's
/// `name=value`-splitting style.
fn apply_package_var(env: &Env, spec: &str) -> Result<()> {
    let (name, value) = spec
        .split_once('=')
        .ok_or_else(|| BuzzyError::bad_config(format!("Missing variable value in \"{spec}\"")))?;
    env.add_override(name, Value::Scalar(Rc::new(InterpolatedScalar::parse(value)?)));
    Ok(())
}

/// Resolve each dependency string to a concrete package, or (if none are
/// given) fall back to the current directory's default package.
fn satisfy_dependencies(
    deps: &[String],
    base_repo: &Repo,
    os: &dyn Os,
    verbosity: i64,
) -> Result<Vec<Rc<Package>>> {
    env::global_env().add_override("verbose", Value::scalar(if verbosity > 0 { "1" } else { "0" }));

    if deps.is_empty() {
        let package = base_repo.default_package().ok_or_else(|| {
            BuzzyError::bad_config("Must provide at least one package dependency.")
        })?;
        package
            .env()
            .add_override("verbose", Value::scalar(if verbosity >= 0 { "1" } else { "0" }));
        return Ok(vec![package]);
    }

    let mut packages = Vec::with_capacity(deps.len());
    for dep_str in deps {
        let dep = Dependency::parse(dep_str)?;
        let package = crate::pdb::satisfy_dependency(&dep, os)?;
        package
            .env()
            .add_override("verbose", Value::scalar(if verbosity >= 0 { "1" } else { "0" }));
        packages.push(package);
    }
    Ok(packages)
}

fn run_on_packages(
    deps: &super::DepsArgs,
    os: &dyn Os,
    verbosity: i64,
    step: impl Fn(&Package, &dyn Os) -> Result<()>,
) -> Result<()> {
    let base_repo = open_base_repo(os)?;
    let packages = satisfy_dependencies(&deps.dependencies, &base_repo, os, verbosity)?;
    for package in &packages {
        repo::install_dependencies(package.env(), os)?;
        step(package, os)?;
    }
    Ok(())
}

/// Execute the build command
pub fn execute_build(args: &super::DepsArgs, os: &dyn Os, verbosity: i64) -> Result<()> {
    run_on_packages(args, os, verbosity, |p, os| p.build(os))
}

/// Execute the install command
pub fn execute_install(args: &super::DepsArgs, os: &dyn Os, verbosity: i64) -> Result<()> {
    run_on_packages(args, os, verbosity, |p, os| p.install(os))
}

/// Execute the test command
pub fn execute_test(args: &super::DepsArgs, os: &dyn Os, verbosity: i64) -> Result<()> {
    run_on_packages(args, os, verbosity, |p, os| p.test(os))
}

/// Execute the uninstall command
pub fn execute_uninstall(args: &super::DepsArgs, os: &dyn Os, verbosity: i64) -> Result<()> {
    run_on_packages(args, os, verbosity, |p, os| p.uninstall(os))
}

/// Execute the update command
pub fn execute_update(os: &dyn Os) -> Result<()> {
    let base_repo = open_base_repo(os)?;
    base_repo.update(os)
}

/// Execute the info command
pub fn execute_info(os: &dyn Os) -> Result<()> {
    let base_repo = open_base_repo(os)?;
    match base_repo.default_package() {
        Some(package) => {
            println!("Repositories:");
            println!("  {} {}", package.name(), package.version());
        }
        None => println!("No repositories found!"),
    }
    Ok(())
}

fn doc_env(os: &dyn Os) -> Result<Env> {
    let base_repo = open_base_repo(os)?;
    Ok(match base_repo.default_package() {
        Some(package) => package.env().clone(),
        None => base_repo.env().clone(),
    })
}

/// Execute the doc command
pub fn execute_doc(args: &super::VarArgs, os: &dyn Os) -> Result<()> {
    let env = doc_env(os)?;

    match env::global_default_doc(&args.variable) {
        Some((short_desc, long_desc)) => {
            println!("{}", args.variable);
            if !short_desc.is_empty() {
                println!("  {short_desc}");
            }
            if !long_desc.is_empty() {
                println!("\n  {long_desc}");
            }
        }
        None => {
            return Err(BuzzyError::bad_config(format!(
                "No such configuration variable: {}",
                args.variable
            )));
        }
    }

    match env.get_value(&args.variable)? {
        None => println!("\n  No current value"),
        Some(Value::Scalar(scalar)) => {
            println!("\n  Current value: {}", scalar.get(&env)?);
        }
        Some(_) => println!("\n  Current value: [non-scalar]"),
    }

    Ok(())
}

/// Execute the get command
pub fn execute_get(args: &super::VarArgs, os: &dyn Os) -> Result<()> {
    let env = doc_env(os)?;
    match env.get_value(&args.variable)? {
        None => {
            return Err(BuzzyError::bad_config(format!(
                "No variable named {}",
                args.variable
            )));
        }
        Some(Value::Scalar(scalar)) => println!("{}", scalar.get(&env)?),
        Some(_) => return Err(BuzzyError::bad_config("Cannot print non-scalar variables")),
    }
    Ok(())
}

/// Execute the vercmp command
pub fn execute_vercmp(args: &super::VercmpArgs) -> Result<()> {
    let v1 = Version::parse(&args.v1)?;
    let v2 = Version::parse(&args.v2)?;
    match v1.cmp(&v2) {
        std::cmp::Ordering::Less => println!("-1"),
        std::cmp::Ordering::Equal => println!("0"),
        std::cmp::Ordering::Greater => println!("1"),
    }
    Ok(())
}

/// Execute `raw build`
pub fn execute_raw_build(args: &super::RawBuildArgs, os: &dyn Os, force: bool) -> Result<()> {
    let package_env = Env::new_child("package", &env::global_env());
    let cwd = std::env::current_dir()?;
    package_env.add_override("source_dir", Value::scalar(cwd.display().to_string()));
    package_env.add_override("force", Value::scalar(force.to_string()));

    for spec in &args.package_var {
        apply_package_var(&package_env, spec)?;
    }

    let builder_name = match package_env.get_string("builder", false)? {
        Some(name) => name,
        None => crate::builder::detect(&package_env, os)?,
    };
    package_env.add_backup("builder", Value::scalar(builder_name));
    let builder = crate::builder::from_env(&package_env)?;

    if builder.build_needed(&package_env, os)? {
        builder.build(&package_env, os)?;
    }
    Ok(())
}

/// Execute `raw pkg`
pub fn execute_raw_pkg(args: &super::RawPkgArgs, os: &dyn Os, force: bool) -> Result<()> {
    let package_env = Env::new_child("package", &env::global_env());
    package_env.add_override("name", Value::scalar(args.name.clone()));
    package_env.add_override("version", Value::scalar(args.version.clone()));
    package_env.add_override("force", Value::scalar(force.to_string()));
    package_env.add_override(
        "staging_dir",
        Value::scalar(args.staging_dir.display().to_string()),
    );
    if let Some(ref packager_name) = args.packager {
        package_env.add_override("packager", Value::scalar(packager_name.clone()));
    }

    for spec in &args.package_var {
        apply_package_var(&package_env, spec)?;
    }

    let packager_name = match package_env.get_string("packager", false)? {
        Some(name) => name,
        None => crate::packager::detect(os).ok_or_else(|| {
            BuzzyError::bad_config("Could not detect a native packager for this host")
        })?.to_string(),
    };
    package_env.add_backup("packager", Value::scalar(packager_name));
    let packager = crate::packager::from_env(&package_env)?;

    if packager.package_needed(&package_env, os)? {
        packager.package(&package_env, os)?;
    }
    Ok(())
}

/// Execute the config command
pub fn execute_config(args: &super::ConfigArgs) -> Result<()> {
    match &args.command {
        super::ConfigCommands::Show => {
            let config = CliConfig::load()?;
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| BuzzyError::bad_config(e.to_string()))?
            );
        }
        super::ConfigCommands::Edit => {
            let config_path = CliConfig::config_path()?;
            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "nano".to_string());
            std::process::Command::new(editor).arg(&config_path).status()?;
        }
        super::ConfigCommands::Reset => {
            CliConfig::reset()?;
            println!("Configuration reset to defaults");
        }
        super::ConfigCommands::Set { key, value } => {
            let mut config = CliConfig::load()?;
            config.set(key, value)?;
            config.save()?;
            println!("Set {key} = {value}");
        }
        super::ConfigCommands::Get { key } => {
            let config = CliConfig::load()?;
            if let Some(value) = config.get(key) {
                println!("{value}");
            } else {
                println!("Key '{key}' not found");
            }
        }
        super::ConfigCommands::Init { force } => {
            CliConfig::init(*force)?;
            println!("Configuration initialized");
        }
    }

    Ok(())
}
