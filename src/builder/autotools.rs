use crate::env::Env;
use crate::error::Result;
use crate::os::Os;
use crate::value::for_each_scalar;

use super::Builder;

/// Builds an autoconf/automake source tree: `autoreconf -i` (if `configure`
/// is missing), `configure --prefix=... [--exec-prefix=...] ...`, `make`,
/// and (for `stage`) `make install DESTDIR=staging_dir`.
#[derive(Debug, Clone, Copy)]
pub struct AutotoolsBuilder;

fn dir_flag(env: &Env, name: &str, flag: &str, args: &mut Vec<String>) -> Result<()> {
    if let Some(value) = env.get_string(name, false)? {
        args.push(format!("{flag}={value}"));
    }
    Ok(())
}

fn configure_args(env: &Env, source_dir: &std::path::Path) -> Result<Vec<String>> {
    let mut args = vec![source_dir.join("configure").display().to_string()];
    let prefix = match env.get_string("prefix", false)? {
        Some(p) => p,
        None => env
            .get_string("install_prefix", false)?
            .unwrap_or_else(|| "/usr".to_string()),
    };
    args.push(format!("--prefix={prefix}"));
    dir_flag(env, "exec_prefix", "--exec-prefix", &mut args)?;
    dir_flag(env, "bin_dir", "--bindir", &mut args)?;
    dir_flag(env, "sbin_dir", "--sbindir", &mut args)?;
    dir_flag(env, "lib_dir", "--libdir", &mut args)?;
    dir_flag(env, "libexec_dir", "--libexecdir", &mut args)?;
    dir_flag(env, "share_dir", "--datadir", &mut args)?;
    dir_flag(env, "man_dir", "--mandir", &mut args)?;
    if let Some(extra) = env.get_value("autotools.configure.args")? {
        for_each_scalar(&extra, |scalar| {
            args.push(scalar.as_scalar(env)?);
            Ok(())
        })?;
    }
    Ok(args)
}

impl Builder for AutotoolsBuilder {
    fn build_needed(&self, _env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(true)
    }

    fn build(&self, env: &Env, os: &dyn Os) -> Result<()> {
        let source_dir = env.require_path("source_dir")?;
        let build_dir = env.require_path("build_dir")?;
        os.create_dir(&build_dir)?;
        if !os.file_exists(&source_dir.join("configure")) {
            let argv = ["autoreconf", "-i"];
            os.run(&argv, None)?;
        }
        let args = configure_args(env, &source_dir)?;
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        os.run(&argv, None)?;
        os.run(&["make"], None)
    }

    fn test_needed(&self, _env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(true)
    }

    fn test(&self, _env: &Env, os: &dyn Os) -> Result<()> {
        os.run(&["make", "check"], None)
    }

    fn stage_needed(&self, _env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(true)
    }

    fn stage(&self, env: &Env, os: &dyn Os) -> Result<()> {
        let staging_dir = env.require_path("staging_dir")?;
        let destdir = format!("DESTDIR={}", staging_dir.display());
        os.run(&["make", "install", &destdir], None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::MockOs;
    use crate::value::Value;

    fn basic_env() -> Env {
        let env = Env::new("pkg");
        env.add_override("source_dir", Value::scalar("/src"));
        env.add_override("build_dir", Value::scalar("/build"));
        env.add_override("staging_dir", Value::scalar("/stage"));
        env.add_override("install_prefix", Value::scalar("/usr"));
        env
    }

    #[test]
    fn build_runs_configure_and_make() {
        let env = basic_env();
        let os = MockOs::new();
        os.expect("[ -f /src/configure ]", "", "", 0);
        os.expect("/src/configure --prefix=/usr", "", "", 0);
        os.expect("make", "", "", 0);
        AutotoolsBuilder.build(&env, &os).unwrap();
        assert!(os.commands_run().contains(&"make".to_string()));
    }

    #[test]
    fn build_autoreconfs_when_configure_missing() {
        let env = basic_env();
        let os = MockOs::new();
        os.expect("[ -f /src/configure ]", "", "", 1);
        os.expect("autoreconf -i", "", "", 0);
        os.expect("/src/configure --prefix=/usr", "", "", 0);
        os.expect("make", "", "", 0);
        AutotoolsBuilder.build(&env, &os).unwrap();
        assert!(os.commands_run().contains(&"autoreconf -i".to_string()));
    }

    #[test]
    fn stage_sets_destdir() {
        let env = basic_env();
        let os = MockOs::new();
        os.expect("make install DESTDIR=/stage", "", "", 0);
        AutotoolsBuilder.stage(&env, &os).unwrap();
    }
}
