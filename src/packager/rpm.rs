use crate::error::BuzzyError;
use crate::env::Env;
use crate::error::Result;
use crate::os::Os;

use super::common::{prepend_ldconfig, read_script, resolve_native_deps, Metadata};
use super::Packager;

/// Emits a `.spec` file and drives `rpmbuild`/`rpm`.
#[derive(Debug, Clone, Copy)]
pub struct RpmPackager;

fn build_spec(
    meta: &Metadata,
    version: &str,
    release: &str,
    requires: &[(String, Option<crate::version::Version>)],
    build_requires: &[(String, Option<crate::version::Version>)],
) -> String {
    let mut lines = vec![
        format!("Name: {}", meta.name),
        format!("Version: {}", version),
        format!("Release: {}", release),
        format!("License: {}", meta.license),
        format!("BuildArch: {}", meta.architecture),
    ];
    for (name, min_version) in requires {
        match min_version {
            Some(v) => lines.push(format!("Requires: {} >= {}", name, v)),
            None => lines.push(format!("Requires: {}", name)),
        }
    }
    for (name, min_version) in build_requires {
        match min_version {
            Some(v) => lines.push(format!("BuildRequires: {} >= {}", name, v)),
            None => lines.push(format!("BuildRequires: {}", name)),
        }
    }
    lines.join("\n")
}

fn package_file_name(meta: &Metadata, version: &str, release: &str) -> String {
    format!("{}-{}-{}.{}.rpm", meta.name, version, release, meta.architecture)
}

impl Packager for RpmPackager {
    fn package_needed(&self, env: &Env, os: &dyn Os) -> Result<bool> {
        if env.get_bool("force", false)? {
            return Ok(true);
        }
        let out_dir = env.require_path("package_build_dir")?;
        Ok(!os.file_exists(&out_dir))
    }

    fn package(&self, env: &Env, os: &dyn Os) -> Result<()> {
        let staging_dir = env.require_path("staging_dir")?;
        if !os.file_exists(&staging_dir) {
            return Err(BuzzyError::bad_config("Staging directory does not exist"));
        }
        let build_dir = env.require_path("package_build_dir")?;
        os.create_dir(&build_dir)?;
        let version = env.require_version("version")?;
        let (ver, rel) = version.to_rpm();
        let meta = Metadata::gather(env, os)?;
        let requires = resolve_native_deps(&meta.dependencies, os)?;
        let build_requires = resolve_native_deps(&meta.build_dependencies, os)?;
        let spec = build_spec(&meta, &ver, &rel, &requires, &build_requires);
        let name = meta.name.clone();
        os.create_file(&build_dir.join(format!("{name}.spec")), spec.as_bytes())?;

        let _post_install = prepend_ldconfig(read_script(env, os, "post_install_script")?);
        let _post_remove = prepend_ldconfig(read_script(env, os, "post_remove_script")?);

        os.run(
            &["rpmbuild", "-bb", &build_dir.join(format!("{name}.spec")).display().to_string()],
            None,
        )
    }

    fn install_needed(&self, env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(env.get_bool("force", false)?)
    }

    fn install(&self, env: &Env, os: &dyn Os) -> Result<()> {
        let build_dir = env.require_path("package_build_dir")?;
        let version = env.require_version("version")?;
        let (ver, rel) = version.to_rpm();
        let meta = Metadata::gather(env, os)?;
        let package_file = build_dir.join(package_file_name(&meta, &ver, &rel));
        os.run(&["sudo", "rpm", "-U", &package_file.display().to_string()], None)
    }

    fn uninstall_needed(&self, env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(env.get_bool("force", false)?)
    }

    fn uninstall(&self, env: &Env, os: &dyn Os) -> Result<()> {
        let name = env.require_string("name")?;
        os.run(&["sudo", "rpm", "-e", &name], None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::MockOs;
    use crate::value::Value;

    #[test]
    fn spec_contains_split_version_release() {
        let env = Env::new("pkg");
        env.add_override("name", Value::scalar("foo"));
        let os = MockOs::new();
        os.expect("uname -m", "x86_64\n", "", 0);
        let meta = Metadata::gather(&env, &os).unwrap();
        let version = crate::version::Version::parse("1.0").unwrap();
        let (ver, rel) = version.to_rpm();
        let spec = build_spec(&meta, &ver, &rel, &[], &[]);
        assert!(spec.contains("Version: 1.0"));
        assert!(spec.contains("Release: 1"));
        assert!(!spec.contains("Release: -1"));
    }
}
