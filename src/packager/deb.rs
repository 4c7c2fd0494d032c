use crate::error::BuzzyError;
use crate::env::Env;
use crate::error::Result;
use crate::os::Os;

use super::common::{prepend_ldconfig, read_script, resolve_native_deps, Metadata};
use super::Packager;

/// Emits a `DEBIAN/control` directory and drives `dpkg-deb`/`dpkg`.
#[derive(Debug, Clone, Copy)]
pub struct DebPackager;

fn build_control(meta: &Metadata, version_str: &str, deps: &[(String, Option<crate::version::Version>)]) -> String {
    let mut lines = vec![
        format!("Package: {}", meta.name),
        format!("Version: {}", version_str),
        format!("Architecture: {}", meta.architecture),
        "Maintainer: unknown".to_string(),
    ];
    if !deps.is_empty() {
        let deps: Vec<String> = deps
            .iter()
            .map(|(name, min_version)| match min_version {
                Some(v) => format!("{} (>= {})", name, v.to_debian()),
                None => name.clone(),
            })
            .collect();
        lines.push(format!("Depends: {}", deps.join(", ")));
    }
    lines.push(format!("License: {}", meta.license));
    lines.push("Description: (no description provided)".to_string());
    lines.join("\n")
}

fn package_file_name(meta: &Metadata, version_str: &str) -> String {
    format!("{}_{}_{}.deb", meta.name, version_str, meta.architecture)
}

impl Packager for DebPackager {
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
        os.create_dir(&staging_dir.join("DEBIAN"))?;
        let version = env.require_version("version")?.to_debian_full(None);
        let meta = Metadata::gather(env, os)?;
        let deps = resolve_native_deps(&meta.dependencies, os)?;
        let control = build_control(&meta, &version, &deps);
        os.create_file(&staging_dir.join("DEBIAN/control"), control.as_bytes())?;

        let post_install = prepend_ldconfig(read_script(env, os, "post_install_script")?);
        let post_remove = prepend_ldconfig(read_script(env, os, "post_remove_script")?);
        os.create_file(&staging_dir.join("DEBIAN/postinst"), post_install.as_bytes())?;
        os.create_file(&staging_dir.join("DEBIAN/postrm"), post_remove.as_bytes())?;
        if let Some(pre_install) = read_script(env, os, "pre_install_script")? {
            os.create_file(&staging_dir.join("DEBIAN/preinst"), pre_install.as_bytes())?;
        }
        if let Some(pre_remove) = read_script(env, os, "pre_remove_script")? {
            os.create_file(&staging_dir.join("DEBIAN/prerm"), pre_remove.as_bytes())?;
        }

        let package_file = build_dir.join(package_file_name(&meta, &version));
        os.run(
            &[
                "dpkg-deb",
                "-b",
                &staging_dir.display().to_string(),
                &package_file.display().to_string(),
            ],
            None,
        )
    }

    fn install_needed(&self, env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(env.get_bool("force", false)?)
    }

    fn install(&self, env: &Env, os: &dyn Os) -> Result<()> {
        let build_dir = env.require_path("package_build_dir")?;
        let version = env.require_version("version")?.to_debian_full(None);
        let meta = Metadata::gather(env, os)?;
        let package_file = build_dir.join(package_file_name(&meta, &version));
        os.run(&["sudo", "dpkg", "-i", &package_file.display().to_string()], None)
    }

    fn uninstall_needed(&self, env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(env.get_bool("force", false)?)
    }

    fn uninstall(&self, env: &Env, os: &dyn Os) -> Result<()> {
        let name = env.require_string("name")?;
        os.run(&["sudo", "dpkg", "-r", &name], None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::Dependency;
    use crate::os::MockOs;
    use crate::package::Package;
    use crate::pdb::{self, Pdb};
    use crate::value::Value;
    use crate::version::Version;
    use std::rc::Rc;

    /// Resolves any dependency straight to a fixed native package, standing
    /// in for a real distro adapter's name translation.
    #[derive(Debug)]
    struct FixedNativePdb(Rc<Package>);

    impl Pdb for FixedNativePdb {
        fn satisfy(&self, _dep: &Dependency, _os: &dyn crate::os::Os) -> Result<Option<Rc<Package>>> {
            Ok(Some(self.0.clone()))
        }
    }

    #[test]
    fn control_includes_translated_dependency_version() {
        let env = Env::new("pkg");
        env.add_override("name", Value::scalar("foo"));
        env.add_override(
            "dependencies",
            Value::array(vec![Value::scalar("bar >= 2.4+rev.1")]),
        );
        let os = MockOs::new();
        os.expect("uname -m", "x86_64\n", "", 0);

        pdb::reset_registry();
        let native = Package::new_native(
            Env::new("libbar-dev"),
            "libbar-dev",
            Version::parse("2.5").unwrap(),
            |_os| Ok(()),
            |_os| Ok(()),
        );
        pdb::register(Rc::new(FixedNativePdb(native)));

        let meta = Metadata::gather(&env, &os).unwrap();
        let deps = resolve_native_deps(&meta.dependencies, &os).unwrap();
        pdb::reset_registry();

        let control = build_control(&meta, "1.0-1", &deps);
        assert!(control.contains("libbar-dev (>= 2.4-1)"));
    }
}
