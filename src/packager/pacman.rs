use crate::env::Env;
use crate::error::Result;
use crate::os::Os;
use crate::version::Version;

use super::common::Metadata;
use super::Packager;

/// Emits a PKGBUILD and drives `makepkg`/`pacman`.
#[derive(Debug, Clone, Copy)]
pub struct PacmanPackager;

fn build_pkgbuild(env: &Env, meta: &Metadata, version: &Version) -> String {
    let mut lines = Vec::new();
    lines.push(format!("pkgname={}", meta.name));
    lines.push(format!("pkgver={}", version.to_pacman()));
    lines.push("pkgrel=1".to_string());
    lines.push(format!("arch=('{}')", meta.architecture));
    lines.push(format!("license=('{}')", meta.license));
    if !meta.dependencies.is_empty() {
        let deps: Vec<String> = meta
            .dependencies
            .iter()
            .map(|d| format!("'{}'", d))
            .collect();
        lines.push(format!("depends=({})", deps.join(" ")));
    }
    if !meta.build_dependencies.is_empty() {
        let deps: Vec<String> = meta
            .build_dependencies
            .iter()
            .map(|d| format!("'{}'", d))
            .collect();
        lines.push(format!("makedepends=({})", deps.join(" ")));
    }
    lines.push(String::new());
    lines.push("package() {".to_string());
    lines.push(format!(
        "    cp -a \"{}\"/* \"$pkgdir\"/",
        env.require_path("staging_dir").map(|p| p.display().to_string()).unwrap_or_default()
    ));
    lines.push("}".to_string());
    lines.join("\n")
}

const PKGREL: &str = "1";
const PKGEXT: &str = ".pkg.tar.xz";

fn package_file_name(meta: &Metadata, version: &Version) -> String {
    format!(
        "{}-{}-{}-{}{}",
        meta.name,
        version.to_pacman(),
        PKGREL,
        meta.architecture,
        PKGEXT
    )
}

impl Packager for PacmanPackager {
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
            return Err(crate::error::BuzzyError::bad_config(
                "Staging directory does not exist",
            ));
        }
        let build_dir = env.require_path("package_build_dir")?;
        os.create_dir(&build_dir)?;
        let version = env.require_version("version")?;
        let meta = Metadata::gather(env, os)?;
        let pkgbuild = build_pkgbuild(env, &meta, &version);
        os.create_file(&build_dir.join("PKGBUILD"), pkgbuild.as_bytes())?;
        os.run(&["makepkg", "-f"], None)
    }

    fn install_needed(&self, env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(env.get_bool("force", false)?)
    }

    fn install(&self, env: &Env, os: &dyn Os) -> Result<()> {
        let build_dir = env.require_path("package_build_dir")?;
        let version = env.require_version("version")?;
        let meta = Metadata::gather(env, os)?;
        let package_file = build_dir.join(package_file_name(&meta, &version));
        os.run(
            &["sudo", "pacman", "-U", "--noconfirm", &package_file.display().to_string()],
            None,
        )
    }

    fn uninstall_needed(&self, env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(env.get_bool("force", false)?)
    }

    fn uninstall(&self, env: &Env, os: &dyn Os) -> Result<()> {
        let name = env.require_string("name")?;
        os.run(&["sudo", "pacman", "-R", "--noconfirm", &name], None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::MockOs;
    use crate::value::Value;

    #[test]
    fn pkgbuild_contains_pacman_version() {
        let env = Env::new("pkg");
        env.add_override("name", Value::scalar("foo"));
        env.add_override("staging_dir", Value::scalar("/stage"));
        let os = MockOs::new();
        os.expect("uname -m", "x86_64\n", "", 0);
        let meta = Metadata::gather(&env, &os).unwrap();
        let version = Version::parse("1.0~1").unwrap();
        let pkgbuild = build_pkgbuild(&env, &meta, &version);
        assert!(pkgbuild.contains("pkgver=1.0.pre1"));
    }
}
