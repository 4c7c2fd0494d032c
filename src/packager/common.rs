//! Shared metadata gathering used by every concrete packager.

use crate::dependency::Dependency;
use crate::env::Env;
use crate::error::Result;
use crate::os::Os;
use crate::value::for_each_scalar;

/// The fields every native metadata file (PKGBUILD, control, .spec) draws
/// from the env.
pub struct Metadata {
    pub name: String,
    pub architecture: String,
    pub license: String,
    pub dependencies: Vec<Dependency>,
    pub build_dependencies: Vec<Dependency>,
}

impl Metadata {
    pub fn gather(env: &Env, os: &dyn Os) -> Result<Self> {
        let name = env.require_string("name")?;
        let architecture = env.architecture(os)?;
        let license = env
            .get_string("license", false)?
            .unwrap_or_else(|| "unknown".to_string());
        let dependencies = gather_deps(env, "dependencies")?;
        let build_dependencies = gather_deps(env, "build_dependencies")?;
        Ok(Self {
            name,
            architecture,
            license,
            dependencies,
            build_dependencies,
        })
    }
}

fn gather_deps(env: &Env, key: &str) -> Result<Vec<Dependency>> {
    let mut deps = Vec::new();
    if let Some(value) = env.get_value(key)? {
        for_each_scalar(&value, |scalar| {
            let text = scalar.as_scalar(env)?;
            deps.push(Dependency::parse(&text)?);
            Ok(())
        })?;
    }
    Ok(deps)
}

/// Resolve each dependency through the package database and pair its
/// distro-native name with the minimum version the dependency asked for.
/// Used by packagers whose native metadata format (control, .spec) wants the
/// name the distro's own package manager knows the dependency by, rather
/// than the name it's declared under in the repo.
pub fn resolve_native_deps(
    deps: &[Dependency],
    os: &dyn Os,
) -> Result<Vec<(String, Option<crate::version::Version>)>> {
    deps.iter()
        .map(|dep| {
            let package = crate::pdb::satisfy_dependency(dep, os)?;
            Ok((package.name().to_string(), dep.min_version.clone()))
        })
        .collect()
}

/// Read a script path from `env`, if the caller provided one.
pub fn read_script(env: &Env, os: &dyn Os, key: &str) -> Result<Option<String>> {
    match env.get_path(key, false)? {
        Some(path) if os.file_exists(&path) => {
            let bytes = os.load_file(&path)?;
            Ok(Some(String::from_utf8_lossy(&bytes).to_string()))
        }
        _ => Ok(None),
    }
}

/// Prepend `/sbin/ldconfig` to a post-install/post-remove script body, for
/// shared-library correctness on deb and rpm.
pub fn prepend_ldconfig(script: Option<String>) -> String {
    match script {
        Some(body) => format!("/sbin/ldconfig\n{body}"),
        None => "/sbin/ldconfig\n".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::MockOs;
    use crate::value::Value;

    #[test]
    fn gathers_dependencies() {
        let env = Env::new("pkg");
        env.add_override("name", Value::scalar("foo"));
        env.add_override(
            "dependencies",
            Value::array(vec![Value::scalar("bar >= 1.0"), Value::scalar("baz")]),
        );
        let os = MockOs::new();
        os.expect("uname -m", "x86_64\n", "", 0);
        let meta = Metadata::gather(&env, &os).unwrap();
        assert_eq!(meta.dependencies.len(), 2);
        assert_eq!(meta.dependencies[0].name, "bar");
    }

    #[test]
    fn ldconfig_is_always_prepended() {
        assert_eq!(prepend_ldconfig(None), "/sbin/ldconfig\n");
        assert_eq!(
            prepend_ldconfig(Some("echo hi".to_string())),
            "/sbin/ldconfig\necho hi"
        );
    }
}
