//! A PDB that wraps a native distro package manager: given a dependency, try
//! a list of name patterns (`"%s"`, `"lib%s"`, ...) until the distro tool
//! reports an available version.

use std::rc::Rc;

use crate::dependency::Dependency;
use crate::env::Env;
use crate::error::Result;
use crate::os::Os;
use crate::package::Package;
use crate::value::Value;
use crate::version::Version;

use super::Pdb;

/// Parameterises [`NativePdb`] with the distro-specific bits: how to query
/// availability/installed version, how to install/uninstall, and the name
/// patterns to try.
pub trait NativeAdapter: std::fmt::Debug {
    fn short_distro_name(&self) -> &str;
    fn version_available(&self, native_name: &str, os: &dyn Os) -> Result<Option<Version>>;
    fn version_installed(&self, native_name: &str, os: &dyn Os) -> Result<Option<Version>>;
    fn do_install(&self, native_name: &str, version: &Version, os: &dyn Os) -> Result<()>;
    fn do_uninstall(&self, native_name: &str, os: &dyn Os) -> Result<()>;
    fn name_patterns(&self) -> &[&'static str];
}

#[derive(Debug)]
pub struct NativePdb<A: NativeAdapter> {
    adapter: Rc<A>,
}

impl<A: NativeAdapter + 'static> NativePdb<A> {
    pub fn new(adapter: A) -> Self {
        Self {
            adapter: Rc::new(adapter),
        }
    }

    fn resolve_native_name(&self, dep: &Dependency, env: &Env) -> Result<Option<String>> {
        let distro = self.adapter.short_distro_name().to_lowercase();
        if let Some(v) = env.get_string(&format!("native.{distro}.{}", dep.name), false)? {
            return Ok(Some(v));
        }
        if let Some(v) = env.get_string(&format!("native.{}", dep.name), false)? {
            return Ok(Some(v));
        }
        Ok(None)
    }

    fn is_preinstalled(&self, dep: &Dependency, env: &Env) -> Result<bool> {
        let distro = self.adapter.short_distro_name().to_lowercase();
        env.get_bool(&format!("preinstalled.{distro}.{}", dep.name), false)
    }
}

impl<A: NativeAdapter + 'static> Pdb for NativePdb<A> {
    fn satisfy(&self, dep: &Dependency, os: &dyn Os) -> Result<Option<Rc<Package>>> {
        let env = crate::env::global_env();

        if self.is_preinstalled(dep, &env)? {
            let version = dep
                .min_version
                .clone()
                .unwrap_or_else(|| Version::parse("0").unwrap());
            let pkg_env = Env::new(&dep.name);
            pkg_env.add_override("name", Value::scalar(dep.name.clone()));
            pkg_env.add_override("version", Value::scalar(version.to_string()));
            return Ok(Some(Package::new_native(
                pkg_env,
                dep.name.clone(),
                version,
                |_os| Ok(()),
                |_os| Ok(()),
            )));
        }

        let candidates: Vec<String> = if let Some(explicit) = self.resolve_native_name(dep, &env)? {
            vec![explicit]
        } else {
            self.adapter
                .name_patterns()
                .iter()
                .map(|pattern| pattern.replacen("%s", &dep.name, 1))
                .collect()
        };

        for native_name in candidates {
            let Some(available) = self.adapter.version_available(&native_name, os)? else {
                continue;
            };
            if !dep.is_satisfied_by(&available) {
                continue;
            }
            let installed = self.adapter.version_installed(&native_name, os)?;
            let needs_install = match &installed {
                Some(v) => v.try_cmp(&available).map(|o| o.is_lt()).unwrap_or(true),
                None => true,
            };

            let pkg_env = Env::new(&native_name);
            pkg_env.add_override("name", Value::scalar(native_name.clone()));
            pkg_env.add_override("version", Value::scalar(available.to_string()));

            let install_adapter = self.adapter.clone();
            let install_name = native_name.clone();
            let install_version = available.clone();
            let uninstall_adapter = self.adapter.clone();
            let uninstall_name = native_name.clone();

            return Ok(Some(Package::new_native(
                pkg_env,
                native_name,
                available,
                move |os| {
                    if needs_install {
                        install_adapter.do_install(&install_name, &install_version, os)
                    } else {
                        Ok(())
                    }
                },
                move |os| uninstall_adapter.do_uninstall(&uninstall_name, os),
            )));
        }
        Ok(None)
    }
}
