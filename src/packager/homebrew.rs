use crate::env::Env;
use crate::error::Result;
use crate::os::Os;

use super::Packager;

/// Homebrew has no distinct "package then install" step; `package` simply
/// copies the staging tree into the Cellar (`cp -R`).
#[derive(Debug, Clone, Copy)]
pub struct HomebrewPackager;

impl Packager for HomebrewPackager {
    fn package_needed(&self, env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(env.get_bool("force", false)?)
    }

    fn package(&self, env: &Env, os: &dyn Os) -> Result<()> {
        let staging_dir = env.require_path("staging_dir")?;
        let name = env.require_string("name")?;
        let version = env.require_version("version")?;
        let cellar = format!("/usr/local/Cellar/{name}/{version}");
        os.run(&["cp", "-R", &staging_dir.display().to_string(), &cellar], None)
    }

    fn install_needed(&self, env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(env.get_bool("force", false)?)
    }

    fn install(&self, env: &Env, os: &dyn Os) -> Result<()> {
        let name = env.require_string("name")?;
        os.run(&["brew", "link", &name], None)
    }

    fn uninstall_needed(&self, env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(env.get_bool("force", false)?)
    }

    fn uninstall(&self, env: &Env, os: &dyn Os) -> Result<()> {
        let name = env.require_string("name")?;
        os.run(&["brew", "unlink", &name], None)
    }
}
