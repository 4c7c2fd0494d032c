use crate::env::Env;
use crate::error::Result;
use crate::os::Os;

use super::Packager;

/// No distro target configured; every step is a no-op.
#[derive(Debug, Clone, Copy)]
pub struct NoopPackager;

impl Packager for NoopPackager {
    fn package_needed(&self, _env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(false)
    }

    fn package(&self, _env: &Env, _os: &dyn Os) -> Result<()> {
        Ok(())
    }

    fn install_needed(&self, _env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(false)
    }

    fn install(&self, _env: &Env, _os: &dyn Os) -> Result<()> {
        Ok(())
    }

    fn uninstall_needed(&self, _env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(false)
    }

    fn uninstall(&self, _env: &Env, _os: &dyn Os) -> Result<()> {
        Ok(())
    }
}
