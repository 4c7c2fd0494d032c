//! Packaging strategies: turn a staged install tree into a native package
//! and (un)install it on the host.

mod common;
mod deb;
mod homebrew;
mod noop;
mod pacman;
mod rpm;

pub use deb::DebPackager;
pub use homebrew::HomebrewPackager;
pub use noop::NoopPackager;
pub use pacman::PacmanPackager;
pub use rpm::RpmPackager;

use std::fmt::Debug;

use crate::env::Env;
use crate::error::{BuzzyError, Result};
use crate::os::Os;

/// A packaging strategy, mirroring [`Builder`](crate::builder::Builder).
pub trait Packager: Debug {
    fn package_needed(&self, env: &Env, os: &dyn Os) -> Result<bool>;
    fn package(&self, env: &Env, os: &dyn Os) -> Result<()>;

    fn install_needed(&self, env: &Env, os: &dyn Os) -> Result<bool>;
    fn install(&self, env: &Env, os: &dyn Os) -> Result<()>;

    fn uninstall_needed(&self, env: &Env, os: &dyn Os) -> Result<bool>;
    fn uninstall(&self, env: &Env, os: &dyn Os) -> Result<()>;
}

/// Construct the concrete packager named by `env`'s `packager` variable.
pub fn from_env(env: &Env) -> Result<Box<dyn Packager>> {
    match env.get_string("packager", true)?.as_deref() {
        Some("pacman") => Ok(Box::new(PacmanPackager)),
        Some("deb") => Ok(Box::new(DebPackager)),
        Some("rpm") => Ok(Box::new(RpmPackager)),
        Some("homebrew") => Ok(Box::new(HomebrewPackager)),
        Some("noop") => Ok(Box::new(NoopPackager)),
        Some(other) => Err(BuzzyError::bad_config(format!("Unknown packager \"{other}\""))),
        None => Err(BuzzyError::bad_config("No packager configured")),
    }
}

/// Which distro (if any) claims this host, used by the packager
/// auto-detector. Returns `None` if no distro markers are found at all.
pub fn detect(os: &dyn Os) -> Option<&'static str> {
    if os.file_exists(std::path::Path::new("/etc/arch-release")) {
        Some("pacman")
    } else if os.file_exists(std::path::Path::new("/etc/debian_version")) {
        Some("deb")
    } else if os.file_exists(std::path::Path::new("/etc/redhat-release")) {
        Some("rpm")
    } else if os.file_exists(std::path::Path::new("/usr/local/bin/brew")) {
        Some("homebrew")
    } else {
        None
    }
}
