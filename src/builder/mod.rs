//! Build strategies: turn a source tree into a staged install tree.

mod autotools;
mod cmake;
mod noop;

pub use autotools::AutotoolsBuilder;
pub use cmake::CmakeBuilder;
pub use noop::NoopBuilder;

use std::fmt::Debug;

use crate::env::Env;
use crate::error::{BuzzyError, Result};
use crate::os::Os;

/// A build strategy. The orchestrator in `Package` chains `test ⇒ build` and
/// `stage ⇒ build`: `test`/`stage` build first if the corresponding
/// `*_needed` predicate says so.
pub trait Builder: Debug {
    fn build_needed(&self, env: &Env, os: &dyn Os) -> Result<bool>;
    fn build(&self, env: &Env, os: &dyn Os) -> Result<()>;

    fn test_needed(&self, env: &Env, os: &dyn Os) -> Result<bool>;
    fn test(&self, env: &Env, os: &dyn Os) -> Result<()>;

    fn stage_needed(&self, env: &Env, os: &dyn Os) -> Result<bool>;
    fn stage(&self, env: &Env, os: &dyn Os) -> Result<()>;
}

/// Detect which builder a source tree wants: `cmake` if `CMakeLists.txt`
/// exists under `source_dir`, else `autotools` if `configure.ac` exists,
/// else `BadConfig`.
pub fn detect(env: &Env, os: &dyn Os) -> Result<String> {
    let source_dir = env
        .get_path("source_dir", true)?
        .expect("required by get_path");
    if os.file_exists(&source_dir.join("CMakeLists.txt")) {
        Ok("cmake".to_string())
    } else if os.file_exists(&source_dir.join("configure.ac")) {
        Ok("autotools".to_string())
    } else {
        Err(BuzzyError::bad_config(
            "Could not detect a builder for this source tree",
        ))
    }
}

/// Construct the concrete builder named by `env`'s `builder` variable.
pub fn from_env(env: &Env) -> Result<Box<dyn Builder>> {
    match env.get_string("builder", true)?.as_deref() {
        Some("autotools") => Ok(Box::new(AutotoolsBuilder)),
        Some("cmake") => Ok(Box::new(CmakeBuilder)),
        Some("noop") => Ok(Box::new(NoopBuilder)),
        Some(other) => Err(BuzzyError::bad_config(format!("Unknown builder \"{other}\""))),
        None => Err(BuzzyError::bad_config("No builder configured")),
    }
}
