use crate::env::Env;
use crate::error::Result;
use crate::os::Os;

use super::Builder;

/// Performs no build step at all; `stage` only ensures the staging
/// directory exists.
#[derive(Debug, Clone, Copy)]
pub struct NoopBuilder;

impl Builder for NoopBuilder {
    fn build_needed(&self, _env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(false)
    }

    fn build(&self, _env: &Env, _os: &dyn Os) -> Result<()> {
        Ok(())
    }

    fn test_needed(&self, _env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(false)
    }

    fn test(&self, _env: &Env, _os: &dyn Os) -> Result<()> {
        Ok(())
    }

    fn stage_needed(&self, env: &Env, os: &dyn Os) -> Result<bool> {
        let staging_dir = env.require_path("staging_dir")?;
        Ok(!os.file_exists(&staging_dir))
    }

    fn stage(&self, env: &Env, os: &dyn Os) -> Result<()> {
        let staging_dir = env.require_path("staging_dir")?;
        os.create_dir(&staging_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::MockOs;

    #[test]
    fn stage_creates_directory_if_missing() {
        let env = Env::new("pkg");
        env.add_override(
            "staging_dir",
            crate::value::Value::scalar("/tmp/stage"),
        );
        let os = MockOs::new();
        assert!(NoopBuilder.stage_needed(&env, &os).unwrap());
        NoopBuilder.stage(&env, &os).unwrap();
    }
}
