use crate::env::Env;
use crate::error::Result;
use crate::os::Os;

use super::Builder;

/// Builds a CMake source tree out-of-tree into `build_dir`.
#[derive(Debug, Clone, Copy)]
pub struct CmakeBuilder;

impl Builder for CmakeBuilder {
    fn build_needed(&self, _env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(true)
    }

    fn build(&self, env: &Env, os: &dyn Os) -> Result<()> {
        let source_dir = env.require_path("source_dir")?;
        let build_dir = env.require_path("build_dir")?;
        os.create_dir(&build_dir)?;
        let prefix = env
            .get_string("install_prefix", false)?
            .unwrap_or_else(|| "/usr".to_string());
        let mut args = vec![
            source_dir.display().to_string(),
            format!("-DCMAKE_INSTALL_PREFIX={prefix}"),
        ];
        if let Some(lib_dir) = env.get_string("lib_dir_name", false)? {
            args.push(format!("-DCMAKE_INSTALL_LIBDIR={lib_dir}"));
        }
        args.push("-DCMAKE_BUILD_TYPE=Release".to_string());
        let mut argv = vec!["cmake"];
        argv.extend(args.iter().map(String::as_str));
        os.run(&argv, None)?;
        os.run(
            &["cmake", "--build", &build_dir.display().to_string()],
            None,
        )
    }

    fn test_needed(&self, _env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(true)
    }

    fn test(&self, env: &Env, os: &dyn Os) -> Result<()> {
        let build_dir = env.require_path("build_dir")?;
        os.run(
            &[
                "cmake",
                "--build",
                &build_dir.display().to_string(),
                "--target",
                "test",
            ],
            None,
        )
    }

    fn stage_needed(&self, _env: &Env, _os: &dyn Os) -> Result<bool> {
        Ok(true)
    }

    fn stage(&self, env: &Env, os: &dyn Os) -> Result<()> {
        let build_dir = env.require_path("build_dir")?;
        let staging_dir = env.require_path("staging_dir")?;
        let destdir = format!("DESTDIR={}", staging_dir.display());
        os.run(
            &[
                "cmake",
                "--build",
                &build_dir.display().to_string(),
                "--target",
                "install",
                &destdir,
            ],
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::MockOs;
    use crate::value::Value;

    #[test]
    fn build_configures_and_builds() {
        let env = Env::new("pkg");
        env.add_override("source_dir", Value::scalar("/src"));
        env.add_override("build_dir", Value::scalar("/build"));
        env.add_override("install_prefix", Value::scalar("/usr"));
        let os = MockOs::new();
        os.expect("cmake /src -DCMAKE_INSTALL_PREFIX=/usr -DCMAKE_BUILD_TYPE=Release", "", "", 0);
        os.expect("cmake --build /build", "", "", 0);
        CmakeBuilder.build(&env, &os).unwrap();
    }
}
