//! The OS façade: every side-effecting operation the core performs goes
//! through this trait, so it can be swapped for a [`MockOs`] in tests.

mod mock;

pub use mock::MockOs;

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{BuzzyError, Result};

/// A single command invocation and its outcome, as seen by the façade.
pub struct Invocation<'a> {
    pub argv: &'a [&'a str],
}

impl<'a> Invocation<'a> {
    fn joined(&self) -> String {
        self.argv.join(" ")
    }
}

/// Pluggable access to the outside world. A real implementation shells out
/// and touches the filesystem; [`MockOs`] records calls and answers from a
/// fixed table, for deterministic tests.
pub trait Os {
    /// Run `argv`, streaming stdout/stderr to the given sinks, and return
    /// the exit code.
    fn exec(&self, argv: &[&str], out: &mut Vec<u8>, err: &mut Vec<u8>) -> Result<i32>;

    /// Run `argv` and capture its output. `successful_out`, if given, is set
    /// to whether the process exited 0 and no error is raised regardless of
    /// the exit code; otherwise a non-zero exit surfaces as
    /// `SubprocessError`.
    fn get_output(
        &self,
        argv: &[&str],
        out: &mut Vec<u8>,
        err: &mut Vec<u8>,
        mut successful_out: Option<&mut bool>,
    ) -> Result<()> {
        let invocation = Invocation { argv };
        debug!(command = %invocation.joined(), "exec");
        let code = self.exec(argv, out, err)?;
        trace!(command = %invocation.joined(), exit_code = code, "exec finished");
        match successful_out.as_deref_mut() {
            Some(flag) => {
                *flag = code == 0;
                Ok(())
            }
            None if code == 0 => Ok(()),
            None => Err(BuzzyError::subprocess(
                argv.first().copied().unwrap_or(""),
                format!("exited with status {code}"),
            )),
        }
    }

    /// Run `argv` for effect only, discarding captured output.
    fn run(&self, argv: &[&str], successful_out: Option<&mut bool>) -> Result<()> {
        let mut out = Vec::new();
        let mut err = Vec::new();
        self.get_output(argv, &mut out, &mut err, successful_out)
    }

    fn create_dir(&self, path: &Path) -> Result<()>;
    fn create_file(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;
    fn file_exists(&self, path: &Path) -> bool;
    fn load_file(&self, path: &Path) -> Result<Vec<u8>>;
    fn print_action(&self, message: &str);
    fn walk_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// The real façade: shells out and touches the filesystem for real.
#[derive(Debug, Default)]
pub struct RealOs;

impl RealOs {
    pub fn new() -> Self {
        Self
    }
}

impl Os for RealOs {
    fn exec(&self, argv: &[&str], out: &mut Vec<u8>, err: &mut Vec<u8>) -> Result<i32> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| BuzzyError::SystemError("Empty command".to_string()))?;
        let output = std::process::Command::new(program)
            .args(args)
            .output()
            .map_err(|e| BuzzyError::subprocess(*program, e.to_string()))?;
        out.extend_from_slice(&output.stdout);
        err.extend_from_slice(&output.stderr);
        Ok(output.status.code().unwrap_or(-1))
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)?;
        Ok(())
    }

    fn create_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(from, to)?;
        Ok(())
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn load_file(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }

    fn print_action(&self, message: &str) {
        println!("{message}");
    }

    fn walk_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in walkdir::WalkDir::new(path) {
            paths.push(entry?.path().to_path_buf());
        }
        Ok(paths)
    }
}
