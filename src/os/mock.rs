//! A recording, table-driven [`Os`] for deterministic tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{BuzzyError, Result};
use crate::os::Os;

struct Expectation {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    exit_code: i32,
}

/// Routes commands by the space-joined argv string and answers from a fixed
/// table; records every command it's asked to run so tests can assert on
/// call order.
#[derive(Default)]
pub struct MockOs {
    expectations: RefCell<HashMap<String, Expectation>>,
    recorded: RefCell<Vec<String>>,
    files: RefCell<HashMap<PathBuf, Vec<u8>>>,
}

impl MockOs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the canned response for the command whose argv, joined by
    /// single spaces, equals `command`.
    pub fn expect(&self, command: &str, stdout: &str, stderr: &str, exit_code: i32) {
        self.expectations.borrow_mut().insert(
            command.to_string(),
            Expectation {
                stdout: stdout.as_bytes().to_vec(),
                stderr: stderr.as_bytes().to_vec(),
                exit_code,
            },
        );
    }

    /// Pre-populate a file as if it had been written by `create_file`.
    pub fn seed_file(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files.borrow_mut().insert(path.into(), contents.into());
    }

    pub fn commands_run(&self) -> Vec<String> {
        self.recorded.borrow().clone()
    }
}

impl Os for MockOs {
    fn exec(&self, argv: &[&str], out: &mut Vec<u8>, err: &mut Vec<u8>) -> Result<i32> {
        let command = argv.join(" ");
        self.recorded.borrow_mut().push(command.clone());
        match self.expectations.borrow().get(&command) {
            Some(expectation) => {
                out.extend_from_slice(&expectation.stdout);
                err.extend_from_slice(&expectation.stderr);
                Ok(expectation.exit_code)
            }
            None => Err(BuzzyError::subprocess(
                argv.first().copied().unwrap_or(""),
                format!("no mock expectation for \"{command}\""),
            )),
        }
    }

    fn create_dir(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn create_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        let contents = self
            .files
            .borrow()
            .get(from)
            .cloned()
            .ok_or_else(|| BuzzyError::file_not_found(from))?;
        self.files.borrow_mut().insert(to.to_path_buf(), contents);
        Ok(())
    }

    fn file_exists(&self, path: &Path) -> bool {
        if self.files.borrow().contains_key(path) {
            return true;
        }
        let command = format!("[ -f {} ]", path.display());
        self.recorded.borrow_mut().push(command.clone());
        self.expectations
            .borrow()
            .get(&command)
            .map(|e| e.exit_code == 0)
            .unwrap_or(false)
    }

    fn load_file(&self, path: &Path) -> Result<Vec<u8>> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| BuzzyError::file_not_found(path))
    }

    fn print_action(&self, _message: &str) {}

    fn walk_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
        Ok(self
            .files
            .borrow()
            .keys()
            .filter(|p| p.starts_with(path))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_by_joined_argv() {
        let os = MockOs::new();
        os.expect("uname -m", "x86_64\n", "", 0);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = os.exec(&["uname", "-m"], &mut out, &mut err).unwrap();
        assert_eq!(code, 0);
        assert_eq!(String::from_utf8(out).unwrap(), "x86_64\n");
    }

    #[test]
    fn unmatched_command_errors() {
        let os = MockOs::new();
        let mut out = Vec::new();
        let mut err = Vec::new();
        assert!(os.exec(&["nope"], &mut out, &mut err).is_err());
    }

    #[test]
    fn file_exists_uses_synthetic_command() {
        let os = MockOs::new();
        os.expect("[ -f /tmp/x ]", "", "", 0);
        assert!(os.file_exists(Path::new("/tmp/x")));
        os.expect("[ -f /tmp/y ]", "", "", 1);
        assert!(!os.file_exists(Path::new("/tmp/y")));
    }

    #[test]
    fn get_output_raises_subprocess_error_on_nonzero_exit() {
        let os = MockOs::new();
        os.expect("false", "", "boom", 1);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = os.get_output(&["false"], &mut out, &mut err, None);
        assert!(matches!(result, Err(BuzzyError::SubprocessError { .. })));
    }

    #[test]
    fn get_output_with_successful_out_never_errors() {
        let os = MockOs::new();
        os.expect("false", "", "boom", 1);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut success = true;
        os.get_output(&["false"], &mut out, &mut err, Some(&mut success))
            .unwrap();
        assert!(!success);
    }
}
