//! The pacman/AUR native adapter.

use crate::error::Result;
use crate::os::Os;
use crate::pdb::NativeAdapter as NativeAdapterTrait;
use crate::version::Version;

#[derive(Debug)]
pub struct PacmanAdapter;

impl NativeAdapterTrait for PacmanAdapter {
    fn short_distro_name(&self) -> &str {
        "Arch"
    }

    fn version_available(&self, native_name: &str, os: &dyn Os) -> Result<Option<Version>> {
        let mut out = Vec::new();
        let mut success = true;
        os.get_output(
            &[
                "pacman",
                "-Sdp",
                "--print-format",
                "%v",
                native_name,
            ],
            &mut out,
            &mut Vec::new(),
            Some(&mut success),
        )?;
        if !success {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&out);
        let line = line.lines().next().unwrap_or("").trim();
        if line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Version::from_pacman(line)?))
        }
    }

    fn version_installed(&self, native_name: &str, os: &dyn Os) -> Result<Option<Version>> {
        let mut out = Vec::new();
        let mut success = true;
        os.get_output(
            &["pacman", "-Q", native_name],
            &mut out,
            &mut Vec::new(),
            Some(&mut success),
        )?;
        if !success {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&out);
        let mut parts = line.split_whitespace();
        parts.next();
        match parts.next() {
            Some(v) => Ok(Some(Version::from_pacman(v)?)),
            None => Ok(None),
        }
    }

    fn do_install(&self, native_name: &str, _version: &Version, os: &dyn Os) -> Result<()> {
        os.run(
            &["sudo", "pacman", "-S", "--noconfirm", native_name],
            None,
        )
    }

    fn do_uninstall(&self, native_name: &str, os: &dyn Os) -> Result<()> {
        os.run(&["sudo", "pacman", "-R", "--noconfirm", native_name], None)
    }

    fn name_patterns(&self) -> &[&'static str] {
        &["%s", "lib%s", "%s-dev", "lib%s-dev"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::MockOs;

    #[test]
    fn parses_available_version() {
        let os = MockOs::new();
        os.expect(
            "pacman -Sdp --print-format %v jansson",
            "2.5-1\n",
            "",
            0,
        );
        let version = PacmanAdapter
            .version_available("jansson", &os)
            .unwrap()
            .unwrap();
        assert_eq!(version.to_string(), "2.5");
    }

    #[test]
    fn missing_package_is_none() {
        let os = MockOs::new();
        os.expect("pacman -Q missing", "", "error", 1);
        assert!(PacmanAdapter
            .version_installed("missing", &os)
            .unwrap()
            .is_none());
    }
}
