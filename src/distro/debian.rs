//! The apt+dpkg native adapter.

use crate::error::Result;
use crate::os::Os;
use crate::pdb::NativeAdapter as NativeAdapterTrait;
use crate::version::Version;

#[derive(Debug)]
pub struct AptAdapter;

impl NativeAdapterTrait for AptAdapter {
    fn short_distro_name(&self) -> &str {
        "Debian"
    }

    fn version_available(&self, native_name: &str, os: &dyn Os) -> Result<Option<Version>> {
        let mut out = Vec::new();
        let mut success = true;
        os.get_output(
            &["apt-cache", "show", "--no-all-versions", native_name],
            &mut out,
            &mut Vec::new(),
            Some(&mut success),
        )?;
        if !success {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&out);
        for line in text.lines() {
            if let Some(rest) = line.strip_prefix("Version:") {
                let (version, _epoch) = Version::from_debian(rest.trim())?;
                return Ok(Some(version));
            }
        }
        Ok(None)
    }

    fn version_installed(&self, native_name: &str, os: &dyn Os) -> Result<Option<Version>> {
        let mut out = Vec::new();
        let mut success = true;
        os.get_output(
            &[
                "dpkg-query",
                "-W",
                "-f",
                "${Status}\n${Version}",
                native_name,
            ],
            &mut out,
            &mut Vec::new(),
            Some(&mut success),
        )?;
        if !success {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&out);
        let mut lines = text.lines();
        let status = lines.next().unwrap_or("");
        let version_line = lines.next().unwrap_or("");
        if status.trim() != "install ok installed" || version_line.trim().is_empty() {
            return Ok(None);
        }
        let (version, _epoch) = Version::from_debian(version_line.trim())?;
        Ok(Some(version))
    }

    fn do_install(&self, native_name: &str, _version: &Version, os: &dyn Os) -> Result<()> {
        os.run(&["sudo", "apt-get", "install", "-y", native_name], None)
    }

    fn do_uninstall(&self, native_name: &str, os: &dyn Os) -> Result<()> {
        os.run(&["sudo", "apt-get", "remove", "-y", native_name], None)
    }

    fn name_patterns(&self) -> &[&'static str] {
        &["%s-dev", "lib%s-dev", "%s", "lib%s"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::MockOs;

    #[test]
    fn parses_version_field() {
        let os = MockOs::new();
        os.expect(
            "apt-cache show --no-all-versions jansson",
            "Package: jansson\nVersion: 2.5-1\n",
            "",
            0,
        );
        let version = AptAdapter
            .version_available("jansson", &os)
            .unwrap()
            .unwrap();
        assert_eq!(version.to_string(), "2.5+rev1");
    }

    #[test]
    fn installed_status_must_be_install_ok_installed() {
        let os = MockOs::new();
        os.expect(
            "dpkg-query -W -f ${Status}\n${Version} jansson",
            "deinstall ok config-files\n2.5-1",
            "",
            0,
        );
        assert!(AptAdapter
            .version_installed("jansson", &os)
            .unwrap()
            .is_none());
    }
}
