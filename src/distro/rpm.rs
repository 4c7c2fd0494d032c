//! The yum+rpm native adapter.

use crate::error::Result;
use crate::os::Os;
use crate::pdb::NativeAdapter as NativeAdapterTrait;
use crate::version::Version;

#[derive(Debug)]
pub struct YumAdapter;

impl NativeAdapterTrait for YumAdapter {
    fn short_distro_name(&self) -> &str {
        "RPM"
    }

    fn version_available(&self, native_name: &str, os: &dyn Os) -> Result<Option<Version>> {
        let mut out = Vec::new();
        let mut success = true;
        os.get_output(
            &["yum", "info", native_name],
            &mut out,
            &mut Vec::new(),
            Some(&mut success),
        )?;
        if !success {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&out);
        let mut version = None;
        let mut release = None;
        for line in text.lines() {
            if let Some(rest) = line.strip_prefix("Version") {
                if let Some(v) = rest.trim_start().strip_prefix(':') {
                    version = Some(v.trim().to_string());
                }
            } else if let Some(rest) = line.strip_prefix("Release") {
                if let Some(v) = rest.trim_start().strip_prefix(':') {
                    release = Some(v.trim().to_string());
                }
            }
        }
        match (version, release) {
            (Some(v), Some(r)) => Ok(Some(Version::from_rpm(&v, &r)?)),
            _ => Ok(None),
        }
    }

    fn version_installed(&self, native_name: &str, os: &dyn Os) -> Result<Option<Version>> {
        let mut out = Vec::new();
        let mut success = true;
        os.get_output(
            &["rpm", "--qf", "%{V}-%{R}", "-q", native_name],
            &mut out,
            &mut Vec::new(),
            Some(&mut success),
        )?;
        if !success {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&out);
        let line = line.trim();
        match line.split_once('-') {
            Some((v, r)) => Ok(Some(Version::from_rpm(v, r)?)),
            None => Ok(None),
        }
    }

    fn do_install(&self, native_name: &str, _version: &Version, os: &dyn Os) -> Result<()> {
        os.run(&["sudo", "yum", "install", "-y", native_name], None)
    }

    fn do_uninstall(&self, native_name: &str, os: &dyn Os) -> Result<()> {
        os.run(&["sudo", "yum", "remove", "-y", native_name], None)
    }

    fn name_patterns(&self) -> &[&'static str] {
        &["%s-devel", "lib%s-devel", "%s", "lib%s"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::MockOs;

    #[test]
    fn parses_version_and_release_fields() {
        let os = MockOs::new();
        os.expect(
            "yum info jansson",
            "Name        : jansson\nVersion     : 2.5\nRelease     : 1\n",
            "",
            0,
        );
        let version = YumAdapter
            .version_available("jansson", &os)
            .unwrap()
            .unwrap();
        assert_eq!(version.to_string(), "2.5");
    }

    #[test]
    fn installed_version_splits_on_dash() {
        let os = MockOs::new();
        os.expect("rpm --qf %{V}-%{R} -q jansson", "2.5-1", "", 0);
        let version = YumAdapter
            .version_installed("jansson", &os)
            .unwrap()
            .unwrap();
        assert_eq!(version.to_string(), "2.5");
    }

    #[test]
    fn missing_package_is_none() {
        let os = MockOs::new();
        os.expect("rpm --qf %{V}-%{R} -q missing", "", "error", 1);
        assert!(YumAdapter
            .version_installed("missing", &os)
            .unwrap()
            .is_none());
    }
}
