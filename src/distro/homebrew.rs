//! The Homebrew native adapter.

use crate::error::Result;
use crate::os::Os;
use crate::pdb::NativeAdapter as NativeAdapterTrait;
use crate::version::Version;

#[derive(Debug)]
pub struct BrewAdapter;

impl NativeAdapterTrait for BrewAdapter {
    fn short_distro_name(&self) -> &str {
        "Homebrew"
    }

    fn version_available(&self, native_name: &str, os: &dyn Os) -> Result<Option<Version>> {
        let mut out = Vec::new();
        let mut success = true;
        os.get_output(
            &["brew", "info", native_name],
            &mut out,
            &mut Vec::new(),
            Some(&mut success),
        )?;
        if !success {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&out);
        let prefix = format!("{native_name}: stable ");
        for line in text.lines() {
            if let Some(rest) = line.strip_prefix(&prefix) {
                let version = rest.split_whitespace().next().unwrap_or("").trim();
                if version.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(Version::parse(version)?));
            }
        }
        Ok(None)
    }

    fn version_installed(&self, native_name: &str, os: &dyn Os) -> Result<Option<Version>> {
        let mut out = Vec::new();
        let mut success = true;
        os.get_output(
            &["brew", "info", native_name],
            &mut out,
            &mut Vec::new(),
            Some(&mut success),
        )?;
        if !success {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&out);
        let prefix = format!("/usr/local/Cellar/{native_name}/");
        for line in text.lines() {
            if let Some(rest) = line.strip_prefix(&prefix) {
                let version = rest.split_whitespace().next().unwrap_or("").trim();
                if version.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(Version::parse(version)?));
            }
        }
        Ok(None)
    }

    fn do_install(&self, native_name: &str, _version: &Version, os: &dyn Os) -> Result<()> {
        os.run(&["brew", "install", native_name], None)
    }

    fn do_uninstall(&self, native_name: &str, os: &dyn Os) -> Result<()> {
        os.run(&["brew", "uninstall", native_name], None)
    }

    fn name_patterns(&self) -> &[&'static str] {
        &["%s"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::MockOs;

    #[test]
    fn parses_stable_version_line() {
        let os = MockOs::new();
        os.expect(
            "brew info jansson",
            "jansson: stable 2.5 (bottled)\n==> Dependencies\n",
            "",
            0,
        );
        let version = BrewAdapter
            .version_available("jansson", &os)
            .unwrap()
            .unwrap();
        assert_eq!(version.to_string(), "2.5");
    }

    #[test]
    fn reads_installed_version_from_cellar_path() {
        let os = MockOs::new();
        os.expect(
            "brew info jansson",
            "jansson: stable 2.5 (bottled)\n/usr/local/Cellar/jansson/2.5 (10 files)\n",
            "",
            0,
        );
        let version = BrewAdapter
            .version_installed("jansson", &os)
            .unwrap()
            .unwrap();
        assert_eq!(version.to_string(), "2.5");
    }

    #[test]
    fn not_installed_when_no_cellar_line() {
        let os = MockOs::new();
        os.expect("brew info jansson", "jansson: stable 2.5 (bottled)\n", "", 0);
        assert!(BrewAdapter
            .version_installed("jansson", &os)
            .unwrap()
            .is_none());
    }
}
