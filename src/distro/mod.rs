//! Platform detection and the native PDB adapters for each supported distro.

pub mod arch;
pub mod debian;
pub mod homebrew;
pub mod rpm;

use crate::env::Env;
use crate::os::Os;
use crate::value::Value;

/// Probe the host's distro markers and apply the env overrides/backups each
/// one implies (§4.3 "Platform-specific overrides", §6 "Platform
/// detection"). Runs once at startup against the global env.
pub fn apply_overrides(env: &Env, os: &dyn Os) {
    if os.file_exists(std::path::Path::new("/usr/local/bin/brew")) {
        env.add_override("prefix", Value::scalar("/usr/local"));
    }
    if is_redhat(os) {
        if let Ok(arch) = env.architecture(os) {
            if arch == "x86_64" {
                env.add_backup("lib_dir_name", Value::scalar("lib64"));
            }
        }
    }
    // Arch Linux's own prefix/lib conventions already match the defaults;
    // no overrides needed.
}

pub fn is_arch(os: &dyn Os) -> bool {
    os.file_exists(std::path::Path::new("/etc/arch-release"))
}

pub fn is_debian(os: &dyn Os) -> bool {
    os.file_exists(std::path::Path::new("/etc/debian_version"))
}

pub fn is_redhat(os: &dyn Os) -> bool {
    os.file_exists(std::path::Path::new("/etc/redhat-release"))
}

pub fn is_homebrew(os: &dyn Os) -> bool {
    os.file_exists(std::path::Path::new("/usr/local/bin/brew"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::MockOs;

    #[test]
    fn redhat_x86_64_backs_up_lib_dir_name() {
        let os = MockOs::new();
        os.expect("[ -f /usr/local/bin/brew ]", "", "", 1);
        os.expect("[ -f /etc/redhat-release ]", "", "", 0);
        os.expect("uname -m", "x86_64\n", "", 0);
        let env = Env::new_root();
        apply_overrides(&env, &os);
        assert_eq!(env.get("lib_dir_name").unwrap(), Some("lib64".to_string()));
    }

    #[test]
    fn homebrew_overrides_prefix() {
        let os = MockOs::new();
        os.expect("[ -f /usr/local/bin/brew ]", "", "", 0);
        let env = Env::new_root();
        apply_overrides(&env, &os);
        assert_eq!(env.get("prefix").unwrap(), Some("/usr/local".to_string()));
    }
}
