//! A buildable, installable unit: either a *built* package (Builder +
//! Packager over local source) or a *native* package (a thin wrapper around
//! a distro's own package manager).

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::builder::Builder;
use crate::env::Env;
use crate::error::Result;
use crate::os::Os;
use crate::packager::Packager;
use crate::version::Version;

enum Kind {
    Built {
        builder: Box<dyn Builder>,
        packager: Box<dyn Packager>,
    },
    Native {
        install: Box<dyn Fn(&dyn Os) -> Result<()>>,
        uninstall: Box<dyn Fn(&dyn Os) -> Result<()>>,
    },
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Built { .. } => write!(f, "Kind::Built"),
            Kind::Native { .. } => write!(f, "Kind::Native"),
        }
    }
}

/// A package: its env, identity, and the means to build/test/install/
/// uninstall it. Each of those four steps is an idempotent latch for the
/// lifetime of the `Package`.
#[derive(Debug)]
pub struct Package {
    env: Env,
    name: String,
    version: Version,
    kind: Kind,
    built: Cell<bool>,
    tested: Cell<bool>,
    installed: Cell<bool>,
    uninstalled: Cell<bool>,
}

impl Package {
    pub fn new_built(
        env: Env,
        name: impl Into<String>,
        version: Version,
        builder: Box<dyn Builder>,
        packager: Box<dyn Packager>,
    ) -> Rc<Self> {
        Rc::new(Self {
            env,
            name: name.into(),
            version,
            kind: Kind::Built { builder, packager },
            built: Cell::new(false),
            tested: Cell::new(false),
            installed: Cell::new(false),
            uninstalled: Cell::new(false),
        })
    }

    pub fn new_native(
        env: Env,
        name: impl Into<String>,
        version: Version,
        install: impl Fn(&dyn Os) -> Result<()> + 'static,
        uninstall: impl Fn(&dyn Os) -> Result<()> + 'static,
    ) -> Rc<Self> {
        Rc::new(Self {
            env,
            name: name.into(),
            version,
            kind: Kind::Native {
                install: Box::new(install),
                uninstall: Box::new(uninstall),
            },
            built: Cell::new(false),
            tested: Cell::new(false),
            installed: Cell::new(false),
            uninstalled: Cell::new(false),
        })
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn is_native(&self) -> bool {
        matches!(self.kind, Kind::Native { .. })
    }

    /// Build the package, once. A native package's build is a no-op.
    pub fn build(&self, os: &dyn Os) -> Result<()> {
        if self.built.get() {
            return Ok(());
        }
        self.built.set(true);
        if let Kind::Built { builder, .. } = &self.kind {
            if builder.build_needed(&self.env, os)? {
                builder.build(&self.env, os)?;
            }
        }
        Ok(())
    }

    /// Test the package, once, building first if needed.
    pub fn test(&self, os: &dyn Os) -> Result<()> {
        if self.tested.get() {
            return Ok(());
        }
        self.tested.set(true);
        self.build(os)?;
        if let Kind::Built { builder, .. } = &self.kind {
            if builder.test_needed(&self.env, os)? {
                builder.test(&self.env, os)?;
            }
        }
        Ok(())
    }

    /// Install the package, once.
    ///
    /// For a built package this stages, then packages, then installs. For a
    /// native package it delegates straight to the native adapter.
    pub fn install(&self, os: &dyn Os) -> Result<()> {
        if self.installed.get() {
            return Ok(());
        }
        self.installed.set(true);
        match &self.kind {
            Kind::Built { builder, packager } => {
                if builder.stage_needed(&self.env, os)? {
                    builder.stage(&self.env, os)?;
                }
                if packager.package_needed(&self.env, os)? {
                    packager.package(&self.env, os)?;
                }
                if packager.install_needed(&self.env, os)? {
                    packager.install(&self.env, os)?;
                }
                Ok(())
            }
            Kind::Native { install, .. } => install(os),
        }
    }

    /// Uninstall the package, once.
    pub fn uninstall(&self, os: &dyn Os) -> Result<()> {
        if self.uninstalled.get() {
            return Ok(());
        }
        self.uninstalled.set(true);
        match &self.kind {
            Kind::Built { packager, .. } => {
                if packager.uninstall_needed(&self.env, os)? {
                    packager.uninstall(&self.env, os)?;
                }
                Ok(())
            }
            Kind::Native { uninstall, .. } => uninstall(os),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::NoopBuilder;
    use crate::os::MockOs;
    use crate::packager::NoopPackager;

    #[test]
    fn build_latch_runs_once() {
        let env = Env::new("pkg");
        let pkg = Package::new_built(
            env,
            "pkg",
            Version::parse("1.0").unwrap(),
            Box::new(NoopBuilder),
            Box::new(NoopPackager),
        );
        let os = MockOs::new();
        pkg.build(&os).unwrap();
        pkg.build(&os).unwrap();
        assert!(pkg.built.get());
    }

    #[test]
    fn native_build_and_test_are_noops() {
        let env = Env::new("pkg");
        let pkg = Package::new_native(
            env,
            "pkg",
            Version::parse("1.0").unwrap(),
            |_os| Ok(()),
            |_os| Ok(()),
        );
        let os = MockOs::new();
        pkg.build(&os).unwrap();
        pkg.test(&os).unwrap();
        assert!(pkg.is_native());
    }

    #[test]
    fn install_latch_runs_once() {
        let env = Env::new("pkg");
        let calls = Rc::new(Cell::new(0));
        let calls_clone = calls.clone();
        let pkg = Package::new_native(
            env,
            "pkg",
            Version::parse("1.0").unwrap(),
            move |_os| {
                calls_clone.set(calls_clone.get() + 1);
                Ok(())
            },
            |_os| Ok(()),
        );
        let os = MockOs::new();
        pkg.install(&os).unwrap();
        pkg.install(&os).unwrap();
        assert_eq!(calls.get(), 1);
    }
}
