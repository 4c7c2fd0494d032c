//! Package databases: resolve a [`Dependency`] into a [`Package`].

mod native;

pub use native::NativePdb;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::rc::Rc;

use crate::dependency::Dependency;
use crate::error::{BuzzyError, Result};
use crate::os::Os;
use crate::package::Package;

/// A source of packages. `satisfy` returns `Ok(Some(package))` on a hit,
/// `Ok(None)` if this PDB simply doesn't have the dependency, and `Err` if
/// something went wrong while looking.
pub trait Pdb: Debug {
    fn satisfy(&self, dep: &Dependency, os: &dyn Os) -> Result<Option<Rc<Package>>>;
}

/// Holds exactly one package; matches a dependency by name and (if the dep
/// requires a minimum version) by version comparison.
#[derive(Debug)]
pub struct SinglePackagePdb {
    package: Rc<Package>,
}

impl SinglePackagePdb {
    pub fn new(package: Rc<Package>) -> Self {
        Self { package }
    }
}

impl Pdb for SinglePackagePdb {
    fn satisfy(&self, dep: &Dependency, _os: &dyn Os) -> Result<Option<Rc<Package>>> {
        if self.package.name() != dep.name {
            return Ok(None);
        }
        if dep.is_satisfied_by(self.package.version()) {
            Ok(Some(self.package.clone()))
        } else {
            Ok(None)
        }
    }
}

/// Wraps an inner PDB and memoises both hits and misses by `dep.to_string()`.
/// Two lookups for equal dependency strings return the identical `Package`
/// instance, not merely an equal one.
#[derive(Debug)]
pub struct CachedPdb<P: Pdb> {
    inner: P,
    cache: RefCell<HashMap<String, Option<Rc<Package>>>>,
}

impl<P: Pdb> CachedPdb<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
        }
    }
}

impl<P: Pdb> Pdb for CachedPdb<P> {
    fn satisfy(&self, dep: &Dependency, os: &dyn Os) -> Result<Option<Rc<Package>>> {
        let key = dep.to_string();
        if let Some(cached) = self.cache.borrow().get(&key) {
            return Ok(cached.clone());
        }
        let result = self.inner.satisfy(dep, os)?;
        self.cache.borrow_mut().insert(key, result.clone());
        Ok(result)
    }
}

thread_local! {
    static REGISTRY: RefCell<Vec<Rc<dyn Pdb>>> = RefCell::new(Vec::new());
}

/// Append a PDB to the global, ordered registry.
pub fn register(pdb: Rc<dyn Pdb>) {
    REGISTRY.with(|registry| registry.borrow_mut().push(pdb));
}

/// Used only by tests, to get a clean slate between cases.
pub fn reset_registry() {
    REGISTRY.with(|registry| registry.borrow_mut().clear());
}

/// Try every registered PDB in registration order; the first hit wins.
pub fn satisfy_dependency(dep: &Dependency, os: &dyn Os) -> Result<Rc<Package>> {
    REGISTRY.with(|registry| {
        for pdb in registry.borrow().iter() {
            if let Some(package) = pdb.satisfy(dep, os)? {
                return Ok(package);
            }
        }
        Err(BuzzyError::cannot_satisfy(dep.to_string()))
    })
}

/// `satisfy_dependency(dep).install()`.
pub fn install_dependency(dep: &Dependency, os: &dyn Os) -> Result<()> {
    satisfy_dependency(dep, os)?.install(os)
}

/// Parse `dep_str` first, then [`install_dependency`].
pub fn install_dependency_str(dep_str: &str, os: &dyn Os) -> Result<()> {
    install_dependency(&Dependency::parse(dep_str)?, os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Env;
    use crate::os::MockOs;
    use crate::version::Version;

    fn sample_package(name: &str, version: &str) -> Rc<Package> {
        Package::new_native(
            Env::new(name),
            name,
            Version::parse(version).unwrap(),
            |_os| Ok(()),
            |_os| Ok(()),
        )
    }

    #[test]
    fn single_package_pdb_matches_name_and_version() {
        let pkg = sample_package("jansson", "2.5");
        let pdb = SinglePackagePdb::new(pkg);
        let os = MockOs::new();
        assert!(pdb
            .satisfy(&Dependency::parse("jansson >= 2.0").unwrap(), &os)
            .unwrap()
            .is_some());
        assert!(pdb
            .satisfy(&Dependency::parse("jansson >= 3.0").unwrap(), &os)
            .unwrap()
            .is_none());
        assert!(pdb
            .satisfy(&Dependency::parse("other").unwrap(), &os)
            .unwrap()
            .is_none());
    }

    #[test]
    fn cached_pdb_returns_identical_instance() {
        let pkg = sample_package("jansson", "2.5");
        let cached = CachedPdb::new(SinglePackagePdb::new(pkg));
        let os = MockOs::new();
        let dep = Dependency::parse("jansson").unwrap();
        let a = cached.satisfy(&dep, &os).unwrap().unwrap();
        let b = cached.satisfy(&dep, &os).unwrap().unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn registry_checks_in_registration_order() {
        reset_registry();
        register(Rc::new(SinglePackagePdb::new(sample_package("a", "1.0"))));
        register(Rc::new(SinglePackagePdb::new(sample_package("b", "1.0"))));
        let os = MockOs::new();
        let found = satisfy_dependency(&Dependency::parse("b").unwrap(), &os).unwrap();
        assert_eq!(found.name(), "b");
        assert!(satisfy_dependency(&Dependency::parse("c").unwrap(), &os).is_err());
        reset_registry();
    }
}
