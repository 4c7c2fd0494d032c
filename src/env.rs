//! Layered, interpolating variable environments.
//!
//! An [`Env`] resolves a dotted key through five tiers, outermost-first:
//! override table, explicit primary sets (add order), explicit backup sets
//! (add order), per-env backup table, global-defaults table. See
//! `SPEC_FULL.md` §4.3 for the full precedence writeup.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{BuzzyError, Result};
use crate::os::Os;
use crate::value::{MapNode, MapValue, Value};
use crate::version::Version;

/// A documented global default: a value plus its short/long description.
pub struct GlobalDefault {
    pub value: Value,
    pub short_desc: String,
    pub long_desc: String,
}

thread_local! {
    static GLOBAL_DEFAULTS: RefCell<BTreeMap<String, GlobalDefault>> =
        RefCell::new(BTreeMap::new());
}

/// Register (or overwrite) a process-wide default for `name`.
pub fn set_global_default(
    name: impl Into<String>,
    value: Value,
    short_desc: impl Into<String>,
    long_desc: impl Into<String>,
) {
    GLOBAL_DEFAULTS.with(|defaults| {
        defaults.borrow_mut().insert(
            name.into(),
            GlobalDefault {
                value,
                short_desc: short_desc.into(),
                long_desc: long_desc.into(),
            },
        );
    });
}

/// Used only by tests, to get a clean slate between cases.
pub fn reset_global_defaults() {
    GLOBAL_DEFAULTS.with(|defaults| defaults.borrow_mut().clear());
}

/// Look up a registered global default's documentation (short, long), for
/// `buzzy doc`.
pub fn global_default_doc(name: &str) -> Option<(String, String)> {
    GLOBAL_DEFAULTS.with(|defaults| {
        defaults
            .borrow()
            .get(name)
            .map(|d| (d.short_desc.clone(), d.long_desc.clone()))
    })
}

/// The map-kind value backing the global-defaults backup tier.
#[derive(Debug)]
struct GlobalDefaultsMap;

impl MapValue for GlobalDefaultsMap {
    fn get(&self, key: &str) -> Option<Value> {
        GLOBAL_DEFAULTS.with(|defaults| defaults.borrow().get(key).map(|d| d.value.clone()))
    }

    fn add(&self, key: &str, _value: Value, _overwrite: bool) -> Result<()> {
        Err(BuzzyError::bad_config(format!(
            "Cannot add \"{key}\" to the global defaults map directly"
        )))
    }
}

/// A layered environment. Cheaply cloneable; clones share the same
/// underlying sets (an `Env` is conceptually a handle, like `Rc<RefCell<_>>`
/// wraps each of its tables).
#[derive(Clone)]
pub struct Env {
    inner: Rc<EnvInner>,
}

struct EnvInner {
    name: String,
    base_path: RefCell<PathBuf>,
    overrides: Rc<MapNode>,
    backups: Rc<MapNode>,
    primary_sets: RefCell<Vec<Rc<dyn MapValue>>>,
    backup_sets: RefCell<Vec<Rc<dyn MapValue>>>,
    architecture_cache: RefCell<Option<String>>,
}

impl Env {
    /// A brand-new env with no sets beyond the override/backup tables and
    /// the global-defaults backup.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(EnvInner {
                name: name.into(),
                base_path: RefCell::new(PathBuf::new()),
                overrides: Rc::new(MapNode::new()),
                backups: Rc::new(MapNode::new()),
                primary_sets: RefCell::new(Vec::new()),
                backup_sets: RefCell::new(Vec::new()),
                architecture_cache: RefCell::new(None),
            }),
        }
    }

    /// Convenience alias for a fresh top-level env (global env, or a
    /// from-scratch test env).
    pub fn new_root() -> Self {
        Self::new("root")
    }

    /// A fresh env that falls back to `parent` (as a backup set, checked
    /// after this env's own primary/backup sets) for anything it doesn't
    /// define itself. Used to nest repo envs under the global env, and
    /// package envs under their repo env, so platform overrides like
    /// Red Hat's `lib_dir_name` backup reach every descendant.
    pub fn new_child(name: impl Into<String>, parent: &Env) -> Self {
        let env = Self::new(name);
        env.add_backup_set(parent.as_value().as_map().expect("env-as-value is a map").clone());
        env
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn base_path(&self) -> PathBuf {
        self.inner.base_path.borrow().clone()
    }

    pub fn set_base_path(&self, base_path: impl Into<PathBuf>) {
        *self.inner.base_path.borrow_mut() = base_path.into();
    }

    /// Add a value set checked after the override table but before any
    /// backup set.
    pub fn add_set(&self, set: Rc<dyn MapValue>) {
        self.inner.primary_sets.borrow_mut().push(set);
    }

    /// Add a value set checked after every primary set but before the
    /// per-env backup table.
    pub fn add_backup_set(&self, set: Rc<dyn MapValue>) {
        self.inner.backup_sets.borrow_mut().push(set);
    }

    /// Override `key` so every other set is shadowed for it.
    pub fn add_override(&self, key: &str, value: Value) {
        let _ = self.inner.overrides.add(key, value, true);
    }

    /// Give `key` a fallback value consulted after all primary/backup sets
    /// but before the global-defaults table.
    pub fn add_backup(&self, key: &str, value: Value) {
        let _ = self.inner.backups.add(key, value, true);
    }

    /// Look up `key` across all five tiers, outermost-first.
    pub fn get_value(&self, key: &str) -> Result<Option<Value>> {
        if let Some(v) = Value::Map(self.inner.overrides.clone()).get_nested(key)? {
            return Ok(Some(v));
        }
        for set in self.inner.primary_sets.borrow().iter() {
            if let Some(v) = Value::Map(set.clone()).get_nested(key)? {
                return Ok(Some(v));
            }
        }
        for set in self.inner.backup_sets.borrow().iter() {
            if let Some(v) = Value::Map(set.clone()).get_nested(key)? {
                return Ok(Some(v));
            }
        }
        if let Some(v) = Value::Map(self.inner.backups.clone()).get_nested(key)? {
            return Ok(Some(v));
        }
        // The global-defaults table is the outermost backup of all: checked
        // strictly after every explicit backup set and the per-env backup
        // table, never mixed into `backup_sets` itself (an env-as-value
        // `new_child` parent added there must still be shadowed by this
        // env's own per-env backups before falling all the way out here).
        Value::Map(Rc::new(GlobalDefaultsMap)).get_nested(key)
    }

    /// Like [`get_value`](Self::get_value), but renders a scalar immediately.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        match self.get_value(key)? {
            Some(v) => Ok(Some(v.as_scalar(self)?)),
            None => Ok(None),
        }
    }

    fn require(&self, key: &str, required: bool) -> Result<Option<String>> {
        match self.get(key)? {
            Some(v) => Ok(Some(v)),
            None if required => Err(BuzzyError::bad_config(format!("No value for {key}"))),
            None => Ok(None),
        }
    }

    pub fn get_bool(&self, key: &str, required: bool) -> Result<bool> {
        match self.require(key, required)? {
            None => Ok(false),
            Some(content) => match content.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Ok(true),
                "0" | "false" | "no" => Ok(false),
                _ => Err(BuzzyError::bad_config(format!(
                    "Invalid boolean \"{content}\" for {key}"
                ))),
            },
        }
    }

    pub fn get_long(&self, key: &str, required: bool) -> Result<i64> {
        match self.require(key, required)? {
            None => Ok(0),
            Some(content) => content.trim().parse::<i64>().map_err(|_| {
                BuzzyError::bad_config(format!("Invalid integer \"{content}\" for {key}"))
            }),
        }
    }

    pub fn get_string(&self, key: &str, required: bool) -> Result<Option<String>> {
        self.require(key, required)
    }

    pub fn get_path(&self, key: &str, required: bool) -> Result<Option<PathBuf>> {
        match self.require(key, required)? {
            None => Ok(None),
            Some(content) => {
                let p = Path::new(&content);
                if p.is_absolute() {
                    Ok(Some(p.to_path_buf()))
                } else {
                    Ok(Some(self.base_path().join(p)))
                }
            }
        }
    }

    pub fn get_version(&self, key: &str, required: bool) -> Result<Option<Version>> {
        match self.require(key, required)? {
            None => Ok(None),
            Some(content) => Ok(Some(Version::parse(&content)?)),
        }
    }

    /// Like `get_string(key, true)`, but returns the value directly instead
    /// of an `Option` callers would otherwise have to `.unwrap()`.
    pub fn require_string(&self, key: &str) -> Result<String> {
        self.require(key, true)?
            .ok_or_else(|| BuzzyError::bad_config(format!("No value for {key}")))
    }

    /// Like `get_path(key, true)`, but returns the value directly instead of
    /// an `Option` callers would otherwise have to `.unwrap()`.
    pub fn require_path(&self, key: &str) -> Result<PathBuf> {
        self.get_path(key, true)?
            .ok_or_else(|| BuzzyError::bad_config(format!("No value for {key}")))
    }

    /// Like `get_version(key, true)`, but returns the value directly instead
    /// of an `Option` callers would otherwise have to `.unwrap()`.
    pub fn require_version(&self, key: &str) -> Result<Version> {
        self.get_version(key, true)?
            .ok_or_else(|| BuzzyError::bad_config(format!("No value for {key}")))
    }

    /// Expose this env as a read-only, map-kind `Value` so it can be nested
    /// inside another env's evaluation context. Non-owning: the wrapper is
    /// only valid as long as `self` is.
    pub fn as_value(&self) -> Value {
        Value::Map(Rc::new(EnvAsValue(self.clone())))
    }

    /// `uname -m`, cached after the first read.
    pub fn architecture(&self, os: &dyn Os) -> Result<String> {
        if let Some(cached) = self.inner.architecture_cache.borrow().clone() {
            return Ok(cached);
        }
        let mut out = Vec::new();
        os.get_output(&["uname", "-m"], &mut out, &mut Vec::new(), None)?;
        let arch = String::from_utf8_lossy(&out).trim().to_string();
        *self.inner.architecture_cache.borrow_mut() = Some(arch.clone());
        Ok(arch)
    }
}

#[derive(Debug)]
struct EnvAsValue(Env);

impl MapValue for EnvAsValue {
    fn get(&self, key: &str) -> Option<Value> {
        self.0.get_value(key).ok().flatten()
    }

    fn add(&self, key: &str, _value: Value, _overwrite: bool) -> Result<()> {
        Err(BuzzyError::bad_config(format!(
            "Cannot add \"{key}\" to an env-as-value wrapper"
        )))
    }
}

thread_local! {
    static GLOBAL_ENV: RefCell<Option<Env>> = RefCell::new(None);
}

/// The process-wide global env, created on first access and seeded with the
/// process-global defaults (`cache_path`, `work_path`, `package_path`).
pub fn global_env() -> Env {
    GLOBAL_ENV.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_none() {
            *slot = Some(build_global_env());
        }
        slot.as_ref().unwrap().clone()
    })
}

fn interpolated(template: &str) -> Value {
    Value::Scalar(Rc::new(crate::value::InterpolatedScalar::parse(template).unwrap()))
}

fn build_global_env() -> Env {
    let env = Env::new("global");
    let cache_path = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
    env.add_backup("cache_path", Value::scalar(cache_path.display().to_string()));
    env.add_backup("work_path", interpolated("${cache_path}/buzzy"));
    env.add_backup("package_path", interpolated("${work_path}/packages"));
    register_package_defaults();
    env
}

/// Package-scoped defaults (SPEC_FULL.md §4.3): registered process-wide, the
/// same as the three cache-path defaults above, but only ever resolve
/// successfully against an env that also defines `name`/`version` (i.e. a
/// package env) — anything else fails at lookup time with a "no value for
/// name" error, which is never surfaced because nothing asks a non-package
/// env for these keys.
///
/// `builder`/`packager`/`architecture` are deliberately absent here: their
/// auto-detection needs the OS façade, which a `Scalar::get(&self, ctx: &Env)`
/// has no way to reach. Those three are resolved where an `Os` handle is
/// already in scope — package construction for `builder`/`packager`,
/// `Env::architecture` for the host architecture.
fn register_package_defaults() {
    set_global_default(
        "package_work_dir",
        interpolated("${work_path}/build/${name}/${version}"),
        "Scratch directory for one package's build/stage/package steps",
        "",
    );
    set_global_default("license", Value::scalar("unknown"), "Package license", "");
    set_global_default("force", Value::scalar("false"), "Ignore idempotence checks", "");
    set_global_default("verbose", Value::scalar("false"), "Verbose subprocess logging", "");
    set_global_default(
        "install_prefix",
        Value::scalar("/usr"),
        "Default installation prefix",
        "",
    );
    set_global_default("prefix", interpolated("${install_prefix}"), "Installation prefix", "");
    set_global_default("build_dir", interpolated("${package_work_dir}/build"), "", "");
    set_global_default("package_build_dir", interpolated("${package_work_dir}/pkg"), "", "");
    set_global_default("source_dir", interpolated("${package_work_dir}/source"), "", "");
    set_global_default("staging_dir", interpolated("${package_work_dir}/stage"), "", "");
    set_global_default("lib_dir_name", Value::scalar("lib"), "", "");
    set_global_default("lib_dir", interpolated("${prefix}/${lib_dir_name}"), "", "");
}

/// Used only by tests, to get a clean slate between cases.
pub fn reset_global_env() {
    GLOBAL_ENV.with(|slot| *slot.borrow_mut() = None);
    reset_global_defaults();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::MockOs;

    #[test]
    fn override_beats_primary_set() {
        let env = Env::new_root();
        let primary = Rc::new(MapNode::new());
        primary.add("x", Value::scalar("primary"), false).unwrap();
        env.add_set(primary);
        env.add_override("x", Value::scalar("override"));
        assert_eq!(env.get("x").unwrap(), Some("override".to_string()));
    }

    #[test]
    fn backup_set_beats_per_env_backup_beats_global_default() {
        set_global_default("y", Value::scalar("global"), "", "");
        let env = Env::new_root();
        env.add_backup("y", Value::scalar("per-env-backup"));
        assert_eq!(env.get("y").unwrap(), Some("per-env-backup".to_string()));

        let backup_set = Rc::new(MapNode::new());
        backup_set.add("y", Value::scalar("backup-set"), false).unwrap();
        env.add_backup_set(backup_set);
        assert_eq!(env.get("y").unwrap(), Some("backup-set".to_string()));
        reset_global_defaults();
    }

    #[test]
    fn falls_through_to_global_default() {
        reset_global_defaults();
        set_global_default("z", Value::scalar("from-default"), "", "");
        let env = Env::new_root();
        assert_eq!(env.get("z").unwrap(), Some("from-default".to_string()));
        reset_global_defaults();
    }

    #[test]
    fn typed_accessors() {
        let env = Env::new_root();
        env.add_override("flag", Value::scalar("yes"));
        env.add_override("count", Value::scalar("42"));
        assert!(env.get_bool("flag", true).unwrap());
        assert_eq!(env.get_long("count", true).unwrap(), 42);
        assert!(!env.get_bool("missing", false).unwrap());
        assert!(env.get_long("missing", true).is_err());
    }

    #[test]
    fn env_as_value_nests_lookup() {
        let inner = Env::new_root();
        inner.add_override("inner_var", Value::scalar("nested"));
        let outer = Env::new_root();
        let wrapped = Value::map();
        wrapped
            .as_map()
            .unwrap()
            .add("inner", inner.as_value(), false)
            .unwrap();
        outer.add_set(wrapped.as_map().unwrap().clone());
        assert_eq!(
            outer.get("inner.inner_var").unwrap(),
            Some("nested".to_string())
        );
    }

    #[test]
    fn architecture_is_cached() {
        let os = MockOs::new();
        os.expect("uname -m", "x86_64\n", "", 0);
        let env = Env::new_root();
        assert_eq!(env.architecture(&os).unwrap(), "x86_64");
        // Second call must not require another mocked command.
        assert_eq!(env.architecture(&os).unwrap(), "x86_64");
    }
}
