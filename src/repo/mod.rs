//! Repository loading: filesystem repos, git-backed repos, and the
//! process-wide URL-repo cache (§4.10).
//!
//! A repo's `version`/`builder`/`packager` auto-detection all need the OS
//! façade, which `Value`/`Env` deliberately never hold onto (§5's "threaded
//! through explicitly" rule) — so unlike most Buzzy values, these aren't
//! lazy scalars. They're resolved once, eagerly, at `load()`/construction
//! time, when an `&dyn Os` is actually in scope, and stashed as plain
//! backups from then on.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use sha2::{Digest, Sha256};

use crate::builder;
use crate::dependency::Dependency;
use crate::env::Env;
use crate::error::Result;
use crate::os::Os;
use crate::package::Package;
use crate::packager;
use crate::pdb::{self, SinglePackagePdb};
use crate::value::Value;
use crate::version::Version;
use crate::yaml;

fn interpolated(template: &str) -> Value {
    Value::Scalar(Rc::new(
        crate::value::InterpolatedScalar::parse(template).unwrap(),
    ))
}

enum Origin {
    Filesystem,
    Git { url: String, commit: String },
}

/// A repository: an env (overriding `repo.base_dir`), a `load` action
/// (idempotent) and an `update` action.
pub struct Repo {
    env: Env,
    origin: Origin,
    loaded: Cell<bool>,
    default_package: RefCell<Option<Rc<Package>>>,
}

impl std::fmt::Debug for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Repo({})", self.env.name())
    }
}

impl Repo {
    /// A repo rooted directly at `base_dir` on the local filesystem.
    pub fn filesystem(base_dir: impl Into<PathBuf>) -> Self {
        let env = Env::new_child("repo", &crate::env::global_env());
        env.add_override(
            "repo.base_dir",
            Value::scalar(base_dir.into().display().to_string()),
        );
        Self::with_env(env, Origin::Filesystem)
    }

    /// A repo cloned from a git `url` at `commit` into the repo cache.
    pub fn git(url: impl Into<String>, commit: impl Into<String>) -> Self {
        let url = url.into();
        let commit = commit.into();
        let env = Env::new_child("repo", &crate::env::global_env());
        let slug = make_slug(&url, &commit);
        env.add_override("repo.git.url", Value::scalar(url.clone()));
        env.add_override("repo.git.commit", Value::scalar(commit.clone()));
        env.add_override("repo.slug", Value::scalar(slug));
        env.add_override("repo.base_dir", interpolated("${work_path}/repos/${repo.slug}"));
        Self::with_env(env, Origin::Git { url, commit })
    }

    fn with_env(env: Env, origin: Origin) -> Self {
        env.add_backup("repo.git_dir", interpolated("${repo.base_dir}/.git"));
        env.add_backup("repo.repo_yaml", interpolated("${repo.base_dir}/.buzzy/repo.yaml"));
        env.add_backup(
            "repo.package_yaml",
            interpolated("${repo.base_dir}/.buzzy/package.yaml"),
        );
        Self {
            env,
            origin,
            loaded: Cell::new(false),
            default_package: RefCell::new(None),
        }
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// This repo's default package, if `load` found a `package.yaml`.
    pub fn default_package(&self) -> Option<Rc<Package>> {
        self.default_package.borrow().clone()
    }

    /// Idempotent: clones/checks out a git origin, then reads `repo.yaml`,
    /// detects a git checkout's version, and registers the default package.
    pub fn load(&self, os: &dyn Os) -> Result<()> {
        if self.loaded.get() {
            return Ok(());
        }
        self.loaded.set(true);

        if let Origin::Git { url, commit } = &self.origin {
            self.clone_or_checkout(url, commit, os)?;
        }

        self.load_repo_yaml(os)?;
        self.add_git_version(os)?;
        self.create_default_package(os)?;
        Ok(())
    }

    /// Re-fetch a git origin's commit; a no-op for plain filesystem repos.
    pub fn update(&self, os: &dyn Os) -> Result<()> {
        if let Origin::Git { url, commit } = &self.origin {
            let base_dir = self
                .env
                .get_path("repo.base_dir", true)?
                .expect("required by get_path");
            let base_dir = base_dir.display().to_string();
            os.run(&["git", "-C", &base_dir, "fetch", "origin"], None)?;
            os.run(&["git", "-C", &base_dir, "checkout", commit], None)?;
            let _ = url;
        }
        Ok(())
    }

    fn clone_or_checkout(&self, url: &str, commit: &str, os: &dyn Os) -> Result<()> {
        let base_dir = self
            .env
            .get_path("repo.base_dir", true)?
            .expect("required by get_path");
        if !os.file_exists(&base_dir) {
            if let Some(parent) = base_dir.parent() {
                os.create_dir(parent)?;
            }
            let base_dir_str = base_dir.display().to_string();
            os.run(&["git", "clone", url, &base_dir_str], None)?;
        }
        let base_dir_str = base_dir.display().to_string();
        os.run(&["git", "-C", &base_dir_str, "checkout", commit], None)?;
        Ok(())
    }

    fn load_repo_yaml(&self, os: &dyn Os) -> Result<()> {
        let repo_yaml = self
            .env
            .get_path("repo.repo_yaml", true)?
            .expect("required by get_path");
        if os.file_exists(&repo_yaml) {
            let set = yaml::load_file(&repo_yaml, os)?;
            self.env.add_set(set);
        }
        Ok(())
    }

    fn add_git_version(&self, os: &dyn Os) -> Result<()> {
        let git_dir = self
            .env
            .get_path("repo.git_dir", true)?
            .expect("required by get_path");
        if !os.file_exists(&git_dir) {
            return Ok(());
        }
        let base_dir = self
            .env
            .get_path("repo.base_dir", true)?
            .expect("required by get_path");
        let base_dir_str = base_dir.display().to_string();
        let mut out = Vec::new();
        let mut success = true;
        os.get_output(
            &["git", "-C", &base_dir_str, "describe", "--tags", "--dirty"],
            &mut out,
            &mut Vec::new(),
            Some(&mut success),
        )?;
        if success {
            let described = String::from_utf8_lossy(&out).trim().to_string();
            if !described.is_empty() {
                let version = Version::from_git_describe(&described)?;
                self.env.add_backup("version", Value::scalar(version.to_string()));
            }
        }
        Ok(())
    }

    fn create_default_package(&self, os: &dyn Os) -> Result<()> {
        let package_yaml = self
            .env
            .get_path("repo.package_yaml", true)?
            .expect("required by get_path");
        if !os.file_exists(&package_yaml) {
            return Ok(());
        }

        let package_env = Env::new_child("package", &self.env);
        let set = yaml::load_file(&package_yaml, os)?;
        package_env.add_set(set);
        package_env.add_backup("source_dir", interpolated("${repo.base_dir}"));

        let package = build_package(package_env, os)?;
        pdb::register(Rc::new(SinglePackagePdb::new(package.clone())));
        *self.default_package.borrow_mut() = Some(package);
        Ok(())
    }
}

/// Construct a built `Package` from a fully-populated package env: resolves
/// (eagerly, since it needs `os`) the builder/packager auto-detectors if the
/// env doesn't already pin one, then reads `name`/`version`/`dependencies`.
pub fn build_package(env: Env, os: &dyn Os) -> Result<Rc<Package>> {
    if env.get_string("builder", false)?.is_none() {
        let detected = builder::detect(&env, os)?;
        env.add_backup("builder", Value::scalar(detected));
    }
    if env.get_string("packager", false)?.is_none() {
        let detected = packager::detect(os).ok_or_else(|| {
            crate::error::BuzzyError::bad_config("Could not detect a native packager for this host")
        })?;
        env.add_backup("packager", Value::scalar(detected));
    }

    let name = env
        .get_string("name", true)?
        .expect("required by get_string");
    let version = env
        .get_version("version", true)?
        .expect("required by get_version");

    let builder = builder::from_env(&env)?;
    let packager = packager::from_env(&env)?;
    Ok(Package::new_built(env, name, version, builder, packager))
}

/// Resolve every `dependencies`/`build_dependencies` entry in `env` against
/// the global PDB registry, installing whichever packages the registry
/// supplies.
pub fn install_dependencies(env: &Env, os: &dyn Os) -> Result<()> {
    for key in ["dependencies", "build_dependencies"] {
        if let Some(value) = env.get_value(key)? {
            crate::value::for_each_scalar(&value, |v| {
                let text = v.as_scalar(env)?;
                let dep = Dependency::parse(&text)?;
                pdb::install_dependency(&dep, os)
            })?;
        }
    }
    Ok(())
}

fn make_slug(url: &str, commit: &str) -> String {
    let last_segment = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);
    let basename = last_segment.strip_suffix(".git").unwrap_or(last_segment);

    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update([0]);
    hasher.update(commit.as_bytes());
    let digest = hasher.finalize();
    format!("{basename}-{}", hex::encode(&digest[..4]))
}

thread_local! {
    static URL_REPOS: RefCell<HashMap<String, Rc<Repo>>> = RefCell::new(HashMap::new());
}

/// Build (or return the cached) repo for a bare URL string: `file://` and
/// bare paths become filesystem repos, `git://`/`git+...` become git repos
/// on `master`. Cached process-wide, keyed by URL.
pub fn url_repo(url: &str) -> Result<Rc<Repo>> {
    if let Some(cached) = URL_REPOS.with(|cache| cache.borrow().get(url).cloned()) {
        return Ok(cached);
    }
    let repo = Rc::new(create_url_repo(url)?);
    URL_REPOS.with(|cache| cache.borrow_mut().insert(url.to_string(), repo.clone()));
    Ok(repo)
}

/// Same cache, keyed by URL, but for an explicit `!git` link that pins a
/// commit rather than defaulting to `master`.
pub fn git_repo(url: &str, commit: &str) -> Rc<Repo> {
    if let Some(cached) = URL_REPOS.with(|cache| cache.borrow().get(url).cloned()) {
        return cached;
    }
    let repo = Rc::new(Repo::git(url.to_string(), commit.to_string()));
    URL_REPOS.with(|cache| cache.borrow_mut().insert(url.to_string(), repo.clone()));
    repo
}

fn create_url_repo(url: &str) -> Result<Repo> {
    if !url.contains("://") {
        return Ok(Repo::filesystem(url));
    }
    if let Some(path) = url.strip_prefix("file://") {
        return Ok(Repo::filesystem(path));
    }
    if url.starts_with("git://") || url.starts_with("git+") {
        return Ok(Repo::git(url.to_string(), "master"));
    }
    Err(crate::error::BuzzyError::bad_config(format!(
        "Unknown repository URL {url}"
    )))
}

/// Used only by tests, to get a clean slate between cases.
pub fn reset_url_repos() {
    URL_REPOS.with(|cache| cache.borrow_mut().clear());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::MockOs;

    #[test]
    fn filesystem_repo_without_buzzy_dir_loads_as_noop() {
        crate::env::reset_global_env();
        let os = MockOs::new();
        os.expect("[ -f /srv/pkg/.buzzy/repo.yaml ]", "", "", 1);
        os.expect("[ -f /srv/pkg/.git ]", "", "", 1);
        os.expect("[ -f /srv/pkg/.buzzy/package.yaml ]", "", "", 1);
        let repo = Repo::filesystem("/srv/pkg");
        repo.load(&os).unwrap();
        assert!(repo.default_package().is_none());
    }

    #[test]
    fn filesystem_repo_loads_package_yaml_into_registry() {
        crate::env::reset_global_env();
        pdb::reset_registry();
        let os = MockOs::new();
        os.expect("[ -f /srv/pkg/.buzzy/repo.yaml ]", "", "", 1);
        os.expect("[ -f /srv/pkg/.git ]", "", "", 1);
        os.seed_file(
            "/srv/pkg/.buzzy/package.yaml",
            "name: widget\nversion: \"1.0\"\nbuilder: noop\npackager: noop\n",
        );
        let repo = Repo::filesystem("/srv/pkg");
        repo.load(&os).unwrap();
        let package = repo.default_package().unwrap();
        assert_eq!(package.name(), "widget");
        assert_eq!(package.version().to_string(), "1.0");

        let found = pdb::satisfy_dependency(&Dependency::parse("widget").unwrap(), &os).unwrap();
        assert!(Rc::ptr_eq(&found, &package));
        pdb::reset_registry();
    }

    #[test]
    fn git_url_repo_defaults_to_master_and_is_cached() {
        reset_url_repos();
        let a = url_repo("git://example.com/widget.git").unwrap();
        let b = url_repo("git://example.com/widget.git").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        reset_url_repos();
    }

    #[test]
    fn slug_combines_basename_and_stable_hash() {
        let slug = make_slug("https://example.com/widget.git", "deadbeef");
        assert!(slug.starts_with("widget-"));
        assert_eq!(slug.len(), "widget-".len() + 8);
    }
}
