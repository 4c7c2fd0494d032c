//! Dependency predicates: `name` or `name >= version`.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{BuzzyError, Result};
use crate::version::Version;

lazy_static! {
    static ref DEP_RE: Regex =
        Regex::new(r"^([A-Za-z0-9_-]+)(?:\s*>=\s*([A-Za-z0-9.~+]+))?$").unwrap();
}

/// A dependency on a named package, optionally requiring a minimum version.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub name: String,
    pub min_version: Option<Version>,
}

impl Dependency {
    /// Construct a dependency with no version constraint.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_version: None,
        }
    }

    /// Construct a dependency requiring at least `min_version`.
    pub fn with_min_version(name: impl Into<String>, min_version: Version) -> Self {
        Self {
            name: name.into(),
            min_version: Some(min_version),
        }
    }

    /// Parse `NAME ( '>=' VERSION )?`. Fails with `InvalidDependency` on any
    /// deviation from the grammar.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let caps = DEP_RE
            .captures(trimmed)
            .ok_or_else(|| BuzzyError::invalid_dependency(format!("Invalid dependency \"{s}\"")))?;
        let name = caps.get(1).unwrap().as_str().to_string();
        let min_version = match caps.get(2) {
            Some(m) => Some(Version::parse(m.as_str())?),
            None => None,
        };
        Ok(Self { name, min_version })
    }

    /// Does `version` satisfy this dependency's minimum (if any)?
    pub fn is_satisfied_by(&self, version: &Version) -> bool {
        match &self.min_version {
            Some(min) => version.try_cmp(min).map(|o| o.is_ge()).unwrap_or(false),
            None => true,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.min_version {
            Some(v) => write!(f, "{} >= {}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
impl Eq for Dependency {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_name() {
        let dep = Dependency::parse("jansson").unwrap();
        assert_eq!(dep.name, "jansson");
        assert!(dep.min_version.is_none());
    }

    #[test]
    fn parse_versioned() {
        let dep = Dependency::parse("jansson >= 2.4").unwrap();
        assert_eq!(dep.name, "jansson");
        assert_eq!(dep.min_version.unwrap().to_string(), "2.4");
    }

    #[test]
    fn parse_rejects_bad_grammar() {
        assert!(Dependency::parse("jansson <= 2.4").is_err());
        assert!(Dependency::parse("").is_err());
        assert!(Dependency::parse("bad name").is_err());
    }

    #[test]
    fn display_canonical_form() {
        assert_eq!(Dependency::new("foo").to_string(), "foo");
        let dep =
            Dependency::with_min_version("foo", Version::parse("1.0").unwrap());
        assert_eq!(dep.to_string(), "foo >= 1.0");
    }

    #[test]
    fn to_string_round_trips_through_parse() {
        let dep = Dependency::parse("libbar >= 2.5~alpha.1").unwrap();
        let reparsed = Dependency::parse(&dep.to_string()).unwrap();
        assert_eq!(dep, reparsed);
    }
}
