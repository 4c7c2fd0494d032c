//! Converts parsed YAML into Buzzy's [`Value`](crate::value::Value) tree.
//!
//! Plain scalars become interpolated templates (so `${name}` references work
//! the same whether they came from a YAML file or a literal env override). A
//! `!git` tag expands into a two-key map (`url`, `commit`) describing a repo
//! link, whether the tagged node was itself a mapping or a bare URL string.

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use crate::error::{BuzzyError, Result};
use crate::os::Os;
use crate::value::{InterpolatedScalar, MapNode, MapValue, StringScalar, Value, VecArray};

const GIT_TAG: &str = "!git";
const DEFAULT_GIT_COMMIT: &str = "master";

/// Load a YAML file (through the OS façade, so it's mockable) and convert
/// its root mapping into a value set suitable for
/// [`Env::add_set`](crate::env::Env::add_set).
pub fn load_file(path: &Path, os: &dyn Os) -> Result<Rc<dyn MapValue>> {
    let bytes = os.load_file(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let yaml: serde_yaml::Value = serde_yaml::from_str(&text)?;
    let value = from_yaml(&yaml)?;
    value.as_map().cloned()
}

/// Convert a single `serde_yaml::Value` into a Buzzy `Value`.
pub fn from_yaml(yaml: &serde_yaml::Value) -> Result<Value> {
    match yaml {
        serde_yaml::Value::Tagged(tagged) => {
            if tagged.tag.to_string() == GIT_TAG {
                git_link(&tagged.value)
            } else {
                Err(BuzzyError::bad_config(format!(
                    "Unknown YAML tag \"{}\"",
                    tagged.tag
                )))
            }
        }
        serde_yaml::Value::Null => Err(BuzzyError::bad_config("YAML null is not a valid value")),
        serde_yaml::Value::Bool(b) => Ok(Value::Scalar(Rc::new(StringScalar(b.to_string())))),
        serde_yaml::Value::Number(n) => Ok(Value::Scalar(Rc::new(StringScalar(n.to_string())))),
        serde_yaml::Value::String(s) => {
            Ok(Value::Scalar(Rc::new(InterpolatedScalar::parse(s)?)))
        }
        serde_yaml::Value::Sequence(items) => {
            let values = items
                .iter()
                .map(from_yaml)
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Array(Rc::new(VecArray(values))))
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut entries = BTreeMap::new();
            for (k, v) in mapping {
                let key = k.as_str().ok_or_else(|| {
                    BuzzyError::bad_config("YAML mapping keys must be strings")
                })?;
                entries.insert(key.to_string(), from_yaml(v)?);
            }
            Ok(Value::Map(Rc::new(MapNode::from_entries(entries))))
        }
    }
}

/// Expand a `!git`-tagged node into `{url, commit}`. A bare string is treated
/// as the URL with an implicit `commit: master` (mirroring how a plain
/// `git://` URL defaults to the `master` branch).
fn git_link(inner: &serde_yaml::Value) -> Result<Value> {
    match inner {
        serde_yaml::Value::String(url) => {
            let mut entries = BTreeMap::new();
            entries.insert(
                "url".to_string(),
                Value::Scalar(Rc::new(StringScalar(url.clone()))),
            );
            entries.insert(
                "commit".to_string(),
                Value::Scalar(Rc::new(StringScalar(DEFAULT_GIT_COMMIT.to_string()))),
            );
            Ok(Value::Map(Rc::new(MapNode::from_entries(entries))))
        }
        serde_yaml::Value::Mapping(_) => {
            let converted = from_yaml(inner)?;
            let map = converted.as_map()?;
            let url = map
                .get("url")
                .ok_or_else(|| BuzzyError::bad_config("!git repo link is missing \"url\""))?;
            let commit = map.get("commit").unwrap_or_else(|| {
                Value::Scalar(Rc::new(StringScalar(DEFAULT_GIT_COMMIT.to_string())))
            });
            let mut entries = BTreeMap::new();
            entries.insert("url".to_string(), url);
            entries.insert("commit".to_string(), commit);
            Ok(Value::Map(Rc::new(MapNode::from_entries(entries))))
        }
        _ => Err(BuzzyError::bad_config(
            "!git tag must be applied to a string or mapping",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Env;

    #[test]
    fn converts_scalars_sequences_and_mappings() {
        let yaml: serde_yaml::Value = serde_yaml::from_str(
            "name: buzzy\nversion: 1.0\ntags:\n  - a\n  - b\nnested:\n  inner: ${name}\n",
        )
        .unwrap();
        let value = from_yaml(&yaml).unwrap();
        let map = value.as_map().unwrap();
        let env = Env::new_root();

        assert_eq!(
            map.get("name").unwrap().as_scalar(&env).unwrap(),
            "buzzy"
        );
        let tags = map.get("tags").unwrap();
        let tags = tags.as_array().unwrap();
        assert_eq!(tags.count(), 2);

        let nested_inner = value.get_nested("nested.inner").unwrap().unwrap();
        env.add_override("name", Value::scalar("buzzy"));
        assert_eq!(nested_inner.as_scalar(&env).unwrap(), "buzzy");
    }

    #[test]
    fn bare_git_string_defaults_commit_to_master() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("!git 'git://example.com/repo.git'")
            .unwrap();
        let value = from_yaml(&yaml).unwrap();
        let map = value.as_map().unwrap();
        let env = Env::new_root();
        assert_eq!(
            map.get("url").unwrap().as_scalar(&env).unwrap(),
            "git://example.com/repo.git"
        );
        assert_eq!(map.get("commit").unwrap().as_scalar(&env).unwrap(), "master");
    }

    #[test]
    fn git_mapping_keeps_explicit_commit() {
        let yaml: serde_yaml::Value = serde_yaml::from_str(
            "!git\nurl: git://example.com/repo.git\ncommit: deadbeef\n",
        )
        .unwrap();
        let value = from_yaml(&yaml).unwrap();
        let map = value.as_map().unwrap();
        let env = Env::new_root();
        assert_eq!(
            map.get("commit").unwrap().as_scalar(&env).unwrap(),
            "deadbeef"
        );
    }
}
