//! The dynamically-typed configuration tree: scalars, arrays, and maps.
//!
//! A [`Value`] is evaluated against an [`Env`](crate::env::Env), which lets a
//! scalar interpolate other variables (`${a.b}`) without knowing in advance
//! where it will end up being read from.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::env::Env;
use crate::error::{BuzzyError, Result};

/// A scalar that can render itself to a string given an evaluation context.
pub trait Scalar: fmt::Debug {
    fn get(&self, ctx: &Env) -> Result<String>;
}

/// An indexable sequence of values.
pub trait ArrayValue: fmt::Debug {
    fn count(&self) -> usize;
    fn get(&self, index: usize) -> Option<Value>;
}

/// A keyed collection of values.
pub trait MapValue: fmt::Debug {
    fn get(&self, key: &str) -> Option<Value>;
    /// Add `value` under `key`. Maps that don't support mutation (e.g. an
    /// env-as-value wrapper) reject this with `BadConfig`.
    fn add(&self, key: &str, value: Value, overwrite: bool) -> Result<()>;
}

/// A node in the configuration tree.
#[derive(Clone)]
pub enum Value {
    Scalar(Rc<dyn Scalar>),
    Array(Rc<dyn ArrayValue>),
    Map(Rc<dyn MapValue>),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => write!(f, "Value::Scalar({s:?})"),
            Value::Array(a) => write!(f, "Value::Array({a:?})"),
            Value::Map(m) => write!(f, "Value::Map({m:?})"),
        }
    }
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    pub fn scalar(s: impl Into<String>) -> Self {
        Value::Scalar(Rc::new(StringScalar(s.into())))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(VecArray(items)))
    }

    pub fn map() -> Self {
        Value::Map(Rc::new(MapNode::new()))
    }

    pub fn as_scalar(&self, ctx: &Env) -> Result<String> {
        match self {
            Value::Scalar(s) => s.get(ctx),
            other => Err(BuzzyError::bad_config(format!(
                "Value must be a scalar, found {}",
                other.kind()
            ))),
        }
    }

    pub fn as_map(&self) -> Result<&Rc<dyn MapValue>> {
        match self {
            Value::Map(m) => Ok(m),
            other => Err(BuzzyError::bad_config(format!(
                "Value must be a map, found {}",
                other.kind()
            ))),
        }
    }

    pub fn as_array(&self) -> Result<&Rc<dyn ArrayValue>> {
        match self {
            Value::Array(a) => Ok(a),
            other => Err(BuzzyError::bad_config(format!(
                "Value must be an array, found {}",
                other.kind()
            ))),
        }
    }

    /// Walk successive map children for each dot-separated component of
    /// `key`, returning the value at the end of the path (if any).
    pub fn get_nested(&self, key: &str) -> Result<Option<Value>> {
        let mut curr = self.clone();
        let mut parts = key.split('.').peekable();
        while let Some(part) = parts.next() {
            let map = curr.as_map()?;
            match map.get(part) {
                Some(v) => {
                    if parts.peek().is_some() {
                        curr = v;
                    } else {
                        return Ok(Some(v));
                    }
                }
                None => return Ok(None),
            }
        }
        Ok(None)
    }

    /// Like [`get_nested`](Self::get_nested), but interposes empty maps for
    /// missing intermediates and adds `element` at the end of the path.
    pub fn set_nested(&self, key: &str, element: Value, overwrite: bool) -> Result<()> {
        let mut curr = self.clone();
        let mut parts = key.split('.').peekable();
        while let Some(part) = parts.next() {
            let map = curr.as_map()?.clone();
            if parts.peek().is_some() {
                curr = match map.get(part) {
                    Some(v) => v,
                    None => {
                        let child = Value::map();
                        map.add(part, child.clone(), false)?;
                        child
                    }
                };
            } else {
                return map.add(part, element, overwrite);
            }
        }
        Ok(())
    }
}

/// Call `f` once per scalar: once if `value` is itself a scalar, or once per
/// element if `value` is an array of scalars. Any other shape is rejected.
pub fn for_each_scalar(value: &Value, mut f: impl FnMut(&Value) -> Result<()>) -> Result<()> {
    match value {
        Value::Scalar(_) => f(value),
        Value::Array(arr) => {
            for i in 0..arr.count() {
                let element = arr
                    .get(i)
                    .ok_or_else(|| BuzzyError::bad_config("Array index out of range"))?;
                if !matches!(element, Value::Scalar(_)) {
                    return Err(BuzzyError::bad_config("Array must only contain scalars"));
                }
                f(&element)?;
            }
            Ok(())
        }
        Value::Map(_) => Err(BuzzyError::bad_config("Value must be an array or scalar")),
    }
}

/// A scalar holding a fixed string.
#[derive(Debug)]
pub struct StringScalar(pub String);

impl Scalar for StringScalar {
    fn get(&self, _ctx: &Env) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone)]
enum Element {
    Literal(String),
    Reference(String),
}

/// A scalar template mixing literal text with `${dotted.name}` references,
/// resolved against whatever `Env` it's evaluated in.
#[derive(Debug)]
pub struct InterpolatedScalar {
    elements: Vec<Element>,
}

impl InterpolatedScalar {
    /// Parse a template string. `$$` renders as a literal `$`; `${` must be
    /// matched by a `}`.
    pub fn parse(template: &str) -> Result<Self> {
        let mut elements = Vec::new();
        let mut literal = String::new();
        let bytes = template.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'$' {
                if i + 1 >= bytes.len() {
                    return Err(BuzzyError::bad_config(
                        "Unterminated '$' at end of template",
                    ));
                }
                match bytes[i + 1] {
                    b'$' => {
                        literal.push('$');
                        i += 2;
                    }
                    b'{' => {
                        if let Some(rel_end) = template[i + 2..].find('}') {
                            let name = &template[i + 2..i + 2 + rel_end];
                            if name.is_empty()
                                || !name
                                    .chars()
                                    .all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '-')
                            {
                                return Err(BuzzyError::bad_config(format!(
                                    "Invalid variable reference \"{name}\""
                                )));
                            }
                            if !literal.is_empty() {
                                elements.push(Element::Literal(std::mem::take(&mut literal)));
                            }
                            elements.push(Element::Reference(name.to_string()));
                            i += 2 + rel_end + 1;
                        } else {
                            return Err(BuzzyError::bad_config("Unterminated '${' in template"));
                        }
                    }
                    _ => {
                        return Err(BuzzyError::bad_config(
                            "'$' must be followed by '$' or '{'",
                        ));
                    }
                }
            } else {
                let ch_len = template[i..].chars().next().unwrap().len_utf8();
                literal.push_str(&template[i..i + ch_len]);
                i += ch_len;
            }
        }
        if !literal.is_empty() {
            elements.push(Element::Literal(literal));
        }
        Ok(Self { elements })
    }
}

impl Scalar for InterpolatedScalar {
    fn get(&self, ctx: &Env) -> Result<String> {
        let mut out = String::new();
        for element in &self.elements {
            match element {
                Element::Literal(text) => out.push_str(text),
                Element::Reference(name) => {
                    let value = ctx.get(name)?.ok_or_else(|| {
                        BuzzyError::bad_config(format!("No value for \"{name}\""))
                    })?;
                    out.push_str(&value.as_scalar(ctx)?);
                }
            }
        }
        Ok(out)
    }
}

/// A plain `Vec<Value>`-backed array.
#[derive(Debug)]
pub struct VecArray(pub Vec<Value>);

impl ArrayValue for VecArray {
    fn count(&self) -> usize {
        self.0.len()
    }

    fn get(&self, index: usize) -> Option<Value> {
        self.0.get(index).cloned()
    }
}

/// A plain, mutable, insertion-order-preserving map.
#[derive(Debug, Default)]
pub struct MapNode {
    entries: RefCell<BTreeMap<String, Value>>,
}

impl MapNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: BTreeMap<String, Value>) -> Self {
        Self {
            entries: RefCell::new(entries),
        }
    }
}

impl MapValue for MapNode {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.borrow().get(key).cloned()
    }

    fn add(&self, key: &str, value: Value, overwrite: bool) -> Result<()> {
        let mut entries = self.entries.borrow_mut();
        if !overwrite && entries.contains_key(key) {
            return Err(BuzzyError::bad_config(format!(
                "Key \"{key}\" already exists"
            )));
        }
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// A read-only view over several child maps, consulted in order. Nested maps
/// found under the same key in more than one child are merged, on demand,
/// into a further union map; the merge is cached so repeated lookups don't
/// re-synthesise it.
#[derive(Debug)]
pub struct UnionMap {
    children: Vec<Rc<dyn MapValue>>,
    cache: RefCell<BTreeMap<String, Value>>,
}

impl UnionMap {
    pub fn new(children: Vec<Rc<dyn MapValue>>) -> Self {
        Self {
            children,
            cache: RefCell::new(BTreeMap::new()),
        }
    }
}

impl MapValue for UnionMap {
    fn get(&self, key: &str) -> Option<Value> {
        if let Some(cached) = self.cache.borrow().get(key) {
            return Some(cached.clone());
        }
        let mut maps = Vec::new();
        let mut other = None;
        for child in &self.children {
            match child.get(key) {
                Some(Value::Map(m)) => maps.push(m),
                Some(v) if other.is_none() => other = Some(v),
                Some(_) => return None,
                None => {}
            }
        }
        let result = if !maps.is_empty() {
            if other.is_some() {
                return None;
            }
            Some(Value::Map(Rc::new(UnionMap::new(maps))))
        } else {
            other
        };
        if let Some(v) = &result {
            self.cache.borrow_mut().insert(key.to_string(), v.clone());
        }
        result
    }

    fn add(&self, key: &str, value: Value, overwrite: bool) -> Result<()> {
        self.children
            .last()
            .ok_or_else(|| BuzzyError::bad_config("Union map has no children to add to"))?
            .add(key, value, overwrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Env;

    #[test]
    fn interpolation_renders_literals_and_refs() {
        let env = Env::new_root();
        env.add_override("name", Value::scalar("buzzy"));
        let scalar = InterpolatedScalar::parse("hello ${name}!").unwrap();
        assert_eq!(scalar.get(&env).unwrap(), "hello buzzy!");
    }

    #[test]
    fn dollar_dollar_is_literal_dollar() {
        let env = Env::new_root();
        let scalar = InterpolatedScalar::parse("cost: $$5").unwrap();
        assert_eq!(scalar.get(&env).unwrap(), "cost: $5");
    }

    #[test]
    fn unterminated_brace_is_parse_error() {
        assert!(InterpolatedScalar::parse("${oops").is_err());
    }

    #[test]
    fn nested_get_and_set() {
        let root = Value::map();
        root.set_nested("a.b.c", Value::scalar("leaf"), false).unwrap();
        let got = root.get_nested("a.b.c").unwrap().unwrap();
        let env = Env::new_root();
        assert_eq!(got.as_scalar(&env).unwrap(), "leaf");
    }

    #[test]
    fn union_map_merges_nested_maps() {
        let a = Value::map();
        a.set_nested("shared.x", Value::scalar("1"), false).unwrap();
        let b = Value::map();
        b.set_nested("shared.y", Value::scalar("2"), false).unwrap();
        let union = Value::Map(Rc::new(UnionMap::new(vec![
            a.as_map().unwrap().clone(),
            b.as_map().unwrap().clone(),
        ])));
        let env = Env::new_root();
        let x = union.get_nested("shared.x").unwrap().unwrap();
        let y = union.get_nested("shared.y").unwrap().unwrap();
        assert_eq!(x.as_scalar(&env).unwrap(), "1");
        assert_eq!(y.as_scalar(&env).unwrap(), "2");
    }

    #[test]
    fn for_each_scalar_accepts_bare_scalar_or_array() {
        let mut seen = Vec::new();
        let env = Env::new_root();
        for_each_scalar(&Value::scalar("solo"), |v| {
            seen.push(v.as_scalar(&env).unwrap());
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec!["solo"]);

        seen.clear();
        let arr = Value::array(vec![Value::scalar("a"), Value::scalar("b")]);
        for_each_scalar(&arr, |v| {
            seen.push(v.as_scalar(&env).unwrap());
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec!["a", "b"]);
    }

    #[test]
    fn for_each_scalar_rejects_map() {
        let map = Value::map();
        assert!(for_each_scalar(&map, |_| Ok(())).is_err());
    }
}
