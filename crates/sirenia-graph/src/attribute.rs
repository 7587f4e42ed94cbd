//! Attributes: named, ordinal-indexed slots attached to graph elements.
//!
//! Ordinals are handed out densely in order of first use by an [`AttributeRegistry`]. They are only
//! stable across processes if the names are registered in a fixed order (see
//! [`AttributeRegistry::with_names`]); otherwise serialize attributes by name.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError};

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

/// A registered attribute. Equality and hashing use the ordinal only.
#[derive(Debug, Clone)]
pub struct Attribute {
    ordinal: u32,
    name: Arc<str>,
}

impl Attribute {
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.ordinal == other.ordinal
    }
}

impl Eq for Attribute {}

impl Hash for Attribute {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ordinal.hash(state);
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.ordinal)
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    by_name: HashMap<Arc<str>, Attribute>,
    by_ordinal: Vec<Attribute>,
}

/// Bijective, thread-safe mapping between attribute names and ordinals.
///
/// Lookup-or-create runs under a single lock so concurrent first uses of a name agree on its
/// ordinal. An ordinal is never reassigned to a different name.
#[derive(Debug, Default)]
pub struct AttributeRegistry {
    inner: Mutex<RegistryInner>,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `names` pre-registered in order, giving them ordinals `0..names.len()`.
    pub fn with_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let registry = Self::new();
        registry.register_all(names)?;
        Ok(registry)
    }

    /// Registers `names` in order. Names already known keep their ordinal.
    pub fn register_all<I, S>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.try_attribute(name.as_ref())?;
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryInner> {
        // The registry is append-only; a poisoned lock still holds a consistent mapping.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the attribute for `name`, registering it with the next ordinal on first use.
    ///
    /// # Panics
    ///
    /// Panics if `name` is new and every `u32` ordinal is taken. Use
    /// [`try_attribute`](Self::try_attribute) where that must be handled.
    pub fn attribute(&self, name: &str) -> Attribute {
        match self.try_attribute(name) {
            Ok(a) => a,
            Err(e) => panic!("{e}"),
        }
    }

    /// Like [`attribute`](Self::attribute), but refuses a new name once the ordinals run out.
    pub fn try_attribute(&self, name: &str) -> Result<Attribute> {
        let mut inner = self.lock();
        if let Some(a) = inner.by_name.get(name) {
            return Ok(a.clone());
        }
        let ordinal = next_ordinal(inner.by_ordinal.len()).ok_or_else(|| Error::AttributeLimit {
            name: name.to_string(),
        })?;
        let name: Arc<str> = Arc::from(name);
        let a = Attribute {
            ordinal,
            name: name.clone(),
        };
        inner.by_name.insert(name, a.clone());
        inner.by_ordinal.push(a.clone());
        Ok(a)
    }

    /// Looks up `name` without registering it.
    pub fn lookup(&self, name: &str) -> Option<Attribute> {
        self.lock().by_name.get(name).cloned()
    }

    pub fn by_ordinal(&self, ordinal: u32) -> Option<Attribute> {
        let idx = usize::try_from(ordinal).ok()?;
        self.lock().by_ordinal.get(idx).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().by_ordinal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registered attributes in ordinal order.
    pub fn attributes(&self) -> Vec<Attribute> {
        self.lock().by_ordinal.clone()
    }
}

/// Ordinal for the attribute registered after `len` others, if one is left.
fn next_ordinal(len: usize) -> Option<u32> {
    u32::try_from(len).ok()
}

/// Value stored in an attribute slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<AttrValue>),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(v) => write!(f, "{v}"),
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Text(v) => f.write_str(v),
            AttrValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Int(i64::from(v))
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

impl From<Vec<AttrValue>> for AttrValue {
    fn from(v: Vec<AttrValue>) -> Self {
        AttrValue::List(v)
    }
}

/// Attribute values of one element, in insertion order.
///
/// Equality ignores order: two maps are equal if they hold the same attributes with equal values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: IndexMap<Attribute, AttrValue, FxBuildHasher>,
}

impl Attributes {
    pub fn get(&self, attribute: &Attribute) -> Option<&AttrValue> {
        self.values.get(attribute)
    }

    /// Sets or, with `None`, removes the value of `attribute`. Returns the previous value.
    pub fn set(&mut self, attribute: Attribute, value: Option<AttrValue>) -> Option<AttrValue> {
        match value {
            Some(v) => self.values.insert(attribute, v),
            None => self.values.shift_remove(&attribute),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Attribute, &AttrValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (a, v)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{v}", a.name())?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_registry_assigns_dense_ordinals_in_first_use_order() {
        let r = AttributeRegistry::new();
        let text = r.attribute("text");
        let color = r.attribute("color");
        assert_eq!(text.ordinal(), 0);
        assert_eq!(color.ordinal(), 1);
        assert_eq!(r.attribute("text"), text);
        assert_eq!(r.len(), 2);
        assert_eq!(r.by_ordinal(1).map(|a| a.name().to_string()), Some("color".into()));
        assert!(r.by_ordinal(2).is_none());
        assert!(r.lookup("missing").is_none());
    }

    #[test]
    fn attribute_registry_is_consistent_across_threads() {
        let r = Arc::new(AttributeRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let r = r.clone();
                std::thread::spawn(move || {
                    let names = ["a", "b", "c", "d"];
                    names
                        .iter()
                        .cycle()
                        .skip(i)
                        .take(4)
                        .map(|n| (n.to_string(), r.attribute(n).ordinal()))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen: std::collections::BTreeMap<String, u32> = Default::default();
        for h in handles {
            for (name, ordinal) in h.join().expect("thread") {
                let prev = seen.insert(name, ordinal);
                assert!(prev.is_none() || prev == Some(ordinal));
            }
        }
        assert_eq!(r.len(), 4);
        let mut ordinals: Vec<u32> = seen.values().copied().collect();
        ordinals.sort_unstable();
        assert_eq!(ordinals, vec![0, 1, 2, 3]);
    }

    #[test]
    fn attributes_equality_ignores_insertion_order() {
        let r = AttributeRegistry::with_names(["x", "y"]).unwrap();
        let x = r.attribute("x");
        let y = r.attribute("y");

        let mut a = Attributes::default();
        a.set(x.clone(), Some(1.into()));
        a.set(y.clone(), Some("two".into()));

        let mut b = Attributes::default();
        b.set(y.clone(), Some("two".into()));
        b.set(x.clone(), Some(1.into()));
        assert_eq!(a, b);

        b.set(x, None);
        assert_ne!(a, b);
    }

    #[test]
    fn attribute_ordinals_stop_at_the_u32_limit() {
        assert_eq!(next_ordinal(0), Some(0));
        assert_eq!(next_ordinal(u32::MAX as usize), Some(u32::MAX));
        #[cfg(target_pointer_width = "64")]
        assert_eq!(next_ordinal(u32::MAX as usize + 1), None);
    }

    #[test]
    fn attribute_register_all_keeps_known_ordinals() {
        let r = AttributeRegistry::new();
        let b = r.try_attribute("b").unwrap();
        r.register_all(["a", "b", "c"]).unwrap();
        assert_eq!(r.lookup("b"), Some(b));
        assert_eq!(r.lookup("a").map(|a| a.ordinal()), Some(1));
        assert_eq!(r.lookup("c").map(|a| a.ordinal()), Some(2));
    }
}
