// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flattened key/value context.

use std::collections::BTreeMap;
use std::fmt::{Debug, Display};
use std::sync::Arc;

/// A single context value.
///
/// Scalars keep their type so that sinks receiving them through the `log` facade
/// can treat numbers as numbers. Anything else is captured once as its `Debug`
/// representation via [`Value::debug`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Str(Arc<str>),
    /// A pre-rendered `Debug` representation.
    Debug(Arc<str>),
}

impl Value {
    /// Captures the `Debug` representation of an arbitrary value.
    ///
    /// ```
    /// use contextlog::Value;
    /// let v = Value::debug(&vec![1, 2]);
    /// assert_eq!(v.to_string(), "[1, 2]");
    /// ```
    pub fn debug<T: Debug + ?Sized>(value: &T) -> Value {
        Value::Debug(format!("{value:?}").into())
    }

    /// Writes the value the way it appears in `key=value` pairs.
    ///
    /// Strings are quoted and escaped; every other variant renders as its display form.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("{:?}", &**s),
            other => other.to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn to_kv(&self) -> log::kv::Value<'_> {
        match self {
            Value::Bool(b) => log::kv::Value::from(*b),
            Value::I64(i) => log::kv::Value::from(*i),
            Value::U64(u) => log::kv::Value::from(*u),
            Value::F64(f) => log::kv::Value::from(*f),
            Value::Str(s) => log::kv::Value::from(&**s),
            Value::Debug(s) => log::kv::Value::from_display(s),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::I64(i) => write!(f, "{i}"),
            Value::U64(u) => write!(f, "{u}"),
            Value::F64(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Debug(s) => f.write_str(s),
        }
    }
}

macro_rules! value_from {
    ($variant:ident as $target:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                #[inline]
                fn from(v: $t) -> Self {
                    Value::$variant(v as $target)
                }
            }
        )*
    };
}

value_from!(I64 as i64: i8, i16, i32, i64, isize);
value_from!(U64 as u64: u8, u16, u32, u64, usize);
value_from!(F64 as f64: f32, f64);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v.into())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Str(v.as_str().into())
    }
}

impl From<Arc<str>> for Value {
    fn from(v: Arc<str>) -> Self {
        Value::Str(v)
    }
}

/// A flattened mapping from field name to [`Value`].
///
/// `Fields` is always fully resolved: there are no deltas or parent pointers inside,
/// so whoever reads one sees every inherited key. Clones share storage; any
/// modification copies on write, so a `Fields` handed out can never change under
/// its holder.
///
/// Keys iterate in sorted order, which keeps rendered output stable.
///
/// ```
/// use contextlog::{fields, Fields};
/// let f: Fields = fields! { ctx = "test", attempt = 2 };
/// assert_eq!(f.to_string(), r#"attempt=2 ctx="test""#);
/// ```
#[derive(Clone, Default, PartialEq)]
pub struct Fields {
    map: Arc<BTreeMap<String, Value>>,
}

impl Fields {
    pub fn new() -> Fields {
        Fields::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// Returns a copy with `key` set to `value`.
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Fields {
        let mut next = self.clone();
        next.insert(key, value);
        next
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        Arc::make_mut(&mut self.map).insert(key.into(), value.into());
    }

    /// Returns `self` overridden by every key of `overrides`.
    ///
    /// See [`merge`](super::merge::merge).
    pub fn merge(&self, overrides: &Fields) -> Fields {
        super::merge::merge(self, overrides)
    }

    /// A view rendering only the keys that `keep` accepts.
    pub fn filtered<'a, P>(&'a self, keep: P) -> Pretty<'a, P>
    where
        P: Fn(&str) -> bool,
    {
        Pretty { fields: self, keep }
    }

    #[cfg(test)]
    pub(crate) fn ptr_eq(&self, other: &Fields) -> bool {
        Arc::ptr_eq(&self.map, &other.map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Fields {
            map: Arc::new(
                iter.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Fields {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let map = Arc::make_mut(&mut self.map);
        for (k, v) in iter {
            map.insert(k.into(), v.into());
        }
    }
}

impl Debug for Fields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.map.iter()).finish()
    }
}

/// Renders as space-separated `key=repr(value)` pairs.
impl Display for Fields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.filtered(|_| true), f)
    }
}

/// A `key=repr(value)` view over a subset of [`Fields`].
///
/// Produced by [`Fields::filtered`]; formatting never mutates the underlying fields.
pub struct Pretty<'a, P> {
    fields: &'a Fields,
    keep: P,
}

impl<P: Fn(&str) -> bool> Display for Pretty<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (key, value) in self.fields.iter().filter(|(k, _)| (self.keep)(k)) {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{}={}", key, value.repr())?;
        }
        Ok(())
    }
}

/*
Boilerplate notes for Fields.

- Clone is cheap (Arc) and is how readers get a "snapshot".
- PartialEq compares contents, not identity.  Eq is not possible because of f64.
- Hash is omitted for the same reason.
- Default is the empty context.
- Display is the key=repr rendering that formatters print for leftover fields.
- No Deref to BTreeMap; mutation must go through copy-on-write.
*/
