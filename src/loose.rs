//! Loose input model.
//!
//! Everything the builder accepts is a [`Loose`] value. Scalars and handle-like
//! values live in [`Leaf`]; the iterable shapes are an indexable list, an
//! ordered associative collection, or a single-pass [`PairSource`].
use std::fmt;
use indexmap::IndexMap;
use ordered_float::OrderedFloat;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Entry key. Only `Int` counts toward the positional (FixedList) shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Int(i64),
    Str(String),
}

/// A value that is never iterated; passed through the builder unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Leaf {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
    /// Handle-like value with no structure, identified by its type name.
    Opaque(String),
}

#[derive(Debug)]
pub enum Loose {
    Leaf(Leaf),
    /// Native indexable collection; keys are the positions `0..n`.
    List(Vec<Loose>),
    /// Native associative collection in insertion order.
    Assoc(IndexMap<Key, Loose>),
    /// Anything yielding ordered `(key, value)` pairs on a single traversal.
    Pairs(PairSource),
}

/// Single-pass ordered `(Key, Loose)` source.
pub struct PairSource {
    label: String,
    iter: Box<dyn Iterator<Item = (Key, Loose)>>,
}

pub type Entries = Box<dyn Iterator<Item = (Key, Loose)>>;

/// Capability tag resolved once per value.
pub enum Shape {
    IndexableCollection(Entries),
    OrderedPairSource(Entries),
    Unsupported(Leaf),
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Key {
    pub fn is_int(&self) -> bool {
        matches!(self, Key::Int(_))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{i}"),
            Key::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl Leaf {
    /// Short type name used in diagnostics and outlines.
    pub fn type_name(&self) -> &str {
        match self {
            Leaf::Null => "null",
            Leaf::Bool(_) => "bool",
            Leaf::Int(_) => "integer",
            Leaf::Float(_) => "float",
            Leaf::Str(_) => "string",
            Leaf::Opaque(name) => name,
        }
    }

    /// Human-readable type and shape description, e.g. `string (len 5)`.
    pub fn describe(&self) -> String {
        match self {
            Leaf::Null => "null".to_string(),
            Leaf::Bool(b) => format!("bool ({b})"),
            Leaf::Int(i) => format!("integer ({i})"),
            Leaf::Float(x) => format!("float ({})", x.0),
            Leaf::Str(s) => format!("string (len {})", s.chars().count()),
            Leaf::Opaque(name) => format!("opaque value of type `{name}`"),
        }
    }
}

impl PairSource {
    pub fn new<I>(label: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (Key, Loose)>,
        I::IntoIter: 'static,
    {
        Self { label: label.into(), iter: Box::new(pairs.into_iter()) }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for PairSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairSource").field("label", &self.label).finish_non_exhaustive()
    }
}

impl Loose {
    pub fn null() -> Self {
        Loose::Leaf(Leaf::Null)
    }

    pub fn opaque(type_name: impl Into<String>) -> Self {
        Loose::Leaf(Leaf::Opaque(type_name.into()))
    }

    pub fn pairs<I>(label: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (Key, Loose)>,
        I::IntoIter: 'static,
    {
        Loose::Pairs(PairSource::new(label, pairs))
    }

    pub fn is_iterable(&self) -> bool {
        !matches!(self, Loose::Leaf(_))
    }

    /// Resolve the capability tag, adapting native collections into an
    /// ordered `(key, value)` sequence.
    pub fn into_shape(mut self) -> Shape {
        match &mut self {
            Loose::List(items) => Shape::IndexableCollection(Box::new(
                std::mem::take(items)
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (Key::Int(i as i64), v)),
            )),
            Loose::Assoc(map) => Shape::IndexableCollection(Box::new(std::mem::take(map).into_iter())),
            Loose::Pairs(source) => Shape::OrderedPairSource(std::mem::replace(
                &mut source.iter,
                Box::new(std::iter::empty::<(Key, Loose)>()),
            )),
            Loose::Leaf(leaf) => Shape::Unsupported(std::mem::replace(leaf, Leaf::Null)),
        }
    }

    /// Description of the value's type/shape for error reporting.
    pub fn describe(&self) -> String {
        match self {
            Loose::Leaf(leaf) => leaf.describe(),
            Loose::List(xs) => format!("list (len {})", xs.len()),
            Loose::Assoc(m) => format!("associative collection (len {})", m.len()),
            Loose::Pairs(source) => format!("pair source `{}`", source.label()),
        }
    }
}

/// Nested collections are freed from a heap work stack, not by recursion.
/// Values still inside a [`PairSource`] are left to its iterator.
impl Drop for Loose {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        take_children(self, &mut stack);
        while let Some(mut node) = stack.pop() {
            take_children(&mut node, &mut stack);
        }
    }
}

fn take_children(node: &mut Loose, out: &mut Vec<Loose>) {
    match node {
        Loose::List(items) => out.append(items),
        Loose::Assoc(map) => out.extend(std::mem::take(map).into_values()),
        Loose::Leaf(_) | Loose::Pairs(_) => {}
    }
}

// ------------------------------ Conversions ------------------------------ //

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<Leaf> for Loose {
    fn from(leaf: Leaf) -> Self {
        Loose::Leaf(leaf)
    }
}

impl From<bool> for Loose {
    fn from(b: bool) -> Self {
        Loose::Leaf(Leaf::Bool(b))
    }
}

impl From<i64> for Loose {
    fn from(i: i64) -> Self {
        Loose::Leaf(Leaf::Int(i))
    }
}

impl From<f64> for Loose {
    fn from(x: f64) -> Self {
        Loose::Leaf(Leaf::Float(OrderedFloat(x)))
    }
}

impl From<&str> for Loose {
    fn from(s: &str) -> Self {
        Loose::Leaf(Leaf::Str(s.to_string()))
    }
}

impl From<String> for Loose {
    fn from(s: String) -> Self {
        Loose::Leaf(Leaf::Str(s))
    }
}

impl<T: Into<Loose>> From<Vec<T>> for Loose {
    fn from(xs: Vec<T>) -> Self {
        Loose::List(xs.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<Key>, V: Into<Loose>> FromIterator<(K, V)> for Loose {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Loose::Assoc(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ------------------------------- Tests ------------------------------------ //
