//! Typed, immutable output tree.
//!
//! No mutable access is exposed; nodes are only ever created through
//! [`Map::from_ordered_pairs`] and [`FixedList::from_ordered_values`].
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::loose::{Key, Leaf, Loose};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Equality, drop and [`Structure::into_loose`] walk the tree with an explicit
/// stack, so nesting depth is bounded by heap rather than native stack.
#[derive(Clone, Debug)]
pub enum Structure {
    Leaf(Leaf),
    Map(Map),
    FixedList(FixedList),
}

/// Ordered mapping of mixed-type keys to structures. Equality is
/// order-sensitive.
#[derive(Clone, Debug, Default)]
pub struct Map {
    entries: IndexMap<Key, Structure>,
}

/// Ordered sequence of structures; original keys are gone.
#[derive(Clone, Debug, Default)]
pub struct FixedList {
    items: Box<[Structure]>,
}

/// Container being rebuilt by [`Structure::into_loose`].
enum Unwinding {
    Assoc(indexmap::map::IntoIter<Key, Structure>, IndexMap<Key, Loose>),
    List(std::vec::IntoIter<Structure>, Vec<Loose>),
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Map {
    /// Duplicate keys keep their first position and take the later value.
    pub fn from_ordered_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Key, Structure)>,
    {
        Self { entries: pairs.into_iter().collect() }
    }

    pub fn get(&self, key: &Key) -> Option<&Structure> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Structure)> {
        self.entries.iter()
    }
}

impl FixedList {
    pub fn from_ordered_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Structure>,
    {
        Self { items: values.into_iter().collect() }
    }

    pub fn get(&self, index: usize) -> Option<&Structure> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Structure> {
        self.items.iter()
    }
}

impl Structure {
    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Structure::Leaf(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Structure::Map(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_fixed_list(&self) -> Option<&FixedList> {
        match self {
            Structure::FixedList(x) => Some(x),
            _ => None,
        }
    }

    /// Total number of nodes, leaves included.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            match node {
                Structure::Leaf(_) => {}
                Structure::Map(m) => stack.extend(m.entries.values()),
                Structure::FixedList(l) => stack.extend(l.items.iter()),
            }
        }
        count
    }

    /// Extract the tree back into the loose shape it classifies as: maps
    /// become associative collections, fixed lists become plain lists.
    pub fn into_loose(self) -> Loose {
        let mut current = match self.unwind() {
            Ok(container) => container,
            Err(leaf) => return Loose::Leaf(leaf),
        };
        // Suspended ancestors, each with the key its pending child goes under.
        let mut stack: Vec<(Unwinding, Option<Key>)> = Vec::new();
        loop {
            let next = match &mut current {
                Unwinding::Assoc(entries, _) => entries.next().map(|(k, v)| (Some(k), v)),
                Unwinding::List(items, _) => items.next().map(|v| (None, v)),
            };
            match next {
                Some((key, child)) => match child.unwind() {
                    Err(leaf) => current.push(key, Loose::Leaf(leaf)),
                    Ok(container) => {
                        let parent = std::mem::replace(&mut current, container);
                        stack.push((parent, key));
                    }
                },
                None => {
                    let done = current.finish();
                    match stack.pop() {
                        Some((parent, key)) => {
                            current = parent;
                            current.push(key, done);
                        }
                        None => return done,
                    }
                }
            }
        }
    }

    /// Open a container for [`Self::into_loose`], or hand back the leaf.
    fn unwind(self) -> Result<Unwinding, Leaf> {
        match self {
            Structure::Leaf(leaf) => Err(leaf),
            Structure::Map(mut m) => {
                let entries = std::mem::take(&mut m.entries);
                let out = IndexMap::with_capacity(entries.len());
                Ok(Unwinding::Assoc(entries.into_iter(), out))
            }
            Structure::FixedList(mut l) => {
                let items = std::mem::take(&mut l.items).into_vec();
                let out = Vec::with_capacity(items.len());
                Ok(Unwinding::List(items.into_iter(), out))
            }
        }
    }
}

impl Unwinding {
    fn push(&mut self, key: Option<Key>, value: Loose) {
        match (self, key) {
            (Unwinding::Assoc(_, out), Some(key)) => {
                out.insert(key, value);
            }
            (Unwinding::List(_, out), _) => out.push(value),
            (Unwinding::Assoc(..), None) => unreachable!("assoc entries always carry a key"),
        }
    }

    fn finish(self) -> Loose {
        match self {
            Unwinding::Assoc(_, out) => Loose::Assoc(out),
            Unwinding::List(_, out) => Loose::List(out),
        }
    }
}

// ------------------------------- Equality --------------------------------- //

impl PartialEq for Structure {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];
        while let Some(pair) = stack.pop() {
            match pair {
                (Structure::Leaf(a), Structure::Leaf(b)) => {
                    if a != b {
                        return false;
                    }
                }
                (Structure::Map(a), Structure::Map(b)) => {
                    if a.len() != b.len() {
                        return false;
                    }
                    for ((ka, va), (kb, vb)) in a.entries.iter().zip(b.entries.iter()) {
                        if ka != kb {
                            return false;
                        }
                        stack.push((va, vb));
                    }
                }
                (Structure::FixedList(a), Structure::FixedList(b)) => {
                    if a.len() != b.len() {
                        return false;
                    }
                    stack.extend(a.items.iter().zip(b.items.iter()));
                }
                _ => return false,
            }
        }
        true
    }
}

impl Eq for Structure {}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.entries.iter().zip(other.entries.iter()).all(|((ka, va), (kb, vb))| ka == kb && va == vb)
    }
}

impl Eq for Map {}

impl PartialEq for FixedList {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.items.iter().zip(other.items.iter()).all(|(a, b)| a == b)
    }
}

impl Eq for FixedList {}

// --------------------------------- Drop ----------------------------------- //

/// Free a batch of nodes without recursing: every container is emptied onto
/// the work stack before it is dropped.
fn dismantle(mut stack: Vec<Structure>) {
    while let Some(node) = stack.pop() {
        match node {
            Structure::Leaf(_) => {}
            Structure::Map(mut m) => stack.extend(std::mem::take(&mut m.entries).into_values()),
            Structure::FixedList(mut l) => stack.extend(std::mem::take(&mut l.items).into_vec()),
        }
    }
}

impl Drop for Map {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            dismantle(std::mem::take(&mut self.entries).into_values().collect());
        }
    }
}

impl Drop for FixedList {
    fn drop(&mut self) {
        if !self.items.is_empty() {
            dismantle(std::mem::take(&mut self.items).into_vec());
        }
    }
}

// ------------------------------ Serialize -------------------------------- //

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Key::Int(i) => serializer.serialize_i64(*i),
            Key::Str(s) => serializer.serialize_str(s),
        }
    }
}

impl Serialize for Leaf {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Leaf::Null => serializer.serialize_unit(),
            Leaf::Bool(b) => serializer.serialize_bool(*b),
            Leaf::Int(i) => serializer.serialize_i64(*i),
            Leaf::Float(x) => serializer.serialize_f64(x.0),
            Leaf::Str(s) | Leaf::Opaque(s) => serializer.serialize_str(s),
        }
    }
}

impl Serialize for Map {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            out.serialize_entry(k, v)?;
        }
        out.end()
    }
}

impl Serialize for FixedList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_seq(Some(self.items.len()))?;
        for item in self.items.iter() {
            out.serialize_element(item)?;
        }
        out.end()
    }
}

impl Serialize for Structure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Structure::Leaf(x) => x.serialize(serializer),
            Structure::Map(x) => x.serialize(serializer),
            Structure::FixedList(x) => x.serialize(serializer),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(i: i64) -> Structure {
        Structure::Leaf(Leaf::Int(i))
    }

    #[test]
    fn map_preserves_mixed_keys_in_order() {
        let m = Map::from_ordered_pairs([
            (Key::from("b"), leaf(1)),
            (Key::Int(7), leaf(2)),
            (Key::from("a"), leaf(3)),
        ]);
        let keys: Vec<_> = m.keys().cloned().collect();
        assert_eq!(keys, vec![Key::from("b"), Key::Int(7), Key::from("a")]);
        assert_eq!(m.get(&Key::Int(7)), Some(&leaf(2)));
    }

    #[test]
    fn duplicate_keys_keep_first_position_last_value() {
        let m = Map::from_ordered_pairs([
            (Key::from("x"), leaf(1)),
            (Key::from("y"), leaf(2)),
            (Key::from("x"), leaf(3)),
        ]);
        assert_eq!(m.len(), 2);
        assert_eq!(m.keys().next(), Some(&Key::from("x")));
        assert_eq!(m.get(&Key::from("x")), Some(&leaf(3)));
    }

    #[test]
    fn map_equality_is_order_sensitive() {
        let ab = Map::from_ordered_pairs([(Key::from("a"), leaf(1)), (Key::from("b"), leaf(2))]);
        let ba = Map::from_ordered_pairs([(Key::from("b"), leaf(2)), (Key::from("a"), leaf(1))]);
        assert_ne!(ab, ba);
        assert_eq!(ab, ab.clone());
    }

    #[test]
    fn serializes_to_json_shapes() {
        let tree = Structure::FixedList(FixedList::from_ordered_values([
            Structure::Map(Map::from_ordered_pairs([
                (Key::Int(3), Structure::Leaf(Leaf::Str("x".into()))),
                (Key::from("k"), Structure::Leaf(Leaf::Null)),
            ])),
            Structure::Leaf(Leaf::Opaque("Handle".into())),
        ]));
        let v = serde_json::to_value(&tree).unwrap();
        assert_eq!(v, json!([{"3": "x", "k": null}, "Handle"]));
    }

    #[test]
    fn into_loose_keeps_keys_and_order() {
        let tree = Structure::FixedList(FixedList::from_ordered_values([
            Structure::Map(Map::from_ordered_pairs([
                (Key::from("b"), leaf(1)),
                (Key::Int(4), Structure::FixedList(FixedList::from_ordered_values([leaf(2)]))),
            ])),
            leaf(3),
        ]));
        let loose = tree.into_loose();
        let Loose::List(items) = &loose else { panic!("fixed list must unwind to a list") };
        assert_eq!(items.len(), 2);
        let Loose::Assoc(map) = &items[0] else { panic!("map must unwind to an assoc") };
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec![Key::from("b"), Key::Int(4)]);
        assert!(matches!(&map[&Key::Int(4)], Loose::List(inner) if inner.len() == 1));
        assert!(matches!(&items[1], Loose::Leaf(Leaf::Int(3))));
    }

    #[test]
    fn structure_equality_compares_shape_and_leaves() {
        let list = |xs: &[i64]| Structure::FixedList(FixedList::from_ordered_values(xs.iter().map(|&x| leaf(x))));
        assert_eq!(list(&[1, 2]), list(&[1, 2]));
        assert_ne!(list(&[1, 2]), list(&[1, 3]));
        assert_ne!(list(&[1]), list(&[1, 2]));
        let map = Structure::Map(Map::from_ordered_pairs([(Key::Int(0), leaf(1))]));
        assert_ne!(map, list(&[1]));
    }

    #[test]
    fn node_count_includes_leaves_and_containers() {
        let tree = Structure::FixedList(FixedList::from_ordered_values([
            leaf(1),
            Structure::Map(Map::from_ordered_pairs([(Key::from("a"), leaf(2))])),
        ]));
        assert_eq!(tree.node_count(), 4);
        assert_eq!(Structure::FixedList(FixedList::default()).node_count(), 1);
    }
}
