//! Loose data → typed [`Structure`] tree.
//!
//! One pass per level: every value is converted as soon as it is read, and the
//! level's Map/FixedList decision is the OR over "key is not an integer" for
//! all of its keys. The traversal runs on an explicit frame stack, so nesting
//! depth costs heap, not native stack.
use serde::Deserialize;
use tracing::debug;

use crate::error::BuildError;
use crate::loose::{Entries, Key, Loose, Shape};
use crate::structure::{FixedList, Map, Structure};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildOptions {
    /// Deepest container nesting accepted; the top-level container is depth 1.
    pub max_depth: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct StructureBuilder {
    options: BuildOptions,
}

/// One container level in progress.
struct Frame {
    entries: Entries,
    is_map: bool,
    converted: Vec<(Key, Structure)>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Frame {
    fn new(entries: Entries) -> Self {
        Self { entries, is_map: false, converted: Vec::new() }
    }

    fn finish(self) -> Structure {
        if self.is_map {
            Structure::Map(Map::from_ordered_pairs(self.converted))
        } else {
            Structure::FixedList(FixedList::from_ordered_values(
                self.converted.into_iter().map(|(_, v)| v),
            ))
        }
    }
}

impl StructureBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build a structure from an iterable value. Fails if `data` itself is
    /// neither a native collection nor an ordered pair source.
    pub fn build(&self, data: Loose) -> Result<Structure, BuildError> {
        let _span = tracing::debug_span!("build").entered();
        match data.into_shape() {
            Shape::IndexableCollection(entries) | Shape::OrderedPairSource(entries) => {
                self.build_entries(entries)
            }
            Shape::Unsupported(leaf) => {
                let err = BuildError::with_type_info(&Loose::Leaf(leaf));
                debug!(error = %err, "rejected top-level value");
                Err(err)
            }
        }
    }

    /// Like [`Self::build`], but a non-iterable value comes back unchanged as
    /// [`Structure::Leaf`].
    pub fn convert(&self, data: Loose) -> Result<Structure, BuildError> {
        match data.into_shape() {
            Shape::Unsupported(leaf) => Ok(Structure::Leaf(leaf)),
            Shape::IndexableCollection(entries) | Shape::OrderedPairSource(entries) => {
                let _span = tracing::debug_span!("build").entered();
                self.build_entries(entries)
            }
        }
    }

    fn check_depth(&self, depth: usize) -> Result<(), BuildError> {
        match self.options.max_depth {
            Some(limit) if depth > limit => {
                debug!(depth, limit, "nesting depth limit hit");
                Err(BuildError::DepthLimitExceeded { limit })
            }
            _ => Ok(()),
        }
    }

    fn build_entries(&self, root: Entries) -> Result<Structure, BuildError> {
        self.check_depth(1)?;
        // Suspended ancestors, each paired with the key its pending child
        // will be stored under.
        let mut stack: Vec<(Frame, Key)> = Vec::new();
        let mut current = Frame::new(root);
        let mut nodes = 0usize;
        let mut max_depth = 1usize;

        loop {
            match current.entries.next() {
                Some((key, value)) => {
                    current.is_map |= !key.is_int();
                    match value.into_shape() {
                        Shape::Unsupported(leaf) => {
                            nodes += 1;
                            current.converted.push((key, Structure::Leaf(leaf)));
                        }
                        Shape::IndexableCollection(entries) | Shape::OrderedPairSource(entries) => {
                            let depth = stack.len() + 2;
                            self.check_depth(depth)?;
                            max_depth = max_depth.max(depth);
                            let parent = std::mem::replace(&mut current, Frame::new(entries));
                            stack.push((parent, key));
                        }
                    }
                }
                None => {
                    nodes += 1;
                    let node = current.finish();
                    match stack.pop() {
                        Some((parent, key)) => {
                            current = parent;
                            current.converted.push((key, node));
                        }
                        None => {
                            debug!(nodes, max_depth, "structure built");
                            return Ok(node);
                        }
                    }
                }
            }
        }
    }
}

// ------------------------------- Front API -------------------------------- //

/// [`StructureBuilder::build`] with default options.
pub fn build(data: Loose) -> Result<Structure, BuildError> {
    StructureBuilder::default().build(data)
}

/// [`StructureBuilder::convert`] with default options.
pub fn convert(data: Loose) -> Result<Structure, BuildError> {
    StructureBuilder::default().convert(data)
}

// ------------------------------- Tests ------------------------------------ //
