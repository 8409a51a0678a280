//! Label interning.
//!
//! The automaton works on small integer labels instead of coefficients and
//! operator tensors. A [`LabelConverter`] hands out dense labels `0..K` in
//! first-seen order and keeps the reverse mapping as a plain slice, so a label
//! is also an array index.

use std::fmt;
use std::marker::PhantomData;

/// A dense integer label.
pub trait Label: Copy + Eq + std::hash::Hash + fmt::Debug {
    /// Build a label from its array position.
    fn from_index(index: usize) -> Self;

    /// The array position of the label.
    fn index(self) -> usize;
}

/// Label of an interned local operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpLabel(pub usize);

/// Label of an interned coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoefLabel(pub usize);

impl Label for OpLabel {
    fn from_index(index: usize) -> Self {
        OpLabel(index)
    }

    fn index(self) -> usize {
        self.0
    }
}

impl Label for CoefLabel {
    fn from_index(index: usize) -> Self {
        CoefLabel(index)
    }

    fn index(self) -> usize {
        self.0
    }
}

/// Bidirectional value ↔ label mapping.
///
/// Values are compared with `PartialEq`, so floating-point coefficients and
/// tensors can be interned without hashing.
#[derive(Debug, Clone)]
pub struct LabelConverter<V, L> {
    objs: Vec<V>,
    _label: PhantomData<L>,
}

impl<V: PartialEq + Clone, L: Label> LabelConverter<V, L> {
    /// Create an empty converter.
    pub fn new() -> Self {
        Self {
            objs: Vec::new(),
            _label: PhantomData,
        }
    }

    /// Create a converter whose label 0 is `obj`.
    pub fn with_initial(obj: V) -> Self {
        Self {
            objs: vec![obj],
            _label: PhantomData,
        }
    }

    /// Label of `obj`, interning it if it was not seen before.
    pub fn convert(&mut self, obj: &V) -> L {
        match self.objs.iter().position(|o| o == obj) {
            Some(i) => L::from_index(i),
            None => {
                self.objs.push(obj.clone());
                L::from_index(self.objs.len() - 1)
            }
        }
    }

    /// Value behind `label`.
    pub fn get(&self, label: L) -> Option<&V> {
        self.objs.get(label.index())
    }

    /// Dense reverse mapping: element `i` is the value of label `i`.
    pub fn label_obj_mapping(&self) -> &[V] {
        &self.objs
    }

    /// Number of interned values.
    pub fn len(&self) -> usize {
        self.objs.len()
    }

    /// Check if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }
}

impl<V: PartialEq + Clone, L: Label> Default for LabelConverter<V, L> {
    fn default() -> Self {
        Self::new()
    }
}
