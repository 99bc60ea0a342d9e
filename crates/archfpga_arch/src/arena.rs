//! Append-only registries behind [`ModelLibrary`](crate::ModelLibrary) and
//! [`PbTypeArena`](crate::PbTypeArena).
//!
//! A model, pb_type or mode is never removed once registered, so its ID is
//! valid for the life of the architecture. Parent links (mode to pb_type,
//! pb_type to mode) are stored as these IDs rather than references.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// An ID that addresses one registry slot.
pub trait ArenaId: Copy {
    /// Wraps a slot index.
    fn from_raw(index: u32) -> Self;

    /// The slot index.
    fn as_raw(self) -> u32;
}

/// Registry slots addressed by `I`, in registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arena<I: ArenaId, T> {
    items: Vec<T>,
    #[serde(skip)]
    _marker: PhantomData<I>,
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// The ID the next registration receives. Builders stamp it into the
    /// entry before calling [`alloc`](Self::alloc).
    pub fn next_id(&self) -> I {
        I::from_raw(self.items.len() as u32)
    }

    /// Registers `item` and returns its ID.
    pub fn alloc(&mut self, item: T) -> I {
        let id = self.next_id();
        self.items.push(item);
        id
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entries in registration order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// IDs in registration order.
    pub fn ids(&self) -> impl Iterator<Item = I> {
        (0..self.items.len() as u32).map(I::from_raw)
    }
}

impl<I: ArenaId, T> Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        &self.items[id.as_raw() as usize]
    }
}

impl<I: ArenaId, T> IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        &mut self.items[id.as_raw() as usize]
    }
}
