//! Cache node payloads and pinned handles.
//!
//! A [`GlyphNode`] is the variant-specific part of a cache node: one glyph
//! image for the image cache, a batch of small bitmaps for the sbit cache.
//! The cache wraps each payload in a reference-counted [`CacheNode`] so that
//! callers can hold a [`Pinned`] handle that keeps the node out of eviction
//! sweeps and keeps the data alive even after the node leaves the cache.

use std::cell::Cell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::error::CacheError;
use crate::face::FaceManager;
use crate::family::Family;

/// Variant-specific behaviour of a cache node.
pub trait GlyphNode: Sized {
    /// What a lookup hands back for one glyph index.
    type Item: ?Sized;

    /// Combines the family hash with `gindex`. Every glyph index a single
    /// node covers must produce the same value.
    fn bucket_hash(family_hash: u64, gindex: u32) -> u64;

    /// Loads the node that covers `gindex` for `family`.
    fn load<M: FaceManager>(family: &Family, manager: &mut M, gindex: u32) -> Result<Self, CacheError>;

    /// First glyph index covered by the node.
    fn start_index(&self) -> u32;

    fn contains(&self, gindex: u32) -> bool;

    /// Approximate heap and inline footprint, charged against the byte
    /// budget.
    fn weight(&self) -> usize;

    /// Data for `gindex`. Only called with indices for which
    /// [`contains`](Self::contains) holds.
    fn item(&self, gindex: u32) -> &Self::Item;
}

/// A payload plus the number of outstanding [`Pinned`] handles.
pub struct CacheNode<N> {
    ref_count: Cell<u32>,
    payload: N,
}

impl<N> CacheNode<N> {
    pub(crate) fn new(payload: N) -> Self {
        Self {
            ref_count: Cell::new(0),
            payload,
        }
    }

    pub fn payload(&self) -> &N {
        &self.payload
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count.get()
    }

    pub fn is_pinned(&self) -> bool {
        self.ref_count.get() > 0
    }
}

impl<N: fmt::Debug> fmt::Debug for CacheNode<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheNode")
            .field("ref_count", &self.ref_count.get())
            .field("payload", &self.payload)
            .finish()
    }
}

/// Handle to one glyph of a cache node.
///
/// While any handle to a node exists the node is skipped by eviction. The
/// handle dereferences to the glyph data and stays valid after the node is
/// evicted or invalidated; dropping the last handle releases the data.
pub struct Pinned<N: GlyphNode> {
    node: Rc<CacheNode<N>>,
    gindex: u32,
}

impl<N: GlyphNode> Pinned<N> {
    pub(crate) fn new(node: &Rc<CacheNode<N>>, gindex: u32) -> Self {
        debug_assert!(node.payload.contains(gindex));
        node.ref_count.set(node.ref_count.get() + 1);
        Self {
            node: Rc::clone(node),
            gindex,
        }
    }

    pub fn gindex(&self) -> u32 {
        self.gindex
    }

    /// The whole node the glyph belongs to.
    pub fn node(&self) -> &N {
        &self.node.payload
    }

    /// Outstanding handles on the node, this one included.
    pub fn ref_count(&self) -> u32 {
        self.node.ref_count.get()
    }

    /// Returns `true` if both handles pin the same cache node.
    pub fn same_node(&self, other: &Pinned<N>) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl<N: GlyphNode> Clone for Pinned<N> {
    fn clone(&self) -> Self {
        Pinned::new(&self.node, self.gindex)
    }
}

impl<N: GlyphNode> Drop for Pinned<N> {
    fn drop(&mut self) {
        let count = self.node.ref_count.get();
        debug_assert!(count > 0, "pinned handle outlived its reference");
        self.node.ref_count.set(count.saturating_sub(1));
    }
}

impl<N: GlyphNode> Deref for Pinned<N> {
    type Target = N::Item;

    fn deref(&self) -> &N::Item {
        self.node.payload.item(self.gindex)
    }
}

impl<N: GlyphNode> fmt::Debug for Pinned<N>
where
    N::Item: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pinned")
            .field("gindex", &self.gindex)
            .field("ref_count", &self.ref_count())
            .field("item", &&**self)
            .finish()
    }
}
