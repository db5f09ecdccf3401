//! Rendering configurations shared by the nodes of a glyph cache.
//!
//! A [`Family`] groups every cached glyph that was produced with the same
//! [`Query`] (scaler plus load flags). Caches keep their families in an
//! [`MruList`](crate::ds::MruList) and store only the family's `SlotId` in
//! each node, so node comparison is a cheap id check.

use log::debug;

use crate::cache::NodeStore;
use crate::ds::{MruLifecycle, MruNode, SlotId};
use crate::error::CacheError;
use crate::face::{Face, FaceId, FaceManager, LoadFlags, Scaler};
use crate::glyph::{Glyph, GlyphSlot};
use crate::node::GlyphNode;

/// First-level lookup key: how glyphs are sized and loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query {
    pub scaler: Scaler,
    pub load_flags: LoadFlags,
}

impl Query {
    pub fn new(scaler: Scaler, load_flags: LoadFlags) -> Self {
        Self { scaler, load_flags }
    }

    /// Hash consistent with `==`; every node hash of the family is derived
    /// from it.
    pub fn hash_code(&self) -> u64 {
        self.scaler
            .hash_code()
            .wrapping_add(u64::from(self.load_flags.bits()).wrapping_mul(31))
    }
}

/// A query plus the number of cache nodes currently attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Family {
    query: Query,
    hash: u64,
    num_nodes: usize,
}

impl Family {
    pub fn new(query: Query) -> Self {
        Self {
            hash: query.hash_code(),
            query,
            num_nodes: 0,
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn face_id(&self) -> FaceId {
        self.query.scaler.face_id
    }

    pub fn hash_code(&self) -> u64 {
        self.hash
    }

    /// Nodes of the owning cache that reference this family.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub(crate) fn attach_node(&mut self) {
        self.num_nodes += 1;
    }

    /// Marks the family's nodes as already released by the cache.
    pub(crate) fn forget_nodes(&mut self) {
        self.num_nodes = 0;
    }

    /// Drops one node reference and returns how many remain.
    pub(crate) fn detach_node(&mut self) -> usize {
        debug_assert!(self.num_nodes > 0, "family node count underflow");
        self.num_nodes = self.num_nodes.saturating_sub(1);
        self.num_nodes
    }

    /// Number of addressable glyphs in the family's face.
    pub fn glyph_count<M: FaceManager>(&self, manager: &mut M) -> Result<u32, CacheError> {
        let face = manager.lookup_face(self.face_id())?;
        Ok(face.num_glyphs())
    }

    /// Resolves the family's face with its size selected.
    pub fn sized_face<'m, M: FaceManager>(
        &self,
        manager: &'m mut M,
    ) -> Result<&'m mut M::Face, CacheError> {
        manager.lookup_size(&self.query.scaler)
    }

    /// Loads glyph `gindex` with the family's flags and takes ownership of
    /// the result.
    pub fn load_glyph<M: FaceManager>(
        &self,
        manager: &mut M,
        gindex: u32,
    ) -> Result<Glyph, CacheError> {
        let face = self.sized_face(manager)?;
        let slot = face.load_glyph(gindex, self.query.load_flags)?;
        Glyph::try_from(slot)
    }

    /// Loads and renders glyph `gindex` on an already sized face.
    pub fn load_bitmap<F: Face>(&self, face: &mut F, gindex: u32) -> Result<GlyphSlot, CacheError> {
        face.load_glyph(gindex, self.query.load_flags | LoadFlags::RENDER)
    }
}

impl MruNode for Family {
    type Key = Query;

    fn compare(&self, key: &Query) -> bool {
        self.query == *key
    }
}

impl<N: GlyphNode> MruLifecycle<NodeStore<N>> for Family {
    fn init(key: &Query, store: &mut NodeStore<N>) -> Result<Self, CacheError> {
        store.counters_mut().inc_family_created();
        Ok(Family::new(*key))
    }

    fn done(&mut self, id: SlotId, store: &mut NodeStore<N>) {
        store.counters_mut().inc_family_removed();
        if self.num_nodes == 0 {
            return;
        }
        let purged = store.purge_family(id);
        debug!(
            "family for face {} dropped with {} cached nodes",
            self.face_id(),
            purged
        );
        self.num_nodes = 0;
    }
}
