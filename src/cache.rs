//! Two-level glyph cache: families of rendering configurations, then nodes
//! keyed by glyph index.
//!
//! ## Architecture
//!
//! ```text
//!   GlyphCache<N>
//!   ├── families: MruList<Family>        query ──► family SlotId
//!   └── store: NodeStore<N>
//!       ├── buckets: Vec<Option<SlotId>>  hash & mask ──► chain via `link`
//!       └── nodes: IntrusiveList<NodeRecord<N>>
//!             head (MRU) ◄──► ... ◄──► tail (LRU, evicted first)
//! ```
//!
//! A lookup resolves the [`Query`] to a family (promoting it in the family
//! list), derives the bucket hash from the family hash and the glyph index,
//! and walks the bucket chain for a node of that family covering the index.
//! A hit moves the node to the head of the eviction list. A miss loads a new
//! node through the face manager, links it at the head, charges its weight,
//! and sweeps unpinned nodes off the tail until the cache is back under its
//! budget. The node that was just inserted is never swept.
//!
//! Every family always has at least one node: a family whose last node is
//! evicted is removed, and a family created by a lookup whose load failed is
//! dropped again before the error is returned.

use std::rc::Rc;

use log::{debug, trace, warn};
use rustc_hash::FxHashMap;

use crate::builder::CacheConfig;
use crate::ds::{IntrusiveList, MruList, MruNode, SlotId};
use crate::error::{CacheError, ConfigError, InvariantError};
use crate::face::{FaceId, FaceManager, ImageType, LoadFlags, Scaler};
use crate::family::{Family, Query};
use crate::metrics::{CacheCounters, CacheMetrics};
use crate::node::{CacheNode, GlyphNode, Pinned};

#[derive(Debug)]
struct NodeRecord<N> {
    family: SlotId,
    hash: u64,
    /// Next node in the same bucket.
    link: Option<SlotId>,
    weight: usize,
    node: Rc<CacheNode<N>>,
}

/// Node storage of a [`GlyphCache`]: bucket index, eviction order and byte
/// accounting.
///
/// Families reach the store through their teardown hook, which is why it is
/// a separate value rather than part of the cache itself.
#[derive(Debug)]
pub struct NodeStore<N> {
    nodes: IntrusiveList<NodeRecord<N>>,
    buckets: Vec<Option<SlotId>>,
    min_buckets: usize,
    weight: usize,
    max_weight: usize,
    max_nodes: usize,
    counters: CacheCounters,
}

impl<N: GlyphNode> NodeStore<N> {
    fn new(config: &CacheConfig) -> Self {
        Self {
            nodes: IntrusiveList::new(),
            buckets: vec![None; config.initial_buckets],
            min_buckets: config.initial_buckets,
            weight: 0,
            max_weight: config.max_weight,
            max_nodes: config.max_nodes,
            counters: CacheCounters::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Sum of the weights of all stored nodes.
    pub fn weight(&self) -> usize {
        self.weight
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn counters_mut(&mut self) -> &mut CacheCounters {
        &mut self.counters
    }

    /// Removes every node of `family`. Returns how many were dropped.
    pub(crate) fn purge_family(&mut self, family: SlotId) -> usize {
        let detached = self.detach_families(&[family]);
        self.release(&detached)
    }

    #[inline]
    fn bucket_index(&self, hash: u64) -> usize {
        (hash as usize) & (self.buckets.len() - 1)
    }

    fn node(&self, id: SlotId) -> Option<&Rc<CacheNode<N>>> {
        self.nodes.get(id).map(|record| &record.node)
    }

    fn find(&self, family: SlotId, hash: u64, gindex: u32) -> Option<SlotId> {
        let mut current = self.buckets[self.bucket_index(hash)];
        while let Some(id) = current {
            let record = self.nodes.get(id)?;
            if record.hash == hash && record.family == family && record.node.payload().contains(gindex) {
                return Some(id);
            }
            current = record.link;
        }
        None
    }

    fn touch(&mut self, id: SlotId) {
        self.nodes.move_to_front(id);
    }

    fn insert(&mut self, family: SlotId, hash: u64, payload: N) -> SlotId {
        let weight = payload.weight();
        let index = self.bucket_index(hash);
        let id = self.nodes.push_front(NodeRecord {
            family,
            hash,
            link: self.buckets[index],
            weight,
            node: Rc::new(CacheNode::new(payload)),
        });
        self.buckets[index] = Some(id);
        self.weight += weight;
        self.resize();
        id
    }

    /// Splices `id` out of its bucket chain. The node stays in the eviction
    /// list.
    fn unlink_bucket(&mut self, id: SlotId) -> bool {
        let Some((hash, link)) = self.nodes.get(id).map(|record| (record.hash, record.link)) else {
            return false;
        };
        let index = self.bucket_index(hash);
        if self.buckets[index] == Some(id) {
            self.buckets[index] = link;
            return true;
        }

        let mut current = self.buckets[index];
        while let Some(prev) = current {
            let next = self.nodes.get(prev).and_then(|record| record.link);
            if next == Some(id) {
                if let Some(record) = self.nodes.get_mut(prev) {
                    record.link = link;
                }
                return true;
            }
            current = next;
        }
        false
    }

    fn remove(&mut self, id: SlotId) -> Option<NodeRecord<N>> {
        self.unlink_bucket(id);
        let record = self.nodes.remove(id)?;
        self.weight -= record.weight;
        Some(record)
    }

    /// Unlinks every node of `families` from the buckets in one pass over
    /// the eviction list, so that no lookup can reach them, and returns their
    /// ids for [`release`](Self::release).
    fn detach_families(&mut self, families: &[SlotId]) -> Vec<SlotId> {
        let detached: Vec<SlotId> = self
            .nodes
            .iter_entries()
            .filter(|(_, record)| families.contains(&record.family))
            .map(|(id, _)| id)
            .collect();
        for &id in &detached {
            self.unlink_bucket(id);
        }
        detached
    }

    /// Drops detached nodes from the eviction list and the weight total.
    fn release(&mut self, detached: &[SlotId]) -> usize {
        let mut released = 0;
        for &id in detached {
            if let Some(record) = self.nodes.remove(id) {
                self.weight -= record.weight;
                released += 1;
                if record.node.is_pinned() {
                    trace!(
                        "released node at glyph {} with {} outstanding handles",
                        record.node.payload().start_index(),
                        record.node.ref_count()
                    );
                }
            }
        }
        if released > 0 {
            self.counters.add_invalidations(released);
            self.resize();
        }
        released
    }

    fn over_budget(&self) -> bool {
        self.weight > self.max_weight || (self.max_nodes > 0 && self.nodes.len() > self.max_nodes)
    }

    /// Sweeps unpinned nodes from the tail until the store fits its budget,
    /// never touching `keep`. Returns the family of every evicted node.
    fn compress(&mut self, keep: SlotId) -> Vec<SlotId> {
        let mut families = Vec::new();
        let mut cursor = self.nodes.back_id();
        while self.over_budget() {
            let Some(id) = cursor else {
                break;
            };
            cursor = self.nodes.prev_id(id);
            if id == keep || self.node(id).is_some_and(|node| node.is_pinned()) {
                continue;
            }
            if let Some(record) = self.remove(id) {
                trace!(
                    "evicted node at glyph {} ({} bytes)",
                    record.node.payload().start_index(),
                    record.weight
                );
                self.counters.inc_eviction();
                families.push(record.family);
            }
        }
        if self.over_budget() {
            debug!(
                "cache still over budget after sweep: {} bytes, {} nodes",
                self.weight,
                self.nodes.len()
            );
        }
        if !families.is_empty() {
            self.resize();
        }
        families
    }

    /// Doubles the table while chains average more than two nodes, halves it
    /// while they average less than half a node, never going below the
    /// initial size.
    fn resize(&mut self) {
        let count = self.nodes.len();
        let mut size = self.buckets.len();
        while count > size * 2 {
            size *= 2;
        }
        while size / 2 >= self.min_buckets && count < size / 2 {
            size /= 2;
        }
        if size != self.buckets.len() {
            self.rehash(size);
        }
    }

    fn rehash(&mut self, size: usize) {
        let mut buckets = Vec::new();
        if buckets.try_reserve_exact(size).is_err() {
            warn!("could not resize glyph cache buckets to {}", size);
            return;
        }
        buckets.resize(size, None);

        let mask = size - 1;
        let mut current = self.nodes.front_id();
        while let Some(id) = current {
            current = self.nodes.next_id(id);
            if let Some(record) = self.nodes.get_mut(id) {
                let index = (record.hash as usize) & mask;
                record.link = buckets[index];
                buckets[index] = Some(id);
            }
        }
        trace!("rehashed {} nodes into {} buckets", self.nodes.len(), size);
        self.buckets = buckets;
        self.counters.inc_resize();
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        self.nodes.check_invariants()?;

        if !self.buckets.len().is_power_of_two() || self.buckets.len() < self.min_buckets {
            return Err(InvariantError::new(format!(
                "store: invalid bucket count {}",
                self.buckets.len()
            )));
        }

        let mut chained = 0usize;
        for (index, head) in self.buckets.iter().enumerate() {
            let mut current = *head;
            while let Some(id) = current {
                let record = self.nodes.get(id).ok_or_else(|| {
                    InvariantError::new(format!("store: bucket {} links to stale node {:?}", index, id))
                })?;
                if self.bucket_index(record.hash) != index {
                    return Err(InvariantError::new(format!(
                        "store: node {:?} chained in bucket {} but hashes to {}",
                        id,
                        index,
                        self.bucket_index(record.hash)
                    )));
                }
                chained += 1;
                if chained > self.nodes.len() {
                    return Err(InvariantError::new("store: bucket chains form a cycle"));
                }
                current = record.link;
            }
        }
        if chained != self.nodes.len() {
            return Err(InvariantError::new(format!(
                "store: {} nodes chained but {} in eviction list",
                chained,
                self.nodes.len()
            )));
        }

        let mut weight = 0usize;
        for (id, record) in self.nodes.iter_entries() {
            if record.weight != record.node.payload().weight() {
                return Err(InvariantError::new(format!(
                    "store: node {:?} charged {} bytes but weighs {}",
                    id,
                    record.weight,
                    record.node.payload().weight()
                )));
            }
            weight += record.weight;
        }
        if weight != self.weight {
            return Err(InvariantError::new(format!(
                "store: weight total {} but nodes sum to {}",
                self.weight, weight
            )));
        }
        Ok(())
    }
}

/// Glyph cache generic over its node type.
///
/// See [`ImageCache`](crate::image::ImageCache) and
/// [`SBitCache`](crate::sbit::SBitCache) for the two concrete caches.
#[derive(Debug)]
pub struct GlyphCache<N> {
    families: MruList<Family>,
    store: NodeStore<N>,
    config: CacheConfig,
}

impl<N: GlyphNode> GlyphCache<N> {
    /// Creates an empty cache after validating `config`.
    pub fn new(config: CacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            families: MruList::new(config.max_families),
            store: NodeStore::new(&config),
            config,
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Number of cached nodes.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Total weight of the cached nodes in bytes.
    pub fn weight(&self) -> usize {
        self.store.weight()
    }

    pub fn max_weight(&self) -> usize {
        self.config.max_weight
    }

    pub fn max_nodes(&self) -> usize {
        self.config.max_nodes
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    pub fn bucket_count(&self) -> usize {
        self.store.bucket_count()
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.store.counters.snapshot()
    }

    pub fn reset_metrics(&mut self) {
        self.store.counters.reset();
    }

    /// Returns the data for glyph `gindex` rendered with `scaler` and
    /// `load_flags`, loading it through `manager` on a miss.
    ///
    /// The reference is valid until the next mutation of the cache. Use
    /// [`lookup_pinned`](Self::lookup_pinned) to keep the data across
    /// further lookups.
    pub fn lookup<M: FaceManager>(
        &mut self,
        manager: &mut M,
        scaler: &Scaler,
        load_flags: LoadFlags,
        gindex: u32,
    ) -> Result<&N::Item, CacheError> {
        let id = self.lookup_node(manager, Query::new(*scaler, load_flags), gindex)?;
        Ok(self.resolved(id)?.payload().item(gindex))
    }

    /// Like [`lookup`](Self::lookup), but returns a handle that pins the node
    /// until it is dropped.
    pub fn lookup_pinned<M: FaceManager>(
        &mut self,
        manager: &mut M,
        scaler: &Scaler,
        load_flags: LoadFlags,
        gindex: u32,
    ) -> Result<Pinned<N>, CacheError> {
        let id = self.lookup_node(manager, Query::new(*scaler, load_flags), gindex)?;
        Ok(Pinned::new(self.resolved(id)?, gindex))
    }

    /// [`lookup`](Self::lookup) with a pixel-sized [`ImageType`].
    pub fn lookup_type<M: FaceManager>(
        &mut self,
        manager: &mut M,
        image_type: &ImageType,
        gindex: u32,
    ) -> Result<&N::Item, CacheError> {
        self.lookup(manager, &image_type.scaler(), image_type.flags, gindex)
    }

    pub fn lookup_type_pinned<M: FaceManager>(
        &mut self,
        manager: &mut M,
        image_type: &ImageType,
        gindex: u32,
    ) -> Result<Pinned<N>, CacheError> {
        self.lookup_pinned(manager, &image_type.scaler(), image_type.flags, gindex)
    }

    /// Returns `true` if glyph `gindex` is cached for the query, without
    /// touching recency or loading anything.
    pub fn contains(&self, scaler: &Scaler, load_flags: LoadFlags, gindex: u32) -> bool {
        let query = Query::new(*scaler, load_flags);
        self.families
            .iter()
            .find(|(_, family)| family.compare(&query))
            .is_some_and(|(id, family)| {
                self.store
                    .find(id, N::bucket_hash(family.hash_code(), gindex), gindex)
                    .is_some()
            })
    }

    /// Iterates cached nodes from most to least recently used, with the
    /// query each was loaded for.
    pub fn nodes(&self) -> impl Iterator<Item = (&Query, &N)> + '_ {
        self.store.nodes.iter_entries().filter_map(move |(_, record)| {
            let family = self.families.get(record.family)?;
            Some((family.query(), record.node.payload()))
        })
    }

    /// Drops every family and node belonging to `face_id`.
    ///
    /// Must be called before the face manager releases the face. Nodes that
    /// are still pinned leave the cache as well; their handles keep the data
    /// alive. Returns the number of nodes removed.
    pub fn remove_face_id(&mut self, face_id: FaceId) -> usize {
        let doomed: Vec<SlotId> = self
            .families
            .iter()
            .filter(|(_, family)| family.face_id() == face_id)
            .map(|(id, _)| id)
            .collect();
        if doomed.is_empty() {
            return 0;
        }

        let detached = self.store.detach_families(&doomed);
        let purged = self.store.release(&detached);
        for &id in &doomed {
            if let Some(family) = self.families.get_mut(id) {
                family.forget_nodes();
            }
        }
        let families = self
            .families
            .remove_selection(|family| family.face_id() == face_id, &mut self.store);

        debug!(
            "removed face {}: {} families, {} nodes",
            face_id, families, purged
        );
        purged
    }

    /// Drops every family and node.
    pub fn clear(&mut self) {
        self.families.reset(&mut self.store);
        debug_assert!(self.store.is_empty());
        debug_assert_eq!(self.store.weight(), 0);
    }

    /// Validates the bucket index, the eviction list, the weight total and
    /// the family reference counts against each other.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.families.check_invariants()?;
        self.store.check_invariants()?;

        let mut per_family: FxHashMap<SlotId, usize> = FxHashMap::default();
        for (id, record) in self.store.nodes.iter_entries() {
            let family = self.families.get(record.family).ok_or_else(|| {
                InvariantError::new(format!("cache: node {:?} refers to a removed family", id))
            })?;
            let expected = N::bucket_hash(family.hash_code(), record.node.payload().start_index());
            if record.hash != expected {
                return Err(InvariantError::new(format!(
                    "cache: node {:?} stored with hash {:#x}, expected {:#x}",
                    id, record.hash, expected
                )));
            }
            *per_family.entry(record.family).or_default() += 1;
        }

        for (id, family) in self.families.iter() {
            let counted = per_family.get(&id).copied().unwrap_or(0);
            if counted != family.num_nodes() {
                return Err(InvariantError::new(format!(
                    "cache: family {:?} counts {} nodes but owns {}",
                    id,
                    family.num_nodes(),
                    counted
                )));
            }
            if counted == 0 {
                return Err(InvariantError::new(format!(
                    "cache: family {:?} has no nodes",
                    id
                )));
            }
        }
        Ok(())
    }

    fn resolved(&self, id: SlotId) -> Result<&Rc<CacheNode<N>>, CacheError> {
        self.store
            .node(id)
            .ok_or(CacheError::InvalidArgument("cache node was dropped during lookup"))
    }

    fn lookup_node<M: FaceManager>(
        &mut self,
        manager: &mut M,
        query: Query,
        gindex: u32,
    ) -> Result<SlotId, CacheError> {
        query.scaler.validate()?;
        self.store.counters.inc_lookup();

        let family_id = self.families.lookup(&query, &mut self.store)?;
        let family_hash = self
            .families
            .get(family_id)
            .map(Family::hash_code)
            .ok_or(CacheError::InvalidArgument("family was dropped during lookup"))?;
        let hash = N::bucket_hash(family_hash, gindex);

        if let Some(id) = self.store.find(family_id, hash, gindex) {
            self.store.touch(id);
            self.store.counters.inc_hit();
            trace!("hit glyph {} for face {}", gindex, query.scaler.face_id);
            return Ok(id);
        }

        self.store.counters.inc_miss();
        self.new_node(manager, family_id, hash, gindex)
    }

    fn new_node<M: FaceManager>(
        &mut self,
        manager: &mut M,
        family_id: SlotId,
        hash: u64,
        gindex: u32,
    ) -> Result<SlotId, CacheError> {
        let Some(family) = self.families.get(family_id) else {
            return Err(CacheError::InvalidArgument("family was dropped during lookup"));
        };
        let orphan = family.num_nodes() == 0;
        let face_id = family.face_id();

        let payload = match N::load(family, manager, gindex) {
            Ok(payload) => payload,
            Err(err) => {
                self.store.counters.inc_load_failure();
                debug!("loading glyph {} for face {} failed: {}", gindex, face_id, err);
                if orphan {
                    self.families.remove(family_id, &mut self.store);
                }
                return Err(err);
            },
        };

        let id = self.store.insert(family_id, hash, payload);
        self.store.counters.inc_load();
        if let Some(family) = self.families.get_mut(family_id) {
            family.attach_node();
        }
        trace!("loaded glyph {} for face {}", gindex, face_id);

        for evicted in self.store.compress(id) {
            self.release_family_ref(evicted);
        }
        Ok(id)
    }

    fn release_family_ref(&mut self, family_id: SlotId) {
        let remaining = self.families.get_mut(family_id).map(Family::detach_node);
        if remaining == Some(0) {
            self.families.remove(family_id, &mut self.store);
        }
    }
}

impl<N: GlyphNode> Default for GlyphCache<N> {
    fn default() -> Self {
        let config = CacheConfig::default();
        Self {
            families: MruList::new(config.max_families),
            store: NodeStore::new(&config),
            config,
        }
    }
}
