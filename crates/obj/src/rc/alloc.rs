use std::cell::RefCell;
use std::rc::Rc;

use slotmap::HopSlotMap;

use crate::config::HeapConfig;
use crate::error::{ObjError, ObjResult};

slotmap::new_key_type! {pub struct AllocKey;}

/// What an allocation is backing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocKind {
    /// An object node, header and payload.
    Node,
    /// The byte buffer owned by a string object.
    StringBuffer,
    /// The slot storage owned by a vector object.
    Container,
}

/// Counters describing a [`Heap`]'s allocation history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Allocations ever granted.
    pub allocations: usize,
    /// Allocations ever released.
    pub releases: usize,
    pub live_allocations: usize,
    pub live_bytes: usize,
    /// Highest `live_bytes` ever observed.
    pub peak_bytes: usize,
}

#[derive(Debug)]
struct Entry {
    kind: AllocKind,
    size: usize,
}

#[derive(Debug)]
struct HeapInner {
    config: HeapConfig,
    /// Every allocation that has been granted and not yet released.
    ledger: RefCell<HopSlotMap<AllocKey, Entry>>,
    stats: RefCell<HeapStats>,
}

/// An accounting front for the global allocator.
///
/// Every object node, string buffer and container storage is registered here
/// before it is allocated, and deregistered when it is freed. The heap enforces
/// the budgets in its [`HeapConfig`] and keeps enough bookkeeping to prove that
/// every registration was released exactly once.
///
/// Cloning a `Heap` yields another handle to the same ledger. Objects keep the
/// ledger alive, so it is fine to drop the `Heap` before the objects it made.
#[derive(Debug, Clone)]
pub struct Heap {
    inner: Rc<HeapInner>,
}

impl Heap {
    /// Create a heap without any budget.
    pub fn new() -> Heap {
        Self::with_config(HeapConfig::default())
    }

    pub fn with_config(config: HeapConfig) -> Heap {
        Heap {
            inner: Rc::new(HeapInner {
                config,
                ledger: RefCell::new(HopSlotMap::with_key()),
                stats: RefCell::new(HeapStats::default()),
            }),
        }
    }

    pub fn stats(&self) -> HeapStats {
        *self.inner.stats.borrow()
    }

    /// Number of live allocations of the given kind.
    pub fn live(&self, kind: AllocKind) -> usize {
        self.inner
            .ledger
            .borrow()
            .values()
            .filter(|e| e.kind == kind)
            .count()
    }

    /// Register `size` bytes of `kind`.
    ///
    /// Fails without registering anything if the request would break a budget.
    pub(crate) fn alloc(&self, kind: AllocKind, size: usize) -> ObjResult<Allocation> {
        let config = &self.inner.config;
        let mut stats = self.inner.stats.borrow_mut();

        let over_bytes = config
            .max_bytes
            .map_or(false, |max| stats.live_bytes.saturating_add(size) > max);
        let over_count = config
            .max_allocations
            .map_or(false, |max| stats.live_allocations >= max);
        if over_bytes || over_count {
            tracing::debug!(
                ?kind,
                size,
                live_bytes = stats.live_bytes,
                live_allocations = stats.live_allocations,
                "allocation refused by heap budget"
            );
            return Err(ObjError::AllocationError { requested: size });
        }

        let key = self.inner.ledger.borrow_mut().insert(Entry { kind, size });
        stats.allocations += 1;
        stats.live_allocations += 1;
        stats.live_bytes += size;
        stats.peak_bytes = stats.peak_bytes.max(stats.live_bytes);
        tracing::trace!(?kind, size, ?key, "allocated");

        Ok(Allocation {
            heap: self.inner.clone(),
            key,
        })
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapInner {
    fn free(&self, key: AllocKey) {
        let entry = self.ledger.borrow_mut().remove(key);
        match entry {
            Some(entry) => {
                let mut stats = self.stats.borrow_mut();
                stats.releases += 1;
                stats.live_allocations -= 1;
                stats.live_bytes -= entry.size;
                tracing::trace!(kind = ?entry.kind, size = entry.size, ?key, "released");
            }
            None => debug_assert!(false, "allocation {:?} released twice", key),
        }
    }
}

/// Proof of a live registration on a [`Heap`].
///
/// Dropping it releases the registration. It is stored next to the memory it
/// accounts for, so both go away together.
pub struct Allocation {
    heap: Rc<HeapInner>,
    key: AllocKey,
}

impl Allocation {
    /// The heap this allocation was registered on.
    pub fn heap(&self) -> Heap {
        Heap {
            inner: self.heap.clone(),
        }
    }

    pub fn kind(&self) -> Option<AllocKind> {
        self.heap.ledger.borrow().get(self.key).map(|e| e.kind)
    }

    pub fn size(&self) -> usize {
        self.heap.ledger.borrow().get(self.key).map_or(0, |e| e.size)
    }
}

impl std::fmt::Debug for Allocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Allocation")
            .field("key", &self.key)
            .field("kind", &self.kind())
            .field("size", &self.size())
            .finish()
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        self.heap.free(self.key);
    }
}
