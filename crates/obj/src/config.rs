//! Heap budgets.
//!
//! A budget is a hard ceiling on what a [`Heap`](crate::Heap) will hand out. Any
//! request that would cross it fails with
//! [`ObjError::AllocationError`](crate::ObjError::AllocationError), which is how
//! allocator exhaustion is surfaced (and exercised in tests) without actually
//! running the process out of memory.

/// Configuration of a [`Heap`](crate::Heap).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeapConfig {
    /// Maximum number of bytes that may be live at once. `None` for no limit.
    pub max_bytes: Option<usize>,

    /// Maximum number of allocations that may be live at once. `None` for no limit.
    pub max_allocations: Option<usize>,
}

impl HeapConfig {
    /// A configuration without any limits.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn with_max_allocations(mut self, max_allocations: usize) -> Self {
        self.max_allocations = Some(max_allocations);
        self
    }
}
