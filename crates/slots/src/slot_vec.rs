use crate::{ContainerError, ContainerResult, Rejected};

/// An ordered sequence of optionally-occupied slots.
///
/// The container knows nothing about what it stores. Dropping it drops every
/// occupant in index order, then the backing storage.
pub struct SlotVec<T> {
    slots: Vec<Option<T>>,
}

impl<T> SlotVec<T> {
    /// Create an empty container with room for at least `capacity` slots.
    pub fn reserve(capacity: usize) -> ContainerResult<Self> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| ContainerError::AllocationError {
                requested: Self::byte_size(capacity),
            })?;
        Ok(SlotVec { slots })
    }

    /// Bytes of backing storage needed for `capacity` slots.
    pub fn byte_size(capacity: usize) -> usize {
        capacity.saturating_mul(std::mem::size_of::<Option<T>>())
    }

    /// Number of slots, absent ones included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// The capacity the next growth would settle on to fit `additional` more
    /// slots. Equals the current capacity when no growth is needed.
    ///
    /// Growth doubles the capacity, or jumps straight to the required size if
    /// doubling is not enough.
    pub fn capacity_for(&self, additional: usize) -> usize {
        let needed = self.slots.len().saturating_add(additional);
        let cap = self.slots.capacity();
        if needed <= cap {
            cap
        } else {
            cap.saturating_mul(2).max(needed)
        }
    }

    /// Grow the backing storage to hold at least `capacity` slots.
    pub fn grow_to(&mut self, capacity: usize) -> ContainerResult<()> {
        if capacity <= self.slots.capacity() {
            return Ok(());
        }
        self.slots
            .try_reserve_exact(capacity - self.slots.len())
            .map_err(|_| ContainerError::AllocationError {
                requested: Self::byte_size(capacity),
            })
    }

    fn grow_for_one(&mut self) -> ContainerResult<()> {
        self.grow_to(self.capacity_for(1))
    }

    fn check_index(&self, pos: usize) -> ContainerResult<()> {
        if pos < self.slots.len() {
            Ok(())
        } else {
            Err(ContainerError::IndexOutOfRange {
                pos,
                len: self.slots.len(),
            })
        }
    }

    /// Read the slot at `pos`. `Ok(None)` means the slot is absent.
    pub fn at(&self, pos: usize) -> ContainerResult<Option<&T>> {
        self.check_index(pos)?;
        Ok(self.slots[pos].as_ref())
    }

    pub fn front(&self) -> ContainerResult<Option<&T>> {
        self.at(0)
    }

    pub fn back(&self) -> ContainerResult<Option<&T>> {
        match self.slots.len() {
            0 => Err(ContainerError::IndexOutOfRange { pos: 0, len: 0 }),
            len => self.at(len - 1),
        }
    }

    /// Insert `value` at `pos`, shifting every later slot up by one.
    /// `pos == len` appends.
    pub fn insert(&mut self, pos: usize, value: T) -> Result<(), Rejected<T>> {
        if pos > self.slots.len() {
            let len = self.slots.len();
            return Err(Rejected::new(
                ContainerError::IndexOutOfRange { pos, len },
                value,
            ));
        }
        if let Err(e) = self.grow_for_one() {
            return Err(Rejected::new(e, value));
        }
        self.slots.insert(pos, Some(value));
        Ok(())
    }

    /// Remove the slot at `pos`, shifting every later slot down by one.
    pub fn remove(&mut self, pos: usize) -> ContainerResult<Option<T>> {
        self.check_index(pos)?;
        Ok(self.slots.remove(pos))
    }

    /// Vacate the slot at `pos` without shifting. The slot stays, absent.
    pub fn take(&mut self, pos: usize) -> ContainerResult<Option<T>> {
        self.check_index(pos)?;
        Ok(self.slots[pos].take())
    }

    /// Occupy the slot at `pos` with `value`, returning the previous occupant.
    pub fn replace(&mut self, pos: usize, value: T) -> Result<Option<T>, Rejected<T>> {
        if let Err(e) = self.check_index(pos) {
            return Err(Rejected::new(e, value));
        }
        Ok(self.slots[pos].replace(value))
    }

    pub fn push_back(&mut self, value: T) -> Result<(), Rejected<T>> {
        if let Err(e) = self.grow_for_one() {
            return Err(Rejected::new(e, value));
        }
        self.slots.push(Some(value));
        Ok(())
    }

    /// Remove the last slot. Fails on an empty container.
    pub fn pop_back(&mut self) -> ContainerResult<Option<T>> {
        match self.slots.pop() {
            Some(slot) => Ok(slot),
            None => Err(ContainerError::IndexOutOfRange { pos: 0, len: 0 }),
        }
    }

    /// Iterate over every slot in index order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&T>> + '_ {
        self.slots.iter().map(Option::as_ref)
    }

    /// Iterate over occupied slots in index order, skipping absent ones.
    pub fn present(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.iter().flatten()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for SlotVec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.slots.iter()).finish()
    }
}
