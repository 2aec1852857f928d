use std::cell::{Ref, RefCell, RefMut};

use objkit_slots::SlotVec;

use super::{Obj, ObjData};
use crate::error::{ObjError, ObjResult, Rejected};
use crate::rc::alloc::{AllocKind, Allocation, Heap};

/// The payload of a vector object: a growable sequence of object slots.
///
/// Elements are owned by the vector. Inserting an object moves that owner into
/// the vector; removing, taking or popping moves it back out to the caller.
/// A slot vacated by [`ObjVec::take`] stays in place, absent, until it is
/// removed or replaced.
pub struct ObjVec {
    slots: RefCell<SlotVec<Obj>>,
    /// Registration of the slot storage. Replaced whenever the storage grows.
    storage: RefCell<Allocation>,
}

impl ObjVec {
    pub(super) fn reserve(heap: &Heap, capacity: usize) -> ObjResult<ObjVec> {
        let storage = heap.alloc(AllocKind::Container, SlotVec::<Obj>::byte_size(capacity))?;
        let slots = SlotVec::reserve(capacity)?;
        Ok(ObjVec {
            slots: RefCell::new(slots),
            storage: RefCell::new(storage),
        })
    }

    /// Number of slots, absent ones included.
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.slots.borrow().capacity()
    }

    /// The element at `pos`, as a new owner. `Ok(None)` means the slot is
    /// absent.
    pub fn at(&self, pos: usize) -> ObjResult<Option<Obj>> {
        Ok(self.slots()?.at(pos)?.map(Obj::acquire))
    }

    pub fn front(&self) -> ObjResult<Option<Obj>> {
        Ok(self.slots()?.front()?.map(Obj::acquire))
    }

    pub fn back(&self) -> ObjResult<Option<Obj>> {
        Ok(self.slots()?.back()?.map(Obj::acquire))
    }

    /// Insert `obj` at `pos`, shifting later elements up. `pos == len` appends.
    pub fn insert(&self, pos: usize, obj: Obj) -> Result<(), Rejected<Obj>> {
        let len = self.len();
        if pos > len {
            return Err(Rejected::new(ObjError::IndexOutOfRange { pos, len }, obj));
        }
        let mut slots = match self.prepare(&obj, 1) {
            Ok(slots) => slots,
            Err(e) => return Err(Rejected::new(e, obj)),
        };
        slots.insert(pos, obj).map_err(|r| r.map_err(ObjError::from))
    }

    /// Remove the slot at `pos`, shifting later elements down.
    pub fn remove(&self, pos: usize) -> ObjResult<Option<Obj>> {
        Ok(self.slots_mut()?.remove(pos)?)
    }

    /// Move the element at `pos` out, leaving the slot absent.
    pub fn take(&self, pos: usize) -> ObjResult<Option<Obj>> {
        Ok(self.slots_mut()?.take(pos)?)
    }

    /// Put `obj` into the slot at `pos`, returning the previous occupant.
    pub fn replace(&self, pos: usize, obj: Obj) -> Result<Option<Obj>, Rejected<Obj>> {
        let mut slots = match self.prepare(&obj, 0) {
            Ok(slots) => slots,
            Err(e) => return Err(Rejected::new(e, obj)),
        };
        slots.replace(pos, obj).map_err(|r| r.map_err(ObjError::from))
    }

    pub fn push_back(&self, obj: Obj) -> Result<(), Rejected<Obj>> {
        let mut slots = match self.prepare(&obj, 1) {
            Ok(slots) => slots,
            Err(e) => return Err(Rejected::new(e, obj)),
        };
        slots.push_back(obj).map_err(|r| r.map_err(ObjError::from))
    }

    /// Remove the last slot. Fails on an empty vector.
    pub fn pop_back(&self) -> ObjResult<Option<Obj>> {
        Ok(self.slots_mut()?.pop_back()?)
    }

    /// Borrow the slots for a read-only walk.
    ///
    /// Fails with `InvalidArgument` while the vector is being modified.
    pub fn slots(&self) -> ObjResult<Ref<'_, SlotVec<Obj>>> {
        self.slots
            .try_borrow()
            .map_err(|_| ObjError::InvalidArgument("vector is being modified"))
    }

    fn slots_mut(&self) -> ObjResult<RefMut<'_, SlotVec<Obj>>> {
        self.slots
            .try_borrow_mut()
            .map_err(|_| ObjError::InvalidArgument("vector is borrowed by a reader"))
    }

    /// Check that `obj` may be stored here and make room for `additional`
    /// more slots, registering the grown storage on the heap before growing.
    fn prepare(&self, obj: &Obj, additional: usize) -> ObjResult<RefMut<'_, SlotVec<Obj>>> {
        self.check_acyclic(obj)?;
        let mut slots = self.slots_mut()?;
        let new_cap = slots.capacity_for(additional);
        if new_cap == slots.capacity() {
            return Ok(slots);
        }

        let mut storage = self.storage.borrow_mut();
        let grown = storage
            .heap()
            .alloc(AllocKind::Container, SlotVec::<Obj>::byte_size(new_cap))?;
        slots.grow_to(new_cap)?;
        // The old storage has been moved into the new one; drop its registration.
        *storage = grown;
        Ok(slots)
    }

    /// Refuse `obj` if this vector is reachable from it, since storing it would
    /// make the vector own itself.
    fn check_acyclic(&self, obj: &Obj) -> ObjResult<()> {
        if self.is_reachable_from(obj) {
            Err(ObjError::InvalidArgument(
                "inserting the object would create a reference cycle",
            ))
        } else {
            Ok(())
        }
    }

    fn is_reachable_from(&self, obj: &Obj) -> bool {
        match obj.data() {
            ObjData::Int(_) | ObjData::Float(_) | ObjData::String(_) => false,
            ObjData::Tuple(t) => self.is_reachable_from(t.x()) || self.is_reachable_from(t.y()),
            ObjData::Vector(v) => {
                std::ptr::eq(v, self)
                    || v.slots
                        .borrow()
                        .present()
                        .any(|e| self.is_reachable_from(e))
            }
        }
    }
}
