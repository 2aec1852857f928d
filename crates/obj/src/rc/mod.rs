pub mod alloc;

use std::cell::Cell;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;

/// A reference-counted pointer.
///
/// Cloning a `Shared` is the only way to get a second owner of the pointee, and
/// dropping the last owner is the only way the pointee gets freed. The count lives
/// in a [`SharedHeader`] placed right before the value.
///
/// The count is not atomic, so `Shared` is neither `Send` nor `Sync`.
#[repr(transparent)]
pub struct Shared<T>(NonNull<SharedBox<T>>, PhantomData<SharedBox<T>>);

/// The heap allocated part of a [`Shared`].
#[repr(C)]
pub struct SharedBox<T> {
    header: SharedHeader,
    val: T,
}

struct SharedHeader {
    rc: Cell<usize>,
}

impl SharedHeader {
    /// Increase reference count.
    fn inc_rc(&self) {
        let rc = self.rc.get();
        // Overflowing the count would lead to a use-after-free later on.
        if rc == usize::MAX {
            std::process::abort();
        }
        self.rc.set(rc + 1);
    }

    /// Decrease reference count. If reference count is zero after decrement,
    /// return `true`.
    fn dec_rc(&self) -> bool {
        let rc = self.rc.get();
        debug_assert!(rc > 0, "reference count was decreased below 0");
        self.rc.set(rc - 1);
        rc == 1
    }
}

/// Outcome of releasing one owner of a [`Shared`] pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// That was the last owner; the value has been dropped and its memory freed.
    Freed,
    /// Other owners remain. Contains the remaining count.
    Shared(usize),
}

impl<T> Shared<T> {
    pub fn new(val: T) -> Self {
        let boxed = Box::new(SharedBox {
            header: SharedHeader { rc: Cell::new(1) },
            val,
        });
        Shared(NonNull::from(Box::leak(boxed)), PhantomData)
    }

    /// Size of the allocation backing one `Shared<T>`.
    pub const fn allocation_size() -> usize {
        std::mem::size_of::<SharedBox<T>>()
    }

    fn inner(&self) -> &SharedBox<T> {
        // The box stays alive for as long as any owner exists, and `self` is one.
        unsafe { self.0.as_ref() }
    }

    /// Number of owners currently holding this pointer.
    pub fn ref_count(this: &Self) -> usize {
        this.inner().header.rc.get()
    }

    /// Release this owner, freeing the value if it was the last one.
    pub fn release(this: Self) -> Release {
        let remaining = Self::ref_count(&this) - 1;
        drop(this);
        if remaining == 0 {
            Release::Freed
        } else {
            Release::Shared(remaining)
        }
    }

    /// Move the value out if `this` is its only owner.
    pub fn try_unwrap(this: Self) -> Result<T, Self> {
        if Self::ref_count(&this) != 1 {
            return Err(this);
        }
        let ptr = this.0;
        std::mem::forget(this);
        // We were the only owner, and `forget` keeps `Drop` from running, so the
        // box is reclaimed exactly once here.
        let boxed = unsafe { Box::from_raw(ptr.as_ptr()) };
        let SharedBox { val, .. } = *boxed;
        Ok(val)
    }

    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.0 == other.0
    }
}

impl<T> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner().val
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        self.inner().header.inc_rc();
        Shared(self.0, PhantomData)
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        if self.inner().header.dec_rc() {
            // Count reached zero: no other owner can observe the box anymore.
            unsafe { drop(Box::from_raw(self.0.as_ptr())) }
        }
    }
}

// Assert layout
static_assertions::assert_eq_size!(Shared<u64>, *mut ());
static_assertions::assert_eq_size!(Option<Shared<u64>>, *mut ());
static_assertions::assert_not_impl_any!(Shared<u64>: Send, Sync);
