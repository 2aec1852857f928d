//! A growable, index-addressable sequence of slots.
//!
//! Every slot is either occupied or absent. An absent slot is left behind by
//! [`SlotVec::take`] and is still counted in [`SlotVec::len`]; it is distinct
//! from any value the slot could hold.

mod rejected;
mod slot_vec;

pub use rejected::Rejected;
pub use slot_vec::SlotVec;

/// Errors produced by container operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContainerError {
    /// `pos` does not address a slot of a container holding `len` slots.
    #[error("index {pos} out of range for container of size {len}")]
    IndexOutOfRange { pos: usize, len: usize },

    /// The backing storage could not grow to `requested` bytes.
    #[error("failed to allocate {requested} bytes of container storage")]
    AllocationError { requested: usize },
}

pub type ContainerResult<T> = Result<T, ContainerError>;
