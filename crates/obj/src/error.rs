use objkit_slots::ContainerError;

/// Errors produced while building or editing objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ObjError {
    /// Absent, zero-sized or otherwise unusable input.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The heap could not provide `requested` bytes.
    #[error("failed to allocate {requested} bytes")]
    AllocationError { requested: usize },

    /// `pos` does not address a slot of a vector holding `len` slots.
    #[error("index {pos} out of range for vector of length {len}")]
    IndexOutOfRange { pos: usize, len: usize },
}

impl From<ContainerError> for ObjError {
    fn from(e: ContainerError) -> Self {
        match e {
            ContainerError::IndexOutOfRange { pos, len } => ObjError::IndexOutOfRange { pos, len },
            ContainerError::AllocationError { requested } => {
                ObjError::AllocationError { requested }
            }
        }
    }
}

impl<T> From<Rejected<T>> for ObjError {
    fn from(r: Rejected<T>) -> Self {
        *r.error()
    }
}

pub type ObjResult<T> = Result<T, ObjError>;

/// An [`ObjError`] that hands the caller's input back.
pub type Rejected<T> = objkit_slots::Rejected<T, ObjError>;
