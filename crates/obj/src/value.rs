mod vector;
#[cfg(test)]
mod test;

use crate::error::{ObjError, ObjResult, Rejected};
use crate::rc::alloc::{AllocKind, Allocation, Heap};
use crate::rc::{Release, Shared};

pub use vector::ObjVec;

/// A handle to a dynamically-typed object.
///
/// Every object is a reference-counted node registered on the [`Heap`] that
/// created it. A handle is one owner of its node: [`Obj::acquire`] (or `clone`)
/// adds an owner, [`Obj::release`] (or dropping the handle) removes one, and the
/// node together with everything it owns is freed when the last owner goes.
pub struct Obj(Shared<ObjNode>);

pub(crate) struct ObjNode {
    data: ObjData,
    // Declared after `data` so that the payload is freed before the node.
    _alloc: Allocation,
}

/// The payload of an object.
pub enum ObjData {
    Int(i32),
    Float(f32),
    String(ObjStr),
    Tuple(Tuple),
    Vector(ObjVec),
}

/// The variant tag of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjType {
    Int,
    Float,
    String,
    Tuple,
    Vector,
}

impl std::fmt::Display for ObjType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ObjType::Int => "int",
            ObjType::Float => "float",
            ObjType::String => "string",
            ObjType::Tuple => "tuple",
            ObjType::Vector => "vector",
        })
    }
}

/// An owned, NUL-terminated string buffer.
pub struct ObjStr {
    /// Text followed by a single `'\0'`.
    buf: String,
    _alloc: Allocation,
}

impl ObjStr {
    pub fn as_str(&self) -> &str {
        &self.buf[..self.buf.len() - 1]
    }

    /// The buffer including its terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        self.buf.as_bytes()
    }
}

/// A pair of exclusively owned objects.
pub struct Tuple {
    x: Obj,
    y: Obj,
}

impl Tuple {
    pub fn x(&self) -> &Obj {
        &self.x
    }

    pub fn y(&self) -> &Obj {
        &self.y
    }
}

impl Obj {
    fn new_node(data: ObjData, alloc: Allocation) -> Obj {
        Obj(Shared::new(ObjNode {
            data,
            _alloc: alloc,
        }))
    }

    /// Bytes registered on the heap for one object node.
    pub const NODE_SIZE: usize = Shared::<ObjNode>::allocation_size();

    pub fn data(&self) -> &ObjData {
        &self.0.data
    }

    pub fn obj_type(&self) -> ObjType {
        match self.data() {
            ObjData::Int(_) => ObjType::Int,
            ObjData::Float(_) => ObjType::Float,
            ObjData::String(_) => ObjType::String,
            ObjData::Tuple(_) => ObjType::Tuple,
            ObjData::Vector(_) => ObjType::Vector,
        }
    }

    /// Number of owners currently holding this object.
    pub fn ref_count(&self) -> usize {
        Shared::ref_count(&self.0)
    }

    /// Become another owner of this object.
    pub fn acquire(&self) -> Obj {
        Obj(self.0.clone())
    }

    /// Give up this owner.
    ///
    /// The object and everything it owns is freed only if this was the last
    /// owner; otherwise the remaining owners keep a fully valid object.
    pub fn release(self) -> Release {
        let obj_type = self.obj_type();
        let released = Shared::release(self.0);
        tracing::trace!(%obj_type, ?released, "object released");
        released
    }

    /// Release an owner that may be absent. Releasing nothing is a no-op.
    pub fn release_opt(obj: Option<Obj>) -> Option<Release> {
        obj.map(Obj::release)
    }

    /// Whether both handles point at the same node.
    pub fn ptr_eq(&self, other: &Obj) -> bool {
        Shared::ptr_eq(&self.0, &other.0)
    }

    /// Returns `true` if the obj is [`Int`].
    ///
    /// [`Int`]: ObjData::Int
    pub fn is_int(&self) -> bool {
        matches!(self.data(), ObjData::Int(..))
    }

    pub fn as_int(&self) -> Option<i32> {
        if let ObjData::Int(v) = self.data() {
            Some(*v)
        } else {
            None
        }
    }

    /// Returns `true` if the obj is [`Float`].
    ///
    /// [`Float`]: ObjData::Float
    pub fn is_float(&self) -> bool {
        matches!(self.data(), ObjData::Float(..))
    }

    pub fn as_float(&self) -> Option<f32> {
        if let ObjData::Float(v) = self.data() {
            Some(*v)
        } else {
            None
        }
    }

    /// Returns `true` if the obj is [`String`].
    ///
    /// [`String`]: ObjData::String
    pub fn is_string(&self) -> bool {
        matches!(self.data(), ObjData::String(..))
    }

    pub fn as_str(&self) -> Option<&str> {
        if let ObjData::String(v) = self.data() {
            Some(v.as_str())
        } else {
            None
        }
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self.data(), ObjData::Tuple(..))
    }

    pub fn as_tuple(&self) -> Option<&Tuple> {
        if let ObjData::Tuple(v) = self.data() {
            Some(v)
        } else {
            None
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self.data(), ObjData::Vector(..))
    }

    pub fn as_vector(&self) -> Option<&ObjVec> {
        if let ObjData::Vector(v) = self.data() {
            Some(v)
        } else {
            None
        }
    }

    /// Split a tuple into its two halves, freeing the tuple node.
    ///
    /// Gives the object back if it is not a tuple or has other owners.
    pub fn try_into_tuple(self) -> Result<(Obj, Obj), Self> {
        if !self.is_tuple() {
            return Err(self);
        }
        match Shared::try_unwrap(self.0) {
            Ok(ObjNode { data, _alloc }) => match data {
                ObjData::Tuple(Tuple { x, y }) => Ok((x, y)),
                data => Err(Obj::new_node(data, _alloc)),
            },
            Err(shared) => Err(Obj(shared)),
        }
    }
}

impl Clone for Obj {
    fn clone(&self) -> Self {
        self.acquire()
    }
}

impl std::fmt::Debug for Obj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Obj")
            .field("type", &self.obj_type())
            .field("rc", &self.ref_count())
            .field("value", &format_args!("{}", self))
            .finish()
    }
}

/// Object construction.
///
/// Every constructor either returns a complete object or fails having released
/// whatever it had already registered.
impl Heap {
    pub fn create_int(&self, value: i32) -> ObjResult<Obj> {
        let node = self.alloc(AllocKind::Node, Obj::NODE_SIZE)?;
        Ok(Obj::new_node(ObjData::Int(value), node))
    }

    pub fn create_float(&self, value: f32) -> ObjResult<Obj> {
        let node = self.alloc(AllocKind::Node, Obj::NODE_SIZE)?;
        Ok(Obj::new_node(ObjData::Float(value), node))
    }

    /// Copy `text` into a new string object.
    ///
    /// The text is stored NUL-terminated, so it must not contain NUL itself.
    pub fn create_string(&self, text: &str) -> ObjResult<Obj> {
        if text.contains('\0') {
            return Err(ObjError::InvalidArgument("string contains a NUL byte"));
        }

        let node = self.alloc(AllocKind::Node, Obj::NODE_SIZE)?;

        let size = text.len() + 1;
        let buf_alloc = self.alloc(AllocKind::StringBuffer, size)?;
        let mut buf = String::new();
        buf.try_reserve_exact(size)
            .map_err(|_| ObjError::AllocationError { requested: size })?;
        buf.push_str(text);
        buf.push('\0');

        let s = ObjStr {
            buf,
            _alloc: buf_alloc,
        };
        Ok(Obj::new_node(ObjData::String(s), node))
    }

    /// Pair `x` and `y` into a tuple that owns both.
    ///
    /// Both inputs must be present. On failure, ownership of the inputs goes
    /// back to the caller inside the error.
    pub fn create_tuple(
        &self,
        x: Option<Obj>,
        y: Option<Obj>,
    ) -> Result<Obj, Rejected<(Option<Obj>, Option<Obj>)>> {
        let (x, y) = match (x, y) {
            (Some(x), Some(y)) => (x, y),
            (x, y) => {
                return Err(Rejected::new(
                    ObjError::InvalidArgument("tuple element is absent"),
                    (x, y),
                ))
            }
        };

        match self.alloc(AllocKind::Node, Obj::NODE_SIZE) {
            Ok(node) => Ok(Obj::new_node(ObjData::Tuple(Tuple { x, y }), node)),
            Err(e) => Err(Rejected::new(e, (Some(x), Some(y)))),
        }
    }

    /// Create an empty vector with room for `capacity` elements.
    pub fn create_vector(&self, capacity: usize) -> ObjResult<Obj> {
        if capacity == 0 {
            return Err(ObjError::InvalidArgument("vector capacity is zero"));
        }

        let node = self.alloc(AllocKind::Node, Obj::NODE_SIZE)?;
        let vec = ObjVec::reserve(self, capacity)?;
        Ok(Obj::new_node(ObjData::Vector(vec), node))
    }
}
