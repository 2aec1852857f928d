//! Dynamically-typed objects with explicit, accounted ownership.
//!
//! An [`Obj`] is one of five variants: int, float, string, tuple or vector.
//! Objects are created through a [`Heap`], which registers every node, string
//! buffer and vector storage it hands out. Tuples and vectors own their
//! elements; reference counting ([`Obj::acquire`] / [`Obj::release`]) is the
//! only way for an object to have more than one owner.
//!
//! ```
//! use objkit_obj::{render, Heap};
//!
//! let heap = Heap::new();
//! let v = heap.create_vector(2).unwrap();
//! let items = v.as_vector().unwrap();
//! items.push_back(heap.create_string("a").unwrap()).unwrap();
//! items.push_back(heap.create_string("b").unwrap()).unwrap();
//! let t = heap
//!     .create_tuple(Some(heap.create_int(3).unwrap()), Some(v))
//!     .unwrap();
//!
//! assert_eq!(render(&t), r#"(3, LEN: {2} ["a", "b"])"#);
//! t.release();
//! assert_eq!(heap.stats().live_allocations, 0);
//! ```

pub mod config;
pub mod error;
pub mod rc;
pub mod render;
pub mod value;

pub use config::HeapConfig;
pub use error::{ObjError, ObjResult, Rejected};
pub use objkit_slots::SlotVec;
pub use rc::alloc::{AllocKind, Heap, HeapStats};
pub use rc::Release;
pub use render::{debug_print, render};
pub use value::{Obj, ObjData, ObjStr, ObjType, ObjVec, Tuple};

static_assertions::assert_eq_size!(Obj, *mut ());
static_assertions::assert_eq_size!(Option<Obj>, *mut ());
