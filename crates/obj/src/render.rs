//! Debug rendering of objects.
//!
//! Rendering walks an object the same way releasing it would, but only reads.
//! The canonical forms are:
//!
//! | Variant | Rendered as |
//! |---|---|
//! | Int | decimal, e.g. `-12` |
//! | Float | fixed point with one fractional digit, e.g. `1.5` |
//! | String | double-quoted text, e.g. `"a"` |
//! | Tuple | `(x, y)` |
//! | Vector | `LEN: {n} [e0, e1, ...]` |
//!
//! For vectors, `n` counts every slot including absent ones, while absent slots
//! themselves produce no text at all (not even a separator).

use std::fmt;
use std::io;

use itertools::Itertools;

use crate::value::{Obj, ObjData};

impl fmt::Display for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data() {
            ObjData::Int(v) => write!(f, "{}", v),
            ObjData::Float(v) => write!(f, "{:.1}", v),
            ObjData::String(s) => write!(f, "\"{}\"", s.as_str()),
            ObjData::Tuple(t) => write!(f, "({}, {})", t.x(), t.y()),
            ObjData::Vector(v) => {
                let slots = v.slots().map_err(|_| fmt::Error)?;
                let res = write!(
                    f,
                    "LEN: {{{}}} [{}]",
                    slots.len(),
                    slots.present().format(", ")
                );
                res
            }
        }
    }
}

/// Render `obj` into its canonical text.
pub fn render(obj: &Obj) -> String {
    obj.to_string()
}

/// Write the rendering of `obj` to `sink`, without a trailing newline.
pub fn debug_print(obj: &Obj, sink: &mut impl io::Write) -> io::Result<()> {
    write!(sink, "{}", obj)
}
