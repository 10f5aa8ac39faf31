//! Memory event definitions
//!
//! The event algebra an IR interpreter raises against the memory model. Each
//! event is processed to completion by [`Interpreter::execute`] before the
//! next begins; ordering is the caller's issue order.
//!
//! [`Interpreter::execute`]: crate::interpreter::Interpreter::execute

use crate::{
    types::DynType,
    value::DynValue,
};

use alloc::{
    string::String,
    vec::Vec,
};

/// A single memory operation raised by the interpreter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemoryEvent {
    /// Push a fresh allocation frame. Raised on function entry.
    Push,
    /// Pop the top frame and free every block it owns. Raised on function
    /// exit.
    Pop,
    /// Allocate a stack slot for a value of the given type; produces the
    /// address of its first byte.
    Alloca(DynType),
    /// Load a value of type `ty` through `addr`.
    Load {
        /// Static type of the loaded value.
        ty: DynType,
        /// Pointer operand; must be an address.
        addr: DynValue,
    },
    /// Store `value` through `addr`.
    Store {
        /// Pointer operand; must be an address.
        addr: DynValue,
        /// Value written at the pointed-to offset.
        value: DynValue,
    },
    /// Compute an element pointer from a base pointer, the static type it
    /// points at and a list of indices.
    Gep {
        /// Static type the base pointer points at.
        ty: DynType,
        /// Base pointer operand; must be an address.
        base: DynValue,
        /// Index path. The first index strides over whole values of `ty`,
        /// the rest descend into it.
        indices: Vec<DynValue>,
    },
    /// Cast an integer back to a pointer through the concrete address space.
    IntToPtr(DynValue),
    /// Cast a pointer to an integer of the given type, concretizing its
    /// block on first use.
    PtrToInt {
        /// Target integer type.
        ty: DynType,
        /// Pointer operand; must be an address.
        addr: DynValue,
    },
    /// Call a declared intrinsic by its LLVM symbol name.
    Intrinsic {
        /// Return type from the call site. Unused by the built-ins, which
        /// fix their own result types.
        ty: DynType,
        /// Exact LLVM symbol, e.g. `llvm.fabs.f32`.
        name: String,
        /// Evaluated call arguments.
        args: Vec<DynValue>,
    },
}
