//! Memory event error implementation
//!
//! Failures surface on two disjoint channels. [`MemoryError`] is fatal to the
//! current event and typically aborts interpretation. [`UbReason`] marks
//! undefined behavior: a non-strict interpreter may continue with a poison
//! value, a strict one escalates via the provided `From` conversion. The
//! memory state observed alongside a UB signal is the pre-event state.

use crate::{
    types::{
        BlockId,
        DynType,
        Word,
    },
    value::{
        Address,
        DynValue,
    },
};

use alloc::string::String;

/// Fatal failure raised while executing a memory event.
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemoryError {
    /// A frame operation found no frame to operate on.
    #[display(fmt = "the frame stack is empty")]
    EmptyFrameStack,
    /// Store through a pointer whose block is not allocated.
    #[display(fmt = "store to unallocated address {_0}")]
    WriteUnallocated(Address),
    /// A block-level operation referenced a block that does not exist.
    #[display(fmt = "no logical block with id {_0}")]
    MissingBlock(BlockId),
    /// A byte count does not fit the host address space.
    #[display(fmt = "length {_0} exceeds addressable memory")]
    LengthOverflow(Word),
    /// An operand had the wrong dynamic shape for the event.
    #[display(fmt = "type mismatch: {_0}")]
    TypeMismatch(String),
    /// GEP struct index past the last field.
    #[display(fmt = "field index {index} is out of range for {fields} fields")]
    IndexOutOfRange {
        /// The offending index value.
        index: Word,
        /// Number of fields in the indexed struct.
        fields: usize,
    },
    /// GEP descended into a type that has no elements.
    #[display(fmt = "cannot index into {_0}")]
    NonIndexableType(DynType),
    /// GEP index operand is not an integer of an accepted width.
    #[display(fmt = "pointer index is not an integer: {_0:?}")]
    NonIntegerIndex(DynValue),
    /// Intrinsic call to a name missing from the registry.
    #[display(fmt = "unknown intrinsic {_0}")]
    UnknownIntrinsic(String),
    /// An intrinsic rejected its arguments.
    #[display(fmt = "intrinsic {name}: {msg}")]
    Intrinsic {
        /// Intrinsic symbol name.
        name: String,
        /// Reason reported by the implementation.
        msg: String,
    },
    /// Undefined behavior escalated to a failure by a strict interpreter.
    #[display(fmt = "undefined behavior: {_0}")]
    UndefinedBehavior(UbReason),
}

/// Undefined-behavior signal.
///
/// Distinguished from [`MemoryError`] so interpreters can choose their own
/// poison semantics instead of aborting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UbReason {
    /// Load through a pointer whose block is not allocated.
    #[display(fmt = "load from unallocated address {_0}")]
    ReadUnallocated(Address),
    /// Integer-to-pointer cast of an address inside no concrete region.
    #[display(fmt = "integer {_0:#x} does not fall in any concrete region")]
    InvalidConcreteAddress(Word),
}

impl From<UbReason> for MemoryError {
    fn from(reason: UbReason) -> Self {
        Self::UndefinedBehavior(reason)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MemoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UndefinedBehavior(reason) => Some(reason),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UbReason {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// Result of an operation that can only fail fatally.
pub type MemResult<T> = Result<T, MemoryError>;
