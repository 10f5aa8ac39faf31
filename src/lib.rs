//! Byte-addressable memory model for an LLVM-IR interpreter.
//!
//! The crate gives executable semantics to the memory events an IR
//! interpreter raises: stack allocation, typed loads and stores, address
//! arithmetic (GEP), pointer/integer casts, frame push/pop and a handful of
//! pure arithmetic intrinsics. Memory is a set of *logical blocks* (sparse,
//! provenance-aware byte buffers) optionally shadowed by *concrete blocks*
//! (integer address ranges) once a pointer has been observed as an integer.
//!
//! The driving surface is [`interpreter::Interpreter`]: feed it
//! [`event::MemoryEvent`]s and consume [`state::ExecuteState`]s.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]
#![deny(unused_crate_dependencies)]
#![deny(
    clippy::arithmetic_side_effects,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::string_slice
)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate libm as _; // Not needed with stdlib

#[cfg(test)]
extern crate lir_vm as _; // dev-dependency on self, used only by tests/*.rs

pub mod consts;
pub mod error;
pub mod event;
mod fmt;
pub mod interpreter;
pub mod state;
pub mod types;
pub mod value;

pub mod prelude {
    //! Required implementations for full functionality
    #[doc(no_inline)]
    pub use crate::{
        error::{
            MemResult,
            MemoryError,
            UbReason,
        },
        event::MemoryEvent,
        interpreter::{
            codec::{
                deserialize,
                serialize,
                SByte,
            },
            frame::FrameStack,
            gep::gep,
            intrinsics::{
                IntrinsicDecl,
                IntrinsicFn,
                Intrinsics,
            },
            memory::{
                ConcreteBlock,
                LogicalBlock,
                Memory,
            },
            Interpreter,
        },
        state::ExecuteState,
        types::{
            BlockId,
            DynType,
            Word,
        },
        value::{
            Address,
            DynValue,
            UndefValue,
        },
    };
}
