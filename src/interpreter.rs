//! Memory [`Interpreter`] implementation

use crate::{
    error::{
        MemResult,
        MemoryError,
    },
    types::DynType,
    value::Address,
};

pub mod codec;
mod executors;
pub mod frame;
pub mod gep;
pub mod intrinsics;
pub mod memory;

use frame::FrameStack;
use intrinsics::Intrinsics;
use memory::Memory;

#[cfg(any(test, feature = "test-helpers"))]
use crate::types::Word;

/// The memory subsystem of an IR interpreter.
///
/// Owns the block store, the frame stack and the intrinsics table, and
/// executes [`MemoryEvent`]s against them. The whole state is a plain value:
/// clone it to snapshot, drop it to discard. Events are processed to
/// completion one at a time; there is no internal concurrency.
///
/// [`MemoryEvent`]: crate::event::MemoryEvent
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    memory: Memory,
    frames: FrameStack,
    intrinsics: Intrinsics,
}

impl Interpreter {
    /// Empty memory: no blocks, a single empty frame, the built-in
    /// intrinsics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Like [`Interpreter::new`], with a caller-extended intrinsics table.
    pub fn with_intrinsics(intrinsics: Intrinsics) -> Self {
        Self {
            intrinsics,
            ..Self::default()
        }
    }

    /// Read access to the block store.
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Read access to the frame stack.
    pub fn frames(&self) -> &FrameStack {
        &self.frames
    }

    /// The intrinsics table, e.g. to register client intrinsics.
    pub fn intrinsics_mut(&mut self) -> &mut Intrinsics {
        &mut self.intrinsics
    }

    /// Open a fresh allocation frame.
    pub fn push_frame(&mut self) {
        self.frames.push();
    }

    /// Close the top frame and free every block it owns, shadowing concrete
    /// regions included.
    pub fn pop_frame(&mut self) -> MemResult<()> {
        for id in self.frames.pop()? {
            self.memory.remove_block(id);
        }
        Ok(())
    }

    /// Allocate a block sized for a value of type `ty` in the top frame.
    /// Every byte starts undefined.
    pub fn alloca(&mut self, ty: &DynType) -> MemResult<Address> {
        if self.frames.is_empty() {
            return Err(MemoryError::EmptyFrameStack);
        }
        let id = self.memory.allocate(ty);
        self.frames.record(id)?;
        Ok(Address::base(id))
    }

    /// Assert the structural invariants of the memory state.
    ///
    /// Panics on violation; only meant for tests and debugging harnesses.
    #[cfg(any(test, feature = "test-helpers"))]
    pub fn check_invariants(&self) {
        assert!(!self.frames.is_empty(), "frame stack must stay non-empty");

        for id in self.frames.blocks() {
            assert!(
                self.memory.logical(id).is_some(),
                "frame owns block {id} but no logical block is bound to it"
            );
        }

        for id in self.memory.logical_ids() {
            let block = self.memory.logical(id).expect("id comes from the store");
            if let Some(base) = block.concrete_id() {
                let concrete = self
                    .memory
                    .concrete(base)
                    .expect("concretized block lost its concrete shadow");
                assert_eq!(
                    concrete.logical_id, id,
                    "concrete region points back at the wrong block"
                );
                assert_eq!(
                    concrete.size,
                    block.size(),
                    "concrete region disagrees with its block about size"
                );
            }
        }

        let mut prev_end: Option<Word> = None;
        for (base, block) in self.memory.concrete_regions() {
            if let Some(end) = prev_end {
                assert!(end <= base, "concrete regions overlap");
            }
            prev_end = Some(
                base.checked_add(block.size)
                    .expect("concrete region wraps the address space"),
            );
        }
    }
}
