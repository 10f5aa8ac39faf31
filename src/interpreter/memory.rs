//! Logical and concrete block storage.
//!
//! Memory is a pair of ordered, integer-keyed maps. *Logical* blocks are the
//! allocation units the interpreter sees: sparse symbolic-byte buffers
//! addressed by block id. *Concrete* blocks shadow logical blocks with a
//! contiguous integer address range; they come into existence lazily, the
//! first time a pointer into the block is cast to an integer, and die with
//! their logical owner.

use crate::{
    error::{
        MemoryError,
        UbReason,
    },
    fmt::fmt_truncated_sbytes,
    interpreter::codec::{
        self,
        SByte,
    },
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

use derivative::Derivative;

use alloc::{
    collections::BTreeMap,
    vec::Vec,
};



/// A named, sized byte buffer with provenance-aware contents.
///
/// The byte map is sparse: offsets with no binding read as [`SByte::Undef`].
/// `size` is the byte size chosen at allocation and is advisory; writes past
/// it extend the map without updating it, and reads past it see undef.
#[derive(Clone, PartialEq, Eq, Derivative)]
#[derivative(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogicalBlock {
    size: Word,
    #[derivative(Debug(format_with = "fmt_truncated_sbytes::<8>"))]
    bytes: BTreeMap<Word, SByte>,
    concrete_id: Option<Word>,
}

impl LogicalBlock {
    /// Fresh block of `size` undefined bytes, not yet concretized.
    pub fn undefined(size: Word) -> Self {
        Self {
            size,
            bytes: (0..size).map(|offset| (offset, SByte::Undef)).collect(),
            concrete_id: None,
        }
    }

    /// Byte size chosen at allocation.
    pub const fn size(&self) -> Word {
        self.size
    }

    /// Base address of the shadowing concrete block, if the block has been
    /// concretized.
    pub const fn concrete_id(&self) -> Option<Word> {
        self.concrete_id
    }

    /// Read `count` symbolic bytes starting at `offset`. Unbound offsets
    /// yield [`SByte::Undef`].
    pub fn read_bytes(&self, offset: Word, count: usize) -> Vec<SByte> {
        (0..count)
            .map(|i| {
                let key = offset.wrapping_add(i as Word);
                self.bytes.get(&key).copied().unwrap_or(SByte::Undef)
            })
            .collect()
    }

    /// Write a byte sequence starting at `offset`, shadowing any prior
    /// bindings. The declared size is left untouched.
    pub fn write_bytes(&mut self, offset: Word, data: &[SByte]) {
        for (i, byte) in data.iter().enumerate() {
            self.bytes.insert(offset.wrapping_add(i as Word), *byte);
        }
    }
}

/// A contiguous integer address range `[base, base + size)` shadowing a
/// logical block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConcreteBlock {
    /// Extent of the region in bytes; equals the logical block's size.
    pub size: Word,
    /// Id of the logical block this region shadows.
    pub logical_id: BlockId,
}

/// The block store: every allocation the interpreter can reach.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Memory {
    logical: BTreeMap<BlockId, LogicalBlock>,
    concrete: BTreeMap<Word, ConcreteBlock>,
}

impl Memory {
    /// Create an empty block store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a logical block.
    pub fn logical(&self, id: BlockId) -> Option<&LogicalBlock> {
        self.logical.get(&id)
    }

    /// Look up a concrete block by its base address.
    pub fn concrete(&self, base: Word) -> Option<&ConcreteBlock> {
        self.concrete.get(&base)
    }

    /// Iterate over all logical block ids.
    pub fn logical_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.logical.keys().copied()
    }

    /// Iterate over all concrete regions in base-address order.
    pub fn concrete_regions(
        &self,
    ) -> impl Iterator<Item = (Word, &ConcreteBlock)> + '_ {
        self.concrete.iter().map(|(base, block)| (*base, block))
    }

    /// Bind `id` to `block`, overwriting any existing binding.
    pub fn insert_logical(&mut self, id: BlockId, block: LogicalBlock) {
        self.logical.insert(id, block);
    }

    /// Bind the region starting at `base`, overwriting any existing binding.
    pub fn insert_concrete(&mut self, base: Word, block: ConcreteBlock) {
        self.concrete.insert(base, block);
    }

    /// Smallest logical id not yet in use. Monotonically increasing within
    /// one store.
    pub fn next_logical_key(&self) -> BlockId {
        self.logical
            .last_key_value()
            .map(|(id, _)| id.wrapping_add(1))
            .unwrap_or(0)
    }

    /// Base address for the next concrete region, chosen past the end of the
    /// highest existing region so regions never overlap.
    pub fn next_concrete_key(&self) -> Word {
        self.concrete
            .last_key_value()
            .map(|(base, block)| {
                base.wrapping_add(block.size).wrapping_add(1)
            })
            .unwrap_or(1)
    }

    /// Allocate a fresh block sized for a value of type `ty`, every byte
    /// undefined. Returns the new block's id.
    pub fn allocate(&mut self, ty: &DynType) -> BlockId {
        let id = self.next_logical_key();
        self.insert_logical(id, LogicalBlock::undefined(ty.size_of() as Word));
        id
    }

    /// Remove a logical block and the concrete region shadowing it, if any.
    /// Unknown ids are ignored.
    pub fn remove_block(&mut self, id: BlockId) {
        if let Some(block) = self.logical.remove(&id) {
            if let Some(base) = block.concrete_id {
                self.concrete.remove(&base);
            }
        }
    }

    /// Load a value of type `ty` through `addr`.
    ///
    /// Loads from unallocated blocks are undefined behavior, not failures;
    /// out-of-range offsets within an allocated block read as undef.
    pub fn read(
        &self,
        addr: Address,
        ty: &DynType,
    ) -> Result<UndefValue, UbReason> {
        let block = self
            .logical(addr.block)
            .ok_or(UbReason::ReadUnallocated(addr))?;
        let bytes = block.read_bytes(addr.offset, ty.size_of());
        Ok(codec::deserialize(&bytes, ty))
    }

    /// Store `value` through `addr`, shadowing any bytes already present.
    pub fn write(
        &mut self,
        addr: Address,
        value: &DynValue,
    ) -> Result<(), MemoryError> {
        let block = self
            .logical
            .get_mut(&addr.block)
            .ok_or(MemoryError::WriteUnallocated(addr))?;
        block.write_bytes(addr.offset, &codec::serialize(value));
        Ok(())
    }

    /// Read `count` values of type `ty` laid out back to back starting at
    /// `offset` in block `block`.
    ///
    /// The element range is half-open: exactly the elements `0..count` are
    /// produced, each `size_of(ty)` bytes after the previous one.
    pub fn read_array(
        &self,
        block: BlockId,
        offset: Word,
        count: u64,
        ty: &DynType,
    ) -> Result<Vec<UndefValue>, MemoryError> {
        let logical =
            self.logical(block).ok_or(MemoryError::MissingBlock(block))?;
        let stride = ty.size_of();
        let mut out = Vec::new();
        for i in 0..count {
            let at = offset.wrapping_add(i.wrapping_mul(stride as Word));
            let bytes = logical.read_bytes(at, stride);
            out.push(codec::deserialize(&bytes, ty));
        }
        Ok(out)
    }

    /// Copy `len` symbolic bytes from `src` to `dst` across logical blocks.
    ///
    /// Source bytes outside the source block's bindings copy as undef. The
    /// regions may belong to the same block; the source is snapshotted
    /// before the destination is written.
    pub fn copy(
        &mut self,
        dst: Address,
        src: Address,
        len: Word,
    ) -> Result<(), MemoryError> {
        let count = usize::try_from(len)
            .map_err(|_| MemoryError::LengthOverflow(len))?;
        let data = self
            .logical(src.block)
            .ok_or(MemoryError::MissingBlock(src.block))?
            .read_bytes(src.offset, count);
        let block = self
            .logical
            .get_mut(&dst.block)
            .ok_or(MemoryError::MissingBlock(dst.block))?;
        block.write_bytes(dst.offset, &data);
        Ok(())
    }

    /// Bind block `id` to a fresh concrete region, or return the one it
    /// already has. Unknown ids are returned unchanged; the caller observes
    /// them as a (nonsensical) base address rather than a failure.
    pub fn concretize(&mut self, id: BlockId) -> Word {
        match self.logical.get(&id).map(|b| (b.concrete_id, b.size)) {
            None => id,
            Some((Some(base), _)) => base,
            Some((None, size)) => {
                let base = self.next_concrete_key();
                self.insert_concrete(
                    base,
                    ConcreteBlock {
                        size,
                        logical_id: id,
                    },
                );
                if let Some(block) = self.logical.get_mut(&id) {
                    block.concrete_id = Some(base);
                }
                base
            }
        }
    }

    /// Resolve an integer address back to a symbolic one.
    ///
    /// Finds the concrete region containing `addr` and rebuilds the
    /// block-relative offset. `None` when no region contains the address.
    pub fn concrete_to_logical(&self, addr: Word) -> Option<Address> {
        let (base, block) = self.concrete.range(..=addr).next_back()?;
        let end = base.wrapping_add(block.size);
        (addr < end)
            .then(|| Address::new(block.logical_id, addr.wrapping_sub(*base)))
    }
}
