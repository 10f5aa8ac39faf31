//! Byte-level serialization of typed values.
//!
//! Values are encoded little-endian into symbolic bytes. A pointer is not
//! flattened into integer bytes: its head byte carries the whole [`Address`]
//! and the remaining seven slots are fillers. That is what keeps provenance
//! alive across memory traffic; a load at pointer type recovers the exact
//! address that was stored.

use crate::{
    consts::*,
    types::{
        DynType,
        Word,
    },
    value::{
        Address,
        DynValue,
        UndefValue,
    },
};

use alloc::{
    vec,
    vec::Vec,
};

/// Symbolic byte: the unit of storage in a logical block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SByte {
    /// A defined data byte.
    Byte(u8),
    /// Head byte of a serialized pointer, carrying the whole address.
    Ptr(Address),
    /// Filler marking slots 1..8 of a serialized pointer.
    PtrFrag,
    /// A byte with no defined value.
    Undef,
}

impl SByte {
    /// Whether this is a plain data byte, carrying no provenance.
    pub const fn is_raw(&self) -> bool {
        matches!(self, Self::Byte(_))
    }
}

/// Encode a value as a little-endian symbolic byte sequence.
///
/// Integers of every width occupy a full [`INT_SIZE`] cell with the upper
/// bytes zeroed. Aggregates concatenate their fields with element 0 at the
/// lowest offset. Values without a byte representation encode to nothing;
/// producers are expected not to store them.
pub fn serialize(value: &DynValue) -> Vec<SByte> {
    match value {
        DynValue::Addr(addr) => {
            let mut out = Vec::with_capacity(PTR_SIZE);
            out.push(SByte::Ptr(*addr));
            out.resize(PTR_SIZE, SByte::PtrFrag);
            out
        }
        DynValue::I1(v) => int_cell(Word::from(*v)),
        DynValue::I8(v) => int_cell(Word::from(*v)),
        DynValue::I32(v) => int_cell(Word::from(*v)),
        DynValue::I64(v) => int_cell(*v),
        DynValue::F32(v) => raw_bytes(&v.to_bits().to_le_bytes()),
        DynValue::F64(v) => raw_bytes(&v.to_bits().to_le_bytes()),
        DynValue::Struct(fields) | DynValue::Array(fields) => {
            fields.iter().flat_map(serialize).collect()
        }
        DynValue::Unit => Vec::new(),
    }
}

/// Decode a value of type `ty` from a symbolic byte sequence.
///
/// Any tagged byte (`Ptr`, `PtrFrag`, `Undef`) in the consumed range makes
/// the whole result undef. The one exception is pointer type, which succeeds
/// exactly when the head byte is `Ptr` regardless of the trailing slots.
pub fn deserialize(bytes: &[SByte], ty: &DynType) -> UndefValue {
    if let DynType::Pointer = ty {
        return match bytes.first() {
            Some(SByte::Ptr(addr)) => UndefValue::Addr(*addr),
            _ => UndefValue::Undef(DynType::Pointer),
        };
    }

    if bytes.iter().any(|byte| !byte.is_raw()) {
        return UndefValue::Undef(ty.clone());
    }

    match ty {
        DynType::Int(width) => {
            DynValue::int_of_width(*width, word_from_le(bytes))
                .map(UndefValue::from)
                .unwrap_or_else(|| UndefValue::Undef(ty.clone()))
        }
        DynType::Float => {
            let mut raw = [0u8; F32_SIZE];
            fill_raw(&mut raw, bytes);
            UndefValue::F32(f32::from_bits(u32::from_le_bytes(raw)))
        }
        DynType::Double => {
            let mut raw = [0u8; F64_SIZE];
            fill_raw(&mut raw, bytes);
            UndefValue::F64(f64::from_bits(u64::from_le_bytes(raw)))
        }
        DynType::Array { len, elem } | DynType::Vector { len, elem } => {
            let stride = elem.size_of();
            let count = usize::try_from(*len).unwrap_or(usize::MAX);
            let elems = if stride == 0 {
                vec![deserialize(&[], elem); count]
            } else {
                bytes
                    .chunks(stride)
                    .take(count)
                    .map(|chunk| deserialize(chunk, elem))
                    .collect()
            };
            UndefValue::Array(elems)
        }
        DynType::Struct(fields) | DynType::PackedStruct(fields) => {
            let mut rest = bytes;
            let mut values = Vec::with_capacity(fields.len());
            for field in fields {
                let take = field.size_of().min(rest.len());
                let (head, tail) = rest.split_at(take);
                values.push(deserialize(head, field));
                rest = tail;
            }
            UndefValue::Struct(values)
        }
        DynType::Pointer | DynType::Void => UndefValue::Undef(ty.clone()),
    }
}

fn int_cell(value: Word) -> Vec<SByte> {
    raw_bytes(&value.to_le_bytes())
}

fn raw_bytes(bytes: &[u8]) -> Vec<SByte> {
    bytes.iter().copied().map(SByte::Byte).collect()
}

fn word_from_le(bytes: &[SByte]) -> Word {
    let mut raw = [0u8; INT_SIZE];
    for (slot, byte) in raw.iter_mut().zip(bytes) {
        if let SByte::Byte(v) = byte {
            *slot = *v;
        }
    }
    Word::from_le_bytes(raw)
}

fn fill_raw(raw: &mut [u8], bytes: &[SByte]) {
    for (slot, byte) in raw.iter_mut().zip(bytes) {
        if let SByte::Byte(v) = byte {
            *slot = *v;
        }
    }
}
