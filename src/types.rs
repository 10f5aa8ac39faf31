//! Dynamic types for interpreted values.

use crate::consts::*;

use alloc::{
    boxed::Box,
    vec::Vec,
};
use core::fmt;

/// Identifier of a logical memory block.
pub type BlockId = u64;

/// Machine word used for offsets, sizes and concrete addresses.
pub type Word = u64;

/// Runtime representation of an LLVM-IR first-class type.
///
/// This is the static type a memory event carries: it drives serialization
/// layout, load/store extents and GEP strides.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DynType {
    /// Integer type of the given bit width, e.g. `i32`.
    Int(u32),
    /// Untyped pointer.
    Pointer,
    /// IEEE-754 single precision.
    Float,
    /// IEEE-754 double precision.
    Double,
    /// Fixed-length array of a single element type.
    Array {
        /// Number of elements.
        len: u64,
        /// Element type.
        elem: Box<DynType>,
    },
    /// SIMD vector; laid out exactly like an array of the same shape.
    Vector {
        /// Number of lanes.
        len: u64,
        /// Lane type.
        elem: Box<DynType>,
    },
    /// Ordered, non-packed field list.
    Struct(Vec<DynType>),
    /// Ordered, packed field list. Layout is identical to `Struct` here since
    /// no alignment padding is inserted in either case.
    PackedStruct(Vec<DynType>),
    /// The `void` type.
    Void,
}

impl DynType {
    /// The `i1` type.
    pub const I1: Self = Self::Int(1);
    /// The `i8` type.
    pub const I8: Self = Self::Int(8);
    /// The `i32` type.
    pub const I32: Self = Self::Int(32);
    /// The `i64` type.
    pub const I64: Self = Self::Int(64);

    /// Array type constructor.
    pub fn array(len: u64, elem: DynType) -> Self {
        Self::Array {
            len,
            elem: Box::new(elem),
        }
    }

    /// Vector type constructor.
    pub fn vector(len: u64, elem: DynType) -> Self {
        Self::Vector {
            len,
            elem: Box::new(elem),
        }
    }

    /// Serialized size of a value of this type, in bytes.
    ///
    /// Integers of every width occupy a full [`INT_SIZE`] cell. Aggregates
    /// are the plain sum of their parts; no alignment padding is inserted.
    /// Types with no byte representation size 0.
    pub fn size_of(&self) -> usize {
        match self {
            Self::Int(_) => INT_SIZE,
            Self::Pointer => PTR_SIZE,
            Self::Float => F32_SIZE,
            Self::Double => F64_SIZE,
            Self::Array { len, elem } | Self::Vector { len, elem } => {
                usize::try_from(*len)
                    .unwrap_or(usize::MAX)
                    .saturating_mul(elem.size_of())
            }
            Self::Struct(fields) | Self::PackedStruct(fields) => fields
                .iter()
                .fold(0usize, |total, field| {
                    total.saturating_add(field.size_of())
                }),
            Self::Void => 0,
        }
    }
}

impl fmt::Display for DynType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(width) => write!(f, "i{width}"),
            Self::Pointer => write!(f, "ptr"),
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
            Self::Array { len, elem } => write!(f, "[{len} x {elem}]"),
            Self::Vector { len, elem } => write!(f, "<{len} x {elem}>"),
            Self::Struct(fields) => {
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{field}")?;
                }
                write!(f, "}}")
            }
            Self::PackedStruct(fields) => {
                write!(f, "<{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{field}")?;
                }
                write!(f, "}}>")
            }
            Self::Void => write!(f, "void"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloc::{
        format,
        vec,
    };
    use test_case::test_case;

    #[test_case(DynType::I1 => 8)]
    #[test_case(DynType::I8 => 8)]
    #[test_case(DynType::I32 => 8)]
    #[test_case(DynType::I64 => 8)]
    #[test_case(DynType::Pointer => 8)]
    #[test_case(DynType::Float => 4)]
    #[test_case(DynType::Double => 8)]
    #[test_case(DynType::Void => 0)]
    #[test_case(DynType::array(3, DynType::I32) => 24)]
    #[test_case(DynType::vector(4, DynType::Float) => 16)]
    #[test_case(DynType::Struct(vec![DynType::I32, DynType::I64]) => 16)]
    #[test_case(DynType::Struct(vec![DynType::Float, DynType::Double]) => 12)]
    #[test_case(DynType::PackedStruct(vec![DynType::I8, DynType::Float]) => 12)]
    fn sizes(ty: DynType) -> usize {
        ty.size_of()
    }

    #[test]
    fn nested_aggregate_size() {
        let inner = DynType::Struct(vec![DynType::Float, DynType::I32]);
        let ty = DynType::array(5, inner);
        assert_eq!(ty.size_of(), 5 * (4 + 8));
    }

    #[test]
    fn display_renders_llvm_like_syntax() {
        assert_eq!(format!("{}", DynType::I32), "i32");
        assert_eq!(format!("{}", DynType::array(3, DynType::I8)), "[3 x i8]");
        assert_eq!(
            format!("{}", DynType::Struct(vec![DynType::I32, DynType::Double])),
            "{i32, double}"
        );
        assert_eq!(
            format!("{}", DynType::PackedStruct(vec![DynType::I1])),
            "<{i1}>"
        );
        assert_eq!(format!("{}", DynType::vector(2, DynType::Float)), "<2 x float>");
    }
}
