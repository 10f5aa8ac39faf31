//! Element-pointer offset computation.
//!
//! `gep` walks a static type with a list of dynamic indices and produces a
//! displaced address in the same block. No memory is touched: the
//! computation is pure address arithmetic over the type's layout, and all
//! indices are interpreted as unsigned.

use crate::{
    error::MemoryError,
    types::{
        DynType,
        Word,
    },
    value::{
        Address,
        DynValue,
    },
};

/// Compute an element pointer from `base`, the type it points at and an
/// index path.
///
/// The first index strides over whole values of `ty` reachable through the
/// base pointer and must be `i32` or `i64`; the remaining indices descend
/// into arrays, vectors and structs and may also be `i8`. An empty index
/// path returns `base` unchanged.
pub fn gep(
    ty: &DynType,
    base: Address,
    indices: &[DynValue],
) -> Result<Address, MemoryError> {
    let Some((first, rest)) = indices.split_first() else {
        return Ok(base);
    };

    let stride = match first {
        DynValue::I32(v) => Word::from(*v),
        DynValue::I64(v) => *v,
        other => return Err(MemoryError::NonIntegerIndex(other.clone())),
    };
    let offset = base
        .offset
        .wrapping_add(stride.wrapping_mul(ty.size_of() as Word));

    descend(ty, offset, rest).map(|offset| Address::new(base.block, offset))
}

fn descend(
    ty: &DynType,
    offset: Word,
    indices: &[DynValue],
) -> Result<Word, MemoryError> {
    let Some((index, rest)) = indices.split_first() else {
        return Ok(offset);
    };
    let index = index_word(index)?;

    match ty {
        DynType::Array { elem, .. } | DynType::Vector { elem, .. } => {
            let offset =
                offset.wrapping_add(index.wrapping_mul(elem.size_of() as Word));
            descend(elem, offset, rest)
        }
        DynType::Struct(fields) | DynType::PackedStruct(fields) => {
            let position = usize::try_from(index)
                .ok()
                .filter(|i| *i < fields.len())
                .ok_or(MemoryError::IndexOutOfRange {
                    index,
                    fields: fields.len(),
                })?;
            let skipped = fields[..position]
                .iter()
                .fold(0usize, |total, field| {
                    total.saturating_add(field.size_of())
                });
            descend(
                &fields[position],
                offset.wrapping_add(skipped as Word),
                rest,
            )
        }
        other => Err(MemoryError::NonIndexableType(other.clone())),
    }
}

fn index_word(value: &DynValue) -> Result<Word, MemoryError> {
    match value {
        DynValue::I8(v) => Ok(Word::from(*v)),
        DynValue::I32(v) => Ok(Word::from(*v)),
        DynValue::I64(v) => Ok(*v),
        other => Err(MemoryError::NonIntegerIndex(other.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloc::{
        vec,
        vec::Vec,
    };
    use rstest::rstest;

    fn pair_i32_i64() -> DynType {
        DynType::Struct(vec![DynType::I32, DynType::I64])
    }

    #[rstest]
    #[case(DynType::I64, vec![], 16, 16)]
    #[case(DynType::I64, vec![DynValue::I32(0)], 0, 0)]
    #[case(DynType::I64, vec![DynValue::I32(3)], 0, 24)]
    #[case(DynType::I64, vec![DynValue::I64(2)], 8, 24)]
    #[case(pair_i32_i64(), vec![DynValue::I32(0), DynValue::I32(0)], 0, 0)]
    #[case(pair_i32_i64(), vec![DynValue::I32(0), DynValue::I32(1)], 0, 8)]
    #[case(pair_i32_i64(), vec![DynValue::I32(1), DynValue::I32(1)], 0, 24)]
    #[case(
        DynType::array(4, DynType::Float),
        vec![DynValue::I32(0), DynValue::I8(3)],
        0,
        12
    )]
    #[case(
        DynType::vector(4, DynType::I32),
        vec![DynValue::I32(0), DynValue::I64(2)],
        0,
        16
    )]
    #[case(
        DynType::array(2, pair_i32_i64()),
        vec![DynValue::I32(0), DynValue::I32(1), DynValue::I32(1)],
        0,
        24
    )]
    fn strides_match_layout(
        #[case] ty: DynType,
        #[case] indices: Vec<DynValue>,
        #[case] start: Word,
        #[case] expected: Word,
    ) {
        let base = Address::new(5, start);
        let out = gep(&ty, base, &indices).expect("valid index path");
        assert_eq!(out, Address::new(5, expected));
    }

    #[test]
    fn struct_index_past_last_field_fails() {
        let err = gep(
            &pair_i32_i64(),
            Address::base(0),
            &[DynValue::I32(0), DynValue::I32(2)],
        )
        .expect_err("two fields only");
        assert_eq!(err, MemoryError::IndexOutOfRange { index: 2, fields: 2 });
    }

    #[test]
    fn scalar_types_are_not_indexable() {
        let err = gep(
            &DynType::I64,
            Address::base(0),
            &[DynValue::I32(0), DynValue::I32(0)],
        )
        .expect_err("i64 has no elements");
        assert_eq!(err, MemoryError::NonIndexableType(DynType::I64));
    }

    #[test]
    fn top_level_index_must_be_i32_or_i64() {
        let err = gep(&DynType::I64, Address::base(0), &[DynValue::I8(1)])
            .expect_err("i8 is only accepted below the top level");
        assert_eq!(err, MemoryError::NonIntegerIndex(DynValue::I8(1)));

        let err = gep(&DynType::I64, Address::base(0), &[DynValue::F32(1.0)])
            .expect_err("floats never index");
        assert_eq!(err, MemoryError::NonIntegerIndex(DynValue::F32(1.0)));
    }

    #[test]
    fn inner_index_must_be_an_accepted_integer() {
        let ty = DynType::array(2, DynType::I32);
        let err = gep(
            &ty,
            Address::base(0),
            &[DynValue::I32(0), DynValue::I1(true)],
        )
        .expect_err("i1 does not index");
        assert_eq!(err, MemoryError::NonIntegerIndex(DynValue::I1(true)));
    }

    #[test]
    fn indices_are_unsigned() {
        // 0xffff_ffff is a large positive stride, not -1.
        let out = gep(
            &DynType::I8,
            Address::base(1),
            &[DynValue::I32(u32::MAX)],
        )
        .expect("unsigned stride");
        assert_eq!(out.offset, Word::from(u32::MAX).wrapping_mul(8));
    }
}
