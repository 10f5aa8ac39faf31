//! Memory layout parameters

/// Size of a serialized pointer, in bytes.
pub const PTR_SIZE: usize = 8;

/// Number of filler bytes trailing the head byte of a serialized pointer.
pub const PTR_FRAGMENTS: usize = 7;

/// Size of a serialized integer cell, in bytes.
///
/// Integers of every width are padded to a full cell so that `size_of` stays
/// monotone over integer widths and GEP never has to reason about sub-cell
/// layouts.
pub const INT_SIZE: usize = 8;

/// Size of a serialized `float`, in bytes.
pub const F32_SIZE: usize = 4;

/// Size of a serialized `double`, in bytes.
pub const F64_SIZE: usize = 8;
