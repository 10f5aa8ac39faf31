//! Debug formatting helpers

use crate::{
    interpreter::codec::SByte,
    types::Word,
};

use alloc::collections::BTreeMap;
use core::{
    fmt,
    fmt::Formatter,
};

/// Formatting utility to truncate a sparse symbolic-byte map to at most `N`
/// rendered entries.
pub(crate) fn fmt_truncated_sbytes<const N: usize>(
    bytes: &BTreeMap<Word, SByte>,
    f: &mut Formatter,
) -> fmt::Result {
    f.write_str("{")?;
    for (i, (offset, byte)) in bytes.iter().take(N).enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{offset}: ")?;
        match byte {
            SByte::Byte(v) => write!(f, "{v:02x}")?,
            SByte::Ptr(a) => write!(f, "ptr {a}")?,
            SByte::PtrFrag => f.write_str("frag")?,
            SByte::Undef => f.write_str("??")?,
        }
    }
    let rest = bytes.len().saturating_sub(N);
    if rest > 0 {
        write!(f, ", ... (+{rest})")?;
    }
    f.write_str("}")
}
