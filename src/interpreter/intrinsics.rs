//! Pure arithmetic intrinsics.
//!
//! A registry from LLVM symbol name to a pure function over dynamic values.
//! The built-ins cover the float absolute-value and min/max families;
//! `llvm.memcpy` is declared here but resolved by the event executor, since
//! it needs the block store rather than its arguments alone. Client tables
//! extend the built-ins through [`Intrinsics::register`].

use crate::{
    error::MemoryError,
    types::DynType,
    value::DynValue,
};

use hashbrown::HashMap;

use alloc::{
    format,
    string::String,
    vec,
    vec::Vec,
};

/// Symbol of the memcpy variant the event executor resolves against the
/// block store.
pub const MEMCPY_32: &str = "llvm.memcpy.p0i8.p0i8.i32";

/// Implementation of a pure intrinsic: arguments in, value or rejection out.
pub type IntrinsicFn = fn(&[DynValue]) -> Result<DynValue, String>;

/// LLVM-level signature of a declared intrinsic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrinsicDecl {
    /// Exact LLVM symbol.
    pub name: &'static str,
    /// Return type.
    pub ret: DynType,
    /// Parameter types, in order.
    pub params: Vec<DynType>,
}

/// Ordered catalogue of the built-in declarations and their pure
/// implementations. `llvm.memcpy` carries no pure implementation; the event
/// executor special-cases it.
pub fn declarations() -> Vec<(IntrinsicDecl, Option<IntrinsicFn>)> {
    vec![
        (
            IntrinsicDecl {
                name: "llvm.fabs.f32",
                ret: DynType::Float,
                params: vec![DynType::Float],
            },
            Some(fabs_f32 as IntrinsicFn),
        ),
        (
            IntrinsicDecl {
                name: "llvm.fabs.f64",
                ret: DynType::Double,
                params: vec![DynType::Double],
            },
            Some(fabs_f64 as IntrinsicFn),
        ),
        (
            IntrinsicDecl {
                name: "llvm.maxnum.f32",
                ret: DynType::Float,
                params: vec![DynType::Float, DynType::Float],
            },
            Some(maxnum_f32 as IntrinsicFn),
        ),
        (
            IntrinsicDecl {
                name: "llvm.maxnum.f64",
                ret: DynType::Double,
                params: vec![DynType::Double, DynType::Double],
            },
            Some(maxnum_f64 as IntrinsicFn),
        ),
        (
            IntrinsicDecl {
                // The f32 variant of minimum is declared without the
                // `llvm.` prefix.
                name: "minimum.f32",
                ret: DynType::Float,
                params: vec![DynType::Float, DynType::Float],
            },
            Some(minimum_f32 as IntrinsicFn),
        ),
        (
            IntrinsicDecl {
                name: "llvm.minimum.f64",
                ret: DynType::Double,
                params: vec![DynType::Double, DynType::Double],
            },
            Some(minimum_f64 as IntrinsicFn),
        ),
        (
            IntrinsicDecl {
                name: MEMCPY_32,
                ret: DynType::Void,
                params: vec![
                    DynType::Pointer,
                    DynType::Pointer,
                    DynType::I32,
                    DynType::I32,
                    DynType::I1,
                ],
            },
            None,
        ),
    ]
}

/// Registry of callable intrinsics, keyed by exact symbol name.
#[derive(Debug, Clone)]
pub struct Intrinsics {
    table: HashMap<String, IntrinsicFn>,
}

impl Default for Intrinsics {
    fn default() -> Self {
        let table = declarations()
            .into_iter()
            .filter_map(|(decl, f)| Some((String::from(decl.name), f?)))
            .collect();
        Self { table }
    }
}

impl Intrinsics {
    /// Registry holding exactly the built-ins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an intrinsic under `name`.
    pub fn register(&mut self, name: impl Into<String>, f: IntrinsicFn) {
        self.table.insert(name.into(), f);
    }

    /// Look up an intrinsic by exact symbol name.
    pub fn get(&self, name: &str) -> Option<IntrinsicFn> {
        self.table.get(name).copied()
    }

    /// Invoke `name` over `args`, mapping rejections into the failure
    /// channel.
    pub fn call(
        &self,
        name: &str,
        args: &[DynValue],
    ) -> Result<DynValue, MemoryError> {
        let f = self
            .get(name)
            .ok_or_else(|| MemoryError::UnknownIntrinsic(name.into()))?;
        f(args).map_err(|msg| MemoryError::Intrinsic {
            name: name.into(),
            msg,
        })
    }
}

fn fabs_f32(args: &[DynValue]) -> Result<DynValue, String> {
    match args {
        [DynValue::F32(x)] => Ok(DynValue::F32(abs32(*x))),
        _ => Err(format!("expected one float argument, got {args:?}")),
    }
}

fn fabs_f64(args: &[DynValue]) -> Result<DynValue, String> {
    match args {
        [DynValue::F64(x)] => Ok(DynValue::F64(abs64(*x))),
        _ => Err(format!("expected one double argument, got {args:?}")),
    }
}

fn maxnum_f32(args: &[DynValue]) -> Result<DynValue, String> {
    let (a, b) = two_f32(args)?;
    Ok(DynValue::F32(pick(a, b, |a, b| if a < b { b } else { a })))
}

fn maxnum_f64(args: &[DynValue]) -> Result<DynValue, String> {
    let (a, b) = two_f64(args)?;
    Ok(DynValue::F64(pick(a, b, |a, b| if a < b { b } else { a })))
}

fn minimum_f32(args: &[DynValue]) -> Result<DynValue, String> {
    let (a, b) = two_f32(args)?;
    Ok(DynValue::F32(pick(a, b, |a, b| if a < b { a } else { b })))
}

fn minimum_f64(args: &[DynValue]) -> Result<DynValue, String> {
    let (a, b) = two_f64(args)?;
    Ok(DynValue::F64(pick(a, b, |a, b| if a < b { a } else { b })))
}

/// NaN operands win, payload intact; otherwise defer to the comparison.
fn pick<F: Copy + IsNan>(a: F, b: F, select: fn(F, F) -> F) -> F {
    if a.is_nan() {
        a
    } else if b.is_nan() {
        b
    } else {
        select(a, b)
    }
}

trait IsNan {
    fn is_nan(self) -> bool;
}

impl IsNan for f32 {
    fn is_nan(self) -> bool {
        f32::is_nan(self)
    }
}

impl IsNan for f64 {
    fn is_nan(self) -> bool {
        f64::is_nan(self)
    }
}

fn two_f32(args: &[DynValue]) -> Result<(f32, f32), String> {
    match args {
        [DynValue::F32(a), DynValue::F32(b)] => Ok((*a, *b)),
        _ => Err(format!("expected two float arguments, got {args:?}")),
    }
}

fn two_f64(args: &[DynValue]) -> Result<(f64, f64), String> {
    match args {
        [DynValue::F64(a), DynValue::F64(b)] => Ok((*a, *b)),
        _ => Err(format!("expected two double arguments, got {args:?}")),
    }
}

#[cfg(feature = "std")]
fn abs32(x: f32) -> f32 {
    x.abs()
}

#[cfg(not(feature = "std"))]
fn abs32(x: f32) -> f32 {
    libm::fabsf(x)
}

#[cfg(feature = "std")]
fn abs64(x: f64) -> f64 {
    x.abs()
}

#[cfg(not(feature = "std"))]
fn abs64(x: f64) -> f64 {
    libm::fabs(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fabs_flips_the_sign_bit() {
        let table = Intrinsics::new();
        assert_eq!(
            table.call("llvm.fabs.f32", &[DynValue::F32(-2.5)]),
            Ok(DynValue::F32(2.5))
        );
        assert_eq!(
            table.call("llvm.fabs.f64", &[DynValue::F64(-0.0)]),
            Ok(DynValue::F64(0.0))
        );
    }

    #[test]
    fn maxnum_orders_by_ieee_less_than() {
        let table = Intrinsics::new();
        assert_eq!(
            table.call(
                "llvm.maxnum.f64",
                &[DynValue::F64(1.0), DynValue::F64(2.0)]
            ),
            Ok(DynValue::F64(2.0))
        );
        assert_eq!(
            table.call(
                "llvm.maxnum.f32",
                &[DynValue::F32(4.0), DynValue::F32(-7.0)]
            ),
            Ok(DynValue::F32(4.0))
        );
    }

    #[test]
    fn nan_operands_win_with_payload_intact() {
        let table = Intrinsics::new();
        let payload = f64::from_bits(0x7ff8_0000_0000_beef);
        let out = table
            .call(
                "llvm.maxnum.f64",
                &[DynValue::F64(payload), DynValue::F64(1.0)],
            )
            .expect("arity is right");
        match out {
            DynValue::F64(v) => assert_eq!(v.to_bits(), payload.to_bits()),
            other => panic!("expected a double, got {other:?}"),
        }
    }

    #[test]
    fn minimum_prefers_the_left_operand_on_ties() {
        let table = Intrinsics::new();
        // Neither -0.0 < 0.0 nor 0.0 < -0.0 holds, so `a` is returned.
        let out = table
            .call(
                "llvm.minimum.f64",
                &[DynValue::F64(-0.0), DynValue::F64(0.0)],
            )
            .expect("arity is right");
        match out {
            DynValue::F64(v) => assert_eq!(v.to_bits(), (-0.0f64).to_bits()),
            other => panic!("expected a double, got {other:?}"),
        }
    }

    #[test]
    fn minimum_f32_registers_without_the_llvm_prefix() {
        let table = Intrinsics::new();
        assert!(table.get("minimum.f32").is_some());
        assert!(table.get("llvm.minimum.f32").is_none());
        assert_eq!(
            table.call(
                "minimum.f32",
                &[DynValue::F32(3.0), DynValue::F32(1.0)]
            ),
            Ok(DynValue::F32(1.0))
        );
    }

    #[test]
    fn unknown_names_and_bad_arity_fail() {
        let table = Intrinsics::new();
        assert_eq!(
            table.call("llvm.ctpop.i64", &[DynValue::I64(1)]),
            Err(MemoryError::UnknownIntrinsic("llvm.ctpop.i64".into()))
        );
        assert!(matches!(
            table.call("llvm.fabs.f32", &[DynValue::F64(1.0)]),
            Err(MemoryError::Intrinsic { .. })
        ));
    }

    #[test]
    fn client_tables_extend_the_builtins() {
        fn always_one(_: &[DynValue]) -> Result<DynValue, String> {
            Ok(DynValue::I64(1))
        }
        let mut table = Intrinsics::new();
        table.register("llvm.expect.i64", always_one);
        assert_eq!(
            table.call("llvm.expect.i64", &[]),
            Ok(DynValue::I64(1))
        );
    }

    #[test]
    fn memcpy_is_declared_but_not_pure() {
        let decls = declarations();
        let memcpy = decls
            .iter()
            .find(|(decl, _)| decl.name == MEMCPY_32)
            .expect("memcpy is declared");
        assert!(memcpy.1.is_none());
        assert_eq!(memcpy.0.params.len(), 5);
        assert!(Intrinsics::new().get(MEMCPY_32).is_none());
    }
}
