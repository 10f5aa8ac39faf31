//! Memory event executor and dispatch.

use crate::{
    error::{
        MemResult,
        MemoryError,
        UbReason,
    },
    event::MemoryEvent,
    interpreter::{
        gep::gep,
        intrinsics::MEMCPY_32,
        Interpreter,
    },
    state::ExecuteState,
    types::DynType,
    value::{
        Address,
        DynValue,
    },
};

use alloc::format;

impl Interpreter {
    /// Execute a single memory event.
    ///
    /// `Err` is the fatal failure channel. Undefined behavior is not an
    /// error: it comes back as [`ExecuteState::UndefinedBehavior`] with the
    /// pre-event state intact, so a non-strict caller can keep going with a
    /// poison value.
    pub fn execute(&mut self, event: MemoryEvent) -> MemResult<ExecuteState> {
        tracing::trace!("event: {:?}", event);

        match event {
            MemoryEvent::Push => {
                self.push_frame();
                Ok(ExecuteState::unit())
            }

            MemoryEvent::Pop => {
                self.pop_frame()?;
                Ok(ExecuteState::unit())
            }

            MemoryEvent::Alloca(ty) => {
                let addr = self.alloca(&ty)?;
                Ok(DynValue::Addr(addr).into())
            }

            MemoryEvent::Load { ty, addr } => {
                let addr = expect_addr(addr)?;
                Ok(match self.memory.read(addr, &ty) {
                    Ok(value) => ExecuteState::Value(value),
                    Err(ub) => ExecuteState::UndefinedBehavior(ub),
                })
            }

            MemoryEvent::Store { addr, value } => {
                let addr = expect_addr(addr)?;
                self.memory.write(addr, &value)?;
                Ok(ExecuteState::unit())
            }

            MemoryEvent::Gep { ty, base, indices } => {
                let base = expect_addr(base)?;
                let addr = gep(&ty, base, &indices)?;
                Ok(DynValue::Addr(addr).into())
            }

            MemoryEvent::IntToPtr(value) => {
                let raw = value.as_word().ok_or_else(|| {
                    MemoryError::TypeMismatch(format!(
                        "int-to-ptr operand must be an integer, got {value:?}"
                    ))
                })?;
                Ok(match self.memory.concrete_to_logical(raw) {
                    Some(addr) => DynValue::Addr(addr).into(),
                    None => UbReason::InvalidConcreteAddress(raw).into(),
                })
            }

            MemoryEvent::PtrToInt { ty, addr } => {
                let DynType::Int(width) = ty else {
                    return Err(MemoryError::TypeMismatch(format!(
                        "ptr-to-int target must be an integer type, got {ty}"
                    )));
                };
                let addr = expect_addr(addr)?;
                let base = self.memory.concretize(addr.block);
                DynValue::int_of_width(width, base.wrapping_add(addr.offset))
                    .map(Into::into)
                    .ok_or_else(|| {
                        MemoryError::TypeMismatch(format!(
                            "no integer representation of width {width}"
                        ))
                    })
            }

            MemoryEvent::Intrinsic { ty: _, name, args } => {
                if name == MEMCPY_32 {
                    self.memcpy(&args)
                } else {
                    self.intrinsics.call(&name, &args).map(Into::into)
                }
            }
        }
    }

    /// `llvm.memcpy` against the block store: the `len` lowest bytes of the
    /// source region move byte-for-byte, provenance intact. Alignment and
    /// volatility arguments are accepted and ignored.
    fn memcpy(&mut self, args: &[DynValue]) -> MemResult<ExecuteState> {
        let [DynValue::Addr(dst), DynValue::Addr(src), len, _align, _volatile] =
            args
        else {
            return Err(MemoryError::Intrinsic {
                name: MEMCPY_32.into(),
                msg: format!(
                    "expected (dst, src, len, align, volatile) with pointer \
                     dst and src, got {args:?}"
                ),
            });
        };
        let len = len.as_word().ok_or_else(|| MemoryError::Intrinsic {
            name: MEMCPY_32.into(),
            msg: format!("copy length must be an integer, got {len:?}"),
        })?;
        self.memory.copy(*dst, *src, len)?;
        Ok(ExecuteState::unit())
    }
}

fn expect_addr(value: DynValue) -> MemResult<Address> {
    match value {
        DynValue::Addr(addr) => Ok(addr),
        other => Err(MemoryError::TypeMismatch(format!(
            "expected an address operand, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloc::vec;

    #[test]
    fn load_requires_an_address_operand() {
        let mut vm = Interpreter::new();
        let err = vm
            .execute(MemoryEvent::Load {
                ty: DynType::I64,
                addr: DynValue::I64(0),
            })
            .expect_err("integers are not addresses");
        assert!(matches!(err, MemoryError::TypeMismatch(_)));
    }

    #[test]
    fn ptr_to_int_rejects_non_integer_targets() {
        let mut vm = Interpreter::new();
        let addr = vm.alloca(&DynType::I8).expect("base frame exists");
        let err = vm
            .execute(MemoryEvent::PtrToInt {
                ty: DynType::Float,
                addr: DynValue::Addr(addr),
            })
            .expect_err("float is not an integer type");
        assert!(matches!(err, MemoryError::TypeMismatch(_)));
    }

    #[test]
    fn pop_of_the_last_frame_then_any_frame_op_is_fatal() {
        let mut vm = Interpreter::new();
        vm.execute(MemoryEvent::Pop).expect("base frame exists");
        assert_eq!(
            vm.execute(MemoryEvent::Pop),
            Err(MemoryError::EmptyFrameStack)
        );
        assert_eq!(
            vm.execute(MemoryEvent::Alloca(DynType::I32)),
            Err(MemoryError::EmptyFrameStack)
        );
    }

    #[test]
    fn memcpy_argument_shape_is_checked() {
        let mut vm = Interpreter::new();
        let err = vm
            .execute(MemoryEvent::Intrinsic {
                ty: DynType::Void,
                name: MEMCPY_32.into(),
                args: vec![DynValue::I64(0), DynValue::I64(1)],
            })
            .expect_err("not a memcpy argument list");
        assert!(matches!(err, MemoryError::Intrinsic { .. }));
    }

    #[test]
    fn intrinsic_events_reach_the_registry() {
        let mut vm = Interpreter::new();
        let out = vm
            .execute(MemoryEvent::Intrinsic {
                ty: DynType::Double,
                name: "llvm.fabs.f64".into(),
                args: vec![DynValue::F64(-4.0)],
            })
            .expect("fabs is built in");
        assert_eq!(out, ExecuteState::Value(DynValue::F64(4.0).into()));

        assert_eq!(
            vm.execute(MemoryEvent::Intrinsic {
                ty: DynType::Void,
                name: "llvm.donothing".into(),
                args: vec![],
            }),
            Err(MemoryError::UnknownIntrinsic("llvm.donothing".into()))
        );
    }
}
