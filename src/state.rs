//! Runtime outcome representation for memory events

use crate::{
    error::UbReason,
    value::{
        DynValue,
        UndefValue,
    },
};

/// Resulting state of a single memory event execution.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecuteState {
    /// The event completed and produced a value. Events without a meaningful
    /// result produce [`UndefValue::Unit`].
    Value(UndefValue),
    /// The event hit undefined behavior. The memory state is the pre-event
    /// state; a non-strict interpreter may continue with a poison value.
    UndefinedBehavior(UbReason),
    /// Reserved for intrinsics that must resolve external non-determinism.
    /// No built-in intrinsic emits it.
    Pick(UndefValue),
}

impl ExecuteState {
    /// Outcome of an event with no meaningful result.
    pub const fn unit() -> Self {
        Self::Value(UndefValue::Unit)
    }

    /// Whether this outcome is an undefined-behavior signal.
    pub const fn is_ub(&self) -> bool {
        matches!(self, Self::UndefinedBehavior(_))
    }

    /// The produced value, if the event completed.
    pub fn value(self) -> Option<UndefValue> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl From<DynValue> for ExecuteState {
    fn from(value: DynValue) -> Self {
        Self::Value(value.into())
    }
}

impl From<UndefValue> for ExecuteState {
    fn from(value: UndefValue) -> Self {
        Self::Value(value)
    }
}

impl From<UbReason> for ExecuteState {
    fn from(reason: UbReason) -> Self {
        Self::UndefinedBehavior(reason)
    }
}
