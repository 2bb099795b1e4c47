//! Exceptional situations and conditions.

use std::sync::Arc;

use crate::value::Value;

/// A signal of some sort of erroneous condition. All conditions surface
/// synchronously at the offending call; nothing is retried or suppressed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Condition {
    /// A write was attempted on a frozen record.
    #[error("can't modify frozen {class}")]
    ModifyFrozen { class: Arc<str> },
    /// A setter-style call received the wrong number of values.
    #[error("wrong number of arguments ({provided} for {expected})")]
    WrongNumberOfArguments { expected: usize, provided: usize },
    /// A dynamic call that is neither a recognized getter nor a setter.
    /// Carries the attempted name and arguments for diagnostics.
    #[error("undefined operation `{name}' for {receiver}")]
    UndefinedOperation {
        name: Arc<str>,
        args: Vec<Value>,
        receiver: String,
    },
}

impl Condition {
    pub fn modify_frozen(class: Arc<str>) -> Self {
        Self::ModifyFrozen { class }
    }

    pub fn wrong_number_of_arguments(expected: usize, provided: usize) -> Self {
        Self::WrongNumberOfArguments { expected, provided }
    }

    pub fn undefined_operation(name: &str, args: &[Value], receiver: String) -> Self {
        Self::UndefinedOperation {
            name: Arc::from(name),
            args: args.to_vec(),
            receiver,
        }
    }
}
