//! Embedded runtime surface consumed by the bridge
//!
//! The bridge never owns an interpreter. It talks to one through `Runtime`:
//! name lookup in the current global namespace, and invocation of a resolved
//! callable. `HostRuntime` is an in-process implementation backed by Rust
//! closures.

mod host;
pub mod prelude;

pub use host::HostRuntime;

use std::fmt;

use crate::interop::{Arguments, Arity, NativeValue};

/// Anything the runtime can invoke
pub trait Callable {
    fn invoke(&self, args: Arguments<'_>) -> Result<NativeValue, RuntimeFault>;
}

/// Execution context of an embedded runtime
///
/// Calls take `&mut self`: one call at a time per context.
pub trait Runtime {
    /// Resolve `name` in the current global namespace
    fn lookup(&self, name: &str) -> Option<NativeValue>;

    /// Invoke a resolved callable under the runtime's call semantics
    fn invoke_binding(
        &mut self,
        callee: &dyn Callable,
        args: Arguments<'_>,
    ) -> Result<NativeValue, RuntimeFault> {
        callee.invoke(args)
    }

    /// Names currently bound, if the runtime can enumerate them
    fn names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Fault raised inside the runtime while a call executes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeFault {
    Arity {
        function: String,
        expected: Arity,
        got: usize,
    },
    /// Error thrown by the callee itself
    Exception(String),
    /// Host code unwound through the call
    Panic(String),
}

impl RuntimeFault {
    pub fn exception(message: impl Into<String>) -> Self {
        Self::Exception(message.into())
    }
}

impl fmt::Display for RuntimeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arity {
                function,
                expected,
                got,
            } => {
                let noun = match expected {
                    Arity::Exact(1) | Arity::AtLeast(1) => "argument",
                    _ => "arguments",
                };
                write!(f, "{}() takes {} {}, got {}", function, expected, noun, got)
            }
            Self::Exception(msg) => write!(f, "{}", msg),
            Self::Panic(msg) => write!(f, "panic in host function: {}", msg),
        }
    }
}

impl std::error::Error for RuntimeFault {}
