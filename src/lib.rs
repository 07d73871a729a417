//! callbridge - call embedded-runtime functions from a UI scripting layer
//!
//! The UI side hands over a function name and a list of dynamic values; the
//! bridge converts the arguments, resolves and invokes the function in the
//! embedded runtime, and converts the result back.

pub mod context;
pub mod errors;
pub mod frontend;
pub mod interop;
pub mod logging;
pub mod runtime;

// Re-export commonly used items
pub use context::BridgeContext;
pub use errors::{BridgeError, ErrorKind};
pub use frontend::{cli_main, BridgeConfig, ErrorValue};
pub use interop::{
    Arguments, Arity, CallArguments, CallDispatcher, ConversionError, DispatchError,
    DynamicValue, NativeFunction, NativeInt, NativeFloat, NativeList, NativeValue, ValueBridge,
};
pub use logging::{init_with_config as init_logging, LogConfig};
pub use runtime::{Callable, HostRuntime, Runtime, RuntimeFault};
