//! Interoperability - call into the embedded runtime by name
//!
//! Architecture:
//! - `types.rs` - Value types on both sides (DynamicValue, NativeValue, Arguments)
//! - `marshal.rs` - DynamicValue ↔ NativeValue conversions (ValueBridge)
//! - `call.rs` - Name resolution and invocation (CallDispatcher)

mod types;
mod marshal;
mod call;

pub use types::{
    Arguments, Arity, CallArguments, DynamicValue, NativeFloat, NativeFunction, NativeInt,
    NativeList, NativeValue, Shape,
};
pub use marshal::{ConversionError, ValueBridge, ValuePath};
pub use call::{CallDispatcher, DispatchError};

#[cfg(test)]
mod tests;
