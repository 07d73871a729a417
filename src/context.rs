//! UI-facing bridge object
//!
//! `BridgeContext` is what gets registered in the UI layer's context. It
//! owns the runtime handle, so every call has exclusive access to it.

use std::time::Instant;

use tracing::debug_span;

use crate::errors::BridgeError;
use crate::frontend::config::{BridgeConfig, ErrorValue};
use crate::interop::{CallDispatcher, DynamicValue, NativeValue, ValueBridge};
use crate::logging;
use crate::runtime::Runtime;

pub struct BridgeContext<R: Runtime> {
    runtime: R,
    dispatcher: CallDispatcher,
    bridge: ValueBridge,
    on_error: ErrorValue,
    last_error: Option<BridgeError>,
}

impl<R: Runtime> BridgeContext<R> {
    pub fn new(runtime: R) -> Self {
        Self::with_config(runtime, &BridgeConfig::default())
    }

    pub fn with_config(runtime: R, config: &BridgeConfig) -> Self {
        Self {
            runtime,
            dispatcher: CallDispatcher::from_config(&config.dispatch),
            bridge: ValueBridge::new(),
            on_error: config.errors.on_error,
            last_error: None,
        }
    }

    /// Call `name` with an argument list
    ///
    /// Never fails: on error the configured error value is returned and the
    /// error is kept in `last_error`.
    pub fn call(&mut self, name: &str, args: &[DynamicValue]) -> DynamicValue {
        let result = self.try_call(name, args);
        self.settle(result)
    }

    /// Call `name` with no arguments
    pub fn call_no_args(&mut self, name: &str) -> DynamicValue {
        let result = self.try_call_no_args(name);
        self.settle(result)
    }

    pub fn try_call(&mut self, name: &str, args: &[DynamicValue]) -> Result<DynamicValue, BridgeError> {
        let span = debug_span!("bridge_call", function = name, args = args.len());
        let _enter = span.enter();
        let start = Instant::now();

        let native_args = self.bridge.to_native_args(args);
        let result = self
            .dispatcher
            .invoke(&mut self.runtime, name, &native_args)
            .map_err(BridgeError::from_dispatch)
            .and_then(|value| self.finish(name, &value, start));

        report(result)
    }

    pub fn try_call_no_args(&mut self, name: &str) -> Result<DynamicValue, BridgeError> {
        let span = debug_span!("bridge_call", function = name, args = 0usize);
        let _enter = span.enter();
        let start = Instant::now();

        let result = self
            .dispatcher
            .invoke_no_args(&mut self.runtime, name)
            .map_err(BridgeError::from_dispatch)
            .and_then(|value| self.finish(name, &value, start));

        report(result)
    }

    fn finish(&self, name: &str, result: &NativeValue, start: Instant) -> Result<DynamicValue, BridgeError> {
        let value = self
            .bridge
            .to_dynamic(result)
            .map_err(|e| BridgeError::from_conversion(name, e))?;

        logging::log_call_complete(name, start.elapsed().as_micros() as u64);
        Ok(value)
    }

    fn settle(&mut self, result: Result<DynamicValue, BridgeError>) -> DynamicValue {
        match result {
            Ok(value) => {
                self.last_error = None;
                value
            }
            Err(error) => {
                let value = error.to_dynamic(self.on_error);
                self.last_error = Some(error);
                value
            }
        }
    }

    /// Error from the most recent call, if it failed
    pub fn last_error(&self) -> Option<&BridgeError> {
        self.last_error.as_ref()
    }

    pub fn take_last_error(&mut self) -> Option<BridgeError> {
        self.last_error.take()
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    pub fn into_runtime(self) -> R {
        self.runtime
    }
}

fn report(result: Result<DynamicValue, BridgeError>) -> Result<DynamicValue, BridgeError> {
    if let Err(error) = &result {
        logging::log_bridge_error(error);
    }
    result
}
