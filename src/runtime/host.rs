//! In-process runtime: a global namespace of native values

use std::collections::BTreeMap;

use tracing::trace;

use super::{Callable, Runtime, RuntimeFault};
use crate::interop::{Arguments, Arity, NativeFunction, NativeValue};

/// Embedded runtime whose functions are Rust closures
///
/// Bindings may be any native value; only `Function` bindings are callable.
#[derive(Debug, Default)]
pub struct HostRuntime {
    globals: BTreeMap<String, NativeValue>,
}

impl HostRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runtime preloaded with the standard prelude functions
    pub fn with_prelude() -> Self {
        let mut runtime = Self::new();
        super::prelude::install(&mut runtime);
        runtime
    }

    /// Bind `name` to `value`, returning the previous binding
    pub fn define(&mut self, name: impl Into<String>, value: NativeValue) -> Option<NativeValue> {
        self.globals.insert(name.into(), value)
    }

    pub fn define_fn<F>(&mut self, name: &str, arity: Arity, body: F)
    where
        F: Fn(&[NativeValue]) -> Result<NativeValue, RuntimeFault> + 'static,
    {
        let func = NativeFunction::new(name, arity, body);
        self.globals.insert(name.to_string(), NativeValue::Function(func));
    }

    pub fn remove(&mut self, name: &str) -> Option<NativeValue> {
        self.globals.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&NativeValue> {
        self.globals.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.globals.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.globals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.globals.is_empty()
    }
}

impl Runtime for HostRuntime {
    fn lookup(&self, name: &str) -> Option<NativeValue> {
        self.globals.get(name).cloned()
    }

    fn invoke_binding(
        &mut self,
        callee: &dyn Callable,
        args: Arguments<'_>,
    ) -> Result<NativeValue, RuntimeFault> {
        trace!(
            event = "host_invoke",
            args = args.len(),
            unit = args.is_unit(),
            "invoking host function"
        );
        callee.invoke(args)
    }

    fn names(&self) -> Vec<String> {
        self.globals.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_lookup() {
        let mut rt = HostRuntime::new();
        assert!(rt.define("answer", NativeValue::int(42)).is_none());
        assert_eq!(rt.lookup("answer"), Some(NativeValue::int(42)));
        assert!(rt.lookup("question").is_none());

        let previous = rt.define("answer", NativeValue::int(43));
        assert_eq!(previous, Some(NativeValue::int(42)));
        assert_eq!(rt.len(), 1);
    }

    #[test]
    fn test_remove_unbinds() {
        let mut rt = HostRuntime::new();
        rt.define_fn("f", Arity::Exact(0), |_| Ok(NativeValue::Nothing));
        assert!(rt.contains("f"));
        assert!(rt.remove("f").is_some());
        assert!(rt.lookup("f").is_none());
        assert!(rt.is_empty());
    }

    #[test]
    fn test_names_are_sorted() {
        let mut rt = HostRuntime::new();
        rt.define("b", NativeValue::Nothing);
        rt.define("a", NativeValue::Nothing);
        assert_eq!(rt.names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_invoke_binding_checks_arity() {
        let mut rt = HostRuntime::new();
        rt.define_fn("one", Arity::Exact(1), |args| Ok(args[0].clone()));
        let binding = rt.lookup("one").unwrap();
        let callee = binding.as_callable().unwrap();

        let err = rt.invoke_binding(callee, Arguments::Unit).unwrap_err();
        assert!(matches!(err, RuntimeFault::Arity { got: 0, .. }));

        let args = [NativeValue::Bool(true)];
        let ok = rt.invoke_binding(callee, Arguments::List(&args)).unwrap();
        assert_eq!(ok, NativeValue::Bool(true));
    }

    #[test]
    fn test_arity_message_counts_arguments() {
        let mut rt = HostRuntime::new();
        rt.define_fn("one", Arity::Exact(1), |args| Ok(args[0].clone()));
        rt.define_fn("some", Arity::AtLeast(1), |args| Ok(args[0].clone()));
        rt.define_fn("two", Arity::Exact(2), |args| Ok(args[1].clone()));

        let message = |rt: &mut HostRuntime, name: &str| {
            let binding = rt.lookup(name).unwrap();
            let callee = binding.as_callable().unwrap();
            rt.invoke_binding(callee, Arguments::Unit).unwrap_err().to_string()
        };

        assert_eq!(message(&mut rt, "one"), "one() takes 1 argument, got 0");
        assert_eq!(message(&mut rt, "some"), "some() takes at least 1 argument, got 0");
        assert_eq!(message(&mut rt, "two"), "two() takes 2 arguments, got 0");
    }
}
