//! Test suite for the interop module

use super::*;
use super::call::panics_quieted;
use crate::errors::ErrorKind;
use crate::runtime::{Callable, HostRuntime, Runtime, RuntimeFault};

use std::cell::Cell;
use std::rc::Rc;

fn runtime() -> HostRuntime {
    let mut rt = HostRuntime::new();
    rt.define_fn("add", Arity::Exact(2), |args| match (&args[0], &args[1]) {
        (NativeValue::Int(a), NativeValue::Int(b)) => {
            let (a, b) = (a.to_i64().unwrap_or(0), b.to_i64().unwrap_or(0));
            Ok(NativeValue::int(a + b))
        }
        _ => Err(RuntimeFault::exception("add: expected integers")),
    });
    rt.define_fn("nullary", Arity::Exact(0), |_| Ok(NativeValue::string("ok")));
    rt.define("pi", NativeValue::float(3.5));
    rt
}

#[test]
fn test_to_native_scalars() {
    let bridge = ValueBridge::new();
    assert_eq!(bridge.to_native(&DynamicValue::Null), NativeValue::Nothing);
    assert_eq!(bridge.to_native(&DynamicValue::Bool(true)), NativeValue::Bool(true));
    assert_eq!(
        bridge.to_native(&DynamicValue::Int(-7)),
        NativeValue::Int(NativeInt::I64(-7))
    );
    assert_eq!(
        bridge.to_native(&DynamicValue::Float(2.5)),
        NativeValue::Float(NativeFloat::F64(2.5))
    );
    assert_eq!(
        bridge.to_native(&DynamicValue::from("héllo")),
        NativeValue::Str("héllo".to_string())
    );
}

#[test]
fn test_to_native_list_preserves_order() {
    let bridge = ValueBridge::new();
    let value = DynamicValue::List(vec![
        DynamicValue::Int(1),
        DynamicValue::List(vec![DynamicValue::from("a")]),
        DynamicValue::Null,
    ]);

    let NativeValue::List(list) = bridge.to_native(&value) else {
        panic!("expected a native list");
    };
    let items = list.snapshot();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0], NativeValue::int(1));
    assert_eq!(items[1].shape(), Shape::List);
    assert_eq!(items[2], NativeValue::Nothing);
}

#[test]
fn test_to_native_args_fresh_per_call() {
    let bridge = ValueBridge::new();
    let args = [DynamicValue::List(vec![])];
    let first = bridge.to_native_args(&args);
    let second = bridge.to_native_args(&args);

    match (&first[0], &second[0]) {
        (NativeValue::List(a), NativeValue::List(b)) => assert!(!a.ptr_eq(b)),
        _ => panic!("expected lists"),
    }
}

#[test]
fn test_to_dynamic_widths() {
    let bridge = ValueBridge::new();
    assert_eq!(
        bridge.to_dynamic(&NativeValue::Int(NativeInt::U8(255))),
        Ok(DynamicValue::Int(255))
    );
    assert_eq!(
        bridge.to_dynamic(&NativeValue::Int(NativeInt::I128(-5))),
        Ok(DynamicValue::Int(-5))
    );
    assert_eq!(
        bridge.to_dynamic(&NativeValue::Int(NativeInt::U64(i64::MAX as u64))),
        Ok(DynamicValue::Int(i64::MAX))
    );
    assert_eq!(
        bridge.to_dynamic(&NativeValue::Float(NativeFloat::F32(0.5))),
        Ok(DynamicValue::Float(0.5))
    );
}

#[test]
fn test_to_dynamic_numeric_overflow() {
    let bridge = ValueBridge::new();
    let err = bridge
        .to_dynamic(&NativeValue::Int(NativeInt::U64(u64::MAX)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NumericOverflow);
    assert_eq!(
        err.to_string(),
        "UInt64 value 18446744073709551615 at $ does not fit in a 64-bit integer"
    );

    let nested = NativeValue::list(vec![
        NativeValue::int(1),
        NativeValue::Int(NativeInt::I128(i128::MIN)),
    ]);
    let err = bridge.to_dynamic(&nested).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NumericOverflow);
    assert_eq!(err.path().indices(), &[1]);
}

#[test]
fn test_to_dynamic_unsupported_shape() {
    let bridge = ValueBridge::new();
    let func = NativeValue::Function(NativeFunction::new("f", Arity::Exact(0), |_| {
        Ok(NativeValue::Nothing)
    }));
    let err = bridge.to_dynamic(&func).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedShape);

    let nested = NativeValue::list(vec![NativeValue::list(vec![NativeValue::opaque("Dict")])]);
    let err = bridge.to_dynamic(&nested).unwrap_err();
    assert_eq!(
        err,
        ConversionError::UnsupportedShape {
            kind: "Dict".to_string(),
            path: ValuePath::from(vec![0, 0]),
        }
    );
    assert_eq!(err.path().to_string(), "$[0][0]");
}

#[test]
fn test_to_dynamic_detects_cycle() {
    let bridge = ValueBridge::new();
    let list = NativeList::new();
    list.push(NativeValue::int(1));
    list.push(NativeValue::List(list.clone()));

    let err = bridge.to_dynamic(&NativeValue::List(list)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CyclicStructure);
    assert_eq!(err.path().indices(), &[1]);
}

#[test]
fn test_to_dynamic_detects_indirect_cycle() {
    let bridge = ValueBridge::new();
    let outer = NativeList::new();
    let inner = NativeList::from_vec(vec![NativeValue::List(outer.clone())]);
    outer.push(NativeValue::List(inner));

    let err = bridge.to_dynamic(&NativeValue::List(outer)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CyclicStructure);
}

#[test]
fn test_to_dynamic_allows_shared_sublist() {
    let bridge = ValueBridge::new();
    let shared = NativeList::from_vec(vec![NativeValue::int(7)]);
    let value = NativeValue::list(vec![
        NativeValue::List(shared.clone()),
        NativeValue::List(shared),
    ]);

    let seven = DynamicValue::List(vec![DynamicValue::Int(7)]);
    assert_eq!(
        bridge.to_dynamic(&value),
        Ok(DynamicValue::List(vec![seven.clone(), seven]))
    );
}

#[test]
fn test_invoke_resolves_and_calls() {
    let mut rt = runtime();
    let dispatcher = CallDispatcher::new();
    let args = [NativeValue::int(2), NativeValue::int(3)];
    assert_eq!(dispatcher.invoke(&mut rt, "add", &args), Ok(NativeValue::int(5)));
}

#[test]
fn test_invoke_no_args_uses_unit_convention() {
    struct Recorder {
        saw_unit: Rc<Cell<Option<bool>>>,
    }

    impl Runtime for Recorder {
        fn lookup(&self, name: &str) -> Option<NativeValue> {
            (name == "f").then(|| {
                NativeValue::Function(NativeFunction::new("f", Arity::AtLeast(0), |_| {
                    Ok(NativeValue::Nothing)
                }))
            })
        }

        fn invoke_binding(
            &mut self,
            callee: &dyn Callable,
            args: Arguments<'_>,
        ) -> Result<NativeValue, RuntimeFault> {
            self.saw_unit.set(Some(args.is_unit()));
            callee.invoke(args)
        }
    }

    let saw_unit = Rc::new(Cell::new(None));
    let mut rt = Recorder { saw_unit: saw_unit.clone() };
    let dispatcher = CallDispatcher::new();

    dispatcher.invoke_no_args(&mut rt, "f").unwrap();
    assert_eq!(saw_unit.get(), Some(true));

    dispatcher.invoke(&mut rt, "f", &[]).unwrap();
    assert_eq!(saw_unit.get(), Some(false));
}

#[test]
fn test_invoke_name_not_found_with_suggestions() {
    let mut rt = runtime();
    let dispatcher = CallDispatcher::new();
    let err = dispatcher.invoke(&mut rt, "ad", &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NameNotFound);
    assert_eq!(
        err,
        DispatchError::NameNotFound {
            name: "ad".to_string(),
            suggestions: vec!["add".to_string()],
        }
    );

    // "pi" is bound, but to a number
    let err = dispatcher.invoke(&mut rt, "po", &[]).unwrap_err();
    assert!(matches!(err, DispatchError::NameNotFound { ref suggestions, .. } if suggestions.is_empty()));

    let quiet = CallDispatcher::new().with_suggestions(0);
    let err = quiet.invoke(&mut rt, "ad", &[]).unwrap_err();
    assert!(matches!(err, DispatchError::NameNotFound { ref suggestions, .. } if suggestions.is_empty()));
}

#[test]
fn test_invoke_not_callable() {
    let mut rt = runtime();
    let err = CallDispatcher::new().invoke(&mut rt, "pi", &[]).unwrap_err();
    assert_eq!(
        err,
        DispatchError::NotCallable {
            name: "pi".to_string(),
            kind: "Float64".to_string(),
        }
    );
}

#[test]
fn test_invoke_arity_mismatch_is_call_failed() {
    let mut rt = runtime();
    let dispatcher = CallDispatcher::new();
    let err = dispatcher.invoke(&mut rt, "add", &[NativeValue::int(1)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CallFailed);
    assert_eq!(
        err.to_string(),
        "call to 'add' failed: add() takes 2 arguments, got 1"
    );

    let err = dispatcher.invoke_no_args(&mut rt, "add").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CallFailed);
}

#[test]
fn test_invoke_carries_callee_error() {
    let mut rt = runtime();
    let args = [NativeValue::string("2"), NativeValue::int(3)];
    let err = CallDispatcher::new().invoke(&mut rt, "add", &args).unwrap_err();
    assert_eq!(
        err,
        DispatchError::CallFailed {
            name: "add".to_string(),
            description: "add: expected integers".to_string(),
        }
    );
}

#[test]
fn test_invoke_catches_panics() {
    let mut rt = HostRuntime::new();
    rt.define_fn("boom", Arity::Exact(0), |_| panic!("kaboom"));

    let err = CallDispatcher::new().invoke_no_args(&mut rt, "boom").unwrap_err();
    assert_eq!(
        err,
        DispatchError::CallFailed {
            name: "boom".to_string(),
            description: "panic in host function: kaboom".to_string(),
        }
    );
    assert!(!panics_quieted());
}

#[test]
fn test_panic_hook_quiet_only_inside_host_call() {
    let seen = Rc::new(Cell::new(None));
    let mut rt = HostRuntime::new();
    let flag = seen.clone();
    rt.define_fn("boom", Arity::Exact(0), move |_| {
        flag.set(Some(panics_quieted()));
        panic!("kaboom")
    });

    let err = CallDispatcher::new().invoke_no_args(&mut rt, "boom").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CallFailed);
    assert_eq!(seen.get(), Some(true));
    assert!(!panics_quieted());

    // A loud dispatcher still stops the panic at the bridge
    let loud = CallDispatcher::new().with_quiet_panics(false);
    let err = loud.invoke_no_args(&mut rt, "boom").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CallFailed);
    assert_eq!(seen.get(), Some(false));
}

#[test]
fn test_resolution_happens_at_call_time() {
    let mut rt = runtime();
    let dispatcher = CallDispatcher::new();
    assert!(dispatcher.invoke_no_args(&mut rt, "nullary").is_ok());

    rt.remove("nullary");
    let err = dispatcher.invoke_no_args(&mut rt, "nullary").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NameNotFound);

    rt.define_fn("nullary", Arity::Exact(0), |_| Ok(NativeValue::int(2)));
    assert_eq!(dispatcher.invoke_no_args(&mut rt, "nullary"), Ok(NativeValue::int(2)));
}

#[test]
fn test_dynamic_value_json() {
    let value: DynamicValue = serde_json::from_str(r#"[null, true, 5, 5.0, "s", []]"#).unwrap();
    assert_eq!(
        value,
        DynamicValue::List(vec![
            DynamicValue::Null,
            DynamicValue::Bool(true),
            DynamicValue::Int(5),
            DynamicValue::Float(5.0),
            DynamicValue::String("s".into()),
            DynamicValue::List(vec![]),
        ])
    );
    assert_eq!(serde_json::to_string(&value).unwrap(), r#"[null,true,5,5.0,"s",[]]"#);
    assert!(serde_json::from_str::<DynamicValue>(r#"{"k": 1}"#).is_err());
}

#[test]
fn test_native_kind_names() {
    assert_eq!(NativeValue::Nothing.kind_name(), "Nothing");
    assert_eq!(NativeValue::Int(NativeInt::I16(1)).kind_name(), "Int16");
    assert_eq!(NativeValue::list(vec![]).kind_name(), "Vector");
    assert_eq!(NativeValue::opaque("Task").kind_name(), "Task");
    assert_eq!(NativeValue::opaque("Task").shape(), Shape::Other);
}

#[test]
fn test_arity() {
    assert!(Arity::Exact(2).accepts(2));
    assert!(!Arity::Exact(2).accepts(3));
    assert!(Arity::AtLeast(1).accepts(4));
    assert!(!Arity::AtLeast(1).accepts(0));
    assert_eq!(Arity::AtLeast(1).to_string(), "at least 1");
}
