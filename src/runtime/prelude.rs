//! Standard functions preloaded into a `HostRuntime`

use super::{HostRuntime, RuntimeFault};
use crate::interop::{Arity, NativeFloat, NativeValue};

/// Longest list `range` will build
pub const MAX_RANGE: i64 = 1 << 20;

/// Names bound by `install`
pub const PRELUDE: &[&str] = &[
    "concat", "identity", "length", "range", "reverse", "sum", "typeof",
];

pub fn install(runtime: &mut HostRuntime) {
    runtime.define_fn("identity", Arity::Exact(1), |args| Ok(args[0].clone()));

    runtime.define_fn("typeof", Arity::Exact(1), |args| {
        Ok(NativeValue::string(args[0].kind_name()))
    });

    runtime.define_fn("length", Arity::Exact(1), |args| match &args[0] {
        NativeValue::List(list) => Ok(NativeValue::int(list.len() as i64)),
        NativeValue::Str(s) => Ok(NativeValue::int(s.chars().count() as i64)),
        other => Err(no_method("length", other)),
    });

    runtime.define_fn("sum", Arity::Exact(1), |args| match &args[0] {
        NativeValue::List(list) => sum(&list.snapshot()),
        other => Err(no_method("sum", other)),
    });

    runtime.define_fn("concat", Arity::AtLeast(0), |args| {
        let mut out = String::new();
        for arg in args {
            match arg {
                NativeValue::Str(s) => out.push_str(s),
                other => return Err(no_method("concat", other)),
            }
        }
        Ok(NativeValue::Str(out))
    });

    runtime.define_fn("reverse", Arity::Exact(1), |args| match &args[0] {
        NativeValue::List(list) => {
            let mut items = list.snapshot();
            items.reverse();
            Ok(NativeValue::list(items))
        }
        other => Err(no_method("reverse", other)),
    });

    runtime.define_fn("range", Arity::Exact(1), |args| match &args[0] {
        NativeValue::Int(n) => {
            let n = n
                .to_i64()
                .filter(|n| *n >= 0)
                .ok_or_else(|| RuntimeFault::exception(format!("range: invalid length {}", n)))?;
            if n > MAX_RANGE {
                return Err(RuntimeFault::exception(format!(
                    "range: length {} exceeds the limit of {}",
                    n, MAX_RANGE
                )));
            }
            Ok(NativeValue::list((0..n).map(NativeValue::int).collect()))
        }
        other => Err(no_method("range", other)),
    });
}

fn no_method(function: &str, arg: &NativeValue) -> RuntimeFault {
    RuntimeFault::exception(format!(
        "no method matching {}(::{})",
        function,
        arg.kind_name()
    ))
}

fn sum(items: &[NativeValue]) -> Result<NativeValue, RuntimeFault> {
    let mut int_total: i64 = 0;
    let mut float_total: Option<f64> = None;

    for item in items {
        match item {
            NativeValue::Int(i) => {
                let v = i
                    .to_i64()
                    .ok_or_else(|| RuntimeFault::exception(format!("sum: {} out of range", i)))?;
                match float_total.as_mut() {
                    Some(total) => *total += v as f64,
                    None => {
                        int_total = int_total
                            .checked_add(v)
                            .ok_or_else(|| RuntimeFault::exception("sum: integer overflow"))?;
                    }
                }
            }
            NativeValue::Float(f) => {
                let total = float_total.get_or_insert(int_total as f64);
                *total += f.to_f64();
            }
            other => return Err(no_method("+", other)),
        }
    }

    Ok(match float_total {
        Some(total) => NativeValue::Float(NativeFloat::F64(total)),
        None => NativeValue::int(int_total),
    })
}
