//! Value marshaling - UI dynamic values ↔ runtime native values
//!
//! `to_native` is total: every dynamic value has a native counterpart.
//! `to_dynamic` is partial: results come from arbitrary runtime code and are
//! validated on the way out.

use std::collections::HashSet;
use std::fmt;

use super::types::{
    CallArguments, DynamicValue, NativeFloat, NativeInt, NativeList, NativeValue,
};

/// Location of an element inside a nested value, printed as `$[2][0]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValuePath(Vec<usize>);

impl ValuePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<usize>> for ValuePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for index in &self.0 {
            write!(f, "[{}]", index)?;
        }
        Ok(())
    }
}

/// Native → dynamic conversion failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    UnsupportedShape { kind: String, path: ValuePath },
    CyclicStructure { path: ValuePath },
    NumericOverflow {
        value: String,
        source_type: &'static str,
        path: ValuePath,
    },
}

impl ConversionError {
    pub fn path(&self) -> &ValuePath {
        match self {
            Self::UnsupportedShape { path, .. }
            | Self::CyclicStructure { path }
            | Self::NumericOverflow { path, .. } => path,
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedShape { kind, path } => {
                write!(f, "runtime value of kind {} at {} has no dynamic representation", kind, path)
            }
            Self::CyclicStructure { path } => {
                write!(f, "list at {} contains itself", path)
            }
            Self::NumericOverflow {
                value,
                source_type,
                path,
            } => {
                write!(f, "{} value {} at {} does not fit in a 64-bit integer", source_type, value, path)
            }
        }
    }
}

impl std::error::Error for ConversionError {}

/// Bidirectional converter between the two value systems
///
/// Holds no state between calls; each conversion starts fresh.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueBridge;

impl ValueBridge {
    pub const fn new() -> Self {
        Self
    }

    /// Convert a dynamic value into the runtime's representation
    pub fn to_native(&self, value: &DynamicValue) -> NativeValue {
        match value {
            DynamicValue::Null => NativeValue::Nothing,
            DynamicValue::Bool(b) => NativeValue::Bool(*b),
            DynamicValue::Int(i) => NativeValue::Int(NativeInt::I64(*i)),
            DynamicValue::Float(f) => NativeValue::Float(NativeFloat::F64(*f)),
            DynamicValue::String(s) => NativeValue::Str(s.clone()),
            DynamicValue::List(items) => NativeValue::List(NativeList::from_vec(
                items.iter().map(|item| self.to_native(item)).collect(),
            )),
        }
    }

    /// Convert a UI argument list, preserving order
    pub fn to_native_args(&self, args: &[DynamicValue]) -> CallArguments {
        args.iter().map(|arg| self.to_native(arg)).collect()
    }

    /// Convert a runtime value back into a dynamic value
    pub fn to_dynamic(&self, value: &NativeValue) -> Result<DynamicValue, ConversionError> {
        Descent::default().convert(value)
    }
}

/// State of one `to_dynamic` walk
#[derive(Default)]
struct Descent {
    // Lists currently being converted, by storage identity
    active: HashSet<usize>,
    path: Vec<usize>,
}

impl Descent {
    fn convert(&mut self, value: &NativeValue) -> Result<DynamicValue, ConversionError> {
        match value {
            NativeValue::Nothing => Ok(DynamicValue::Null),
            NativeValue::Bool(b) => Ok(DynamicValue::Bool(*b)),
            NativeValue::Int(i) => match i.to_i64() {
                Some(v) => Ok(DynamicValue::Int(v)),
                None => Err(ConversionError::NumericOverflow {
                    value: i.to_string(),
                    source_type: i.type_name(),
                    path: self.path(),
                }),
            },
            NativeValue::Float(f) => Ok(DynamicValue::Float(f.to_f64())),
            NativeValue::Str(s) => Ok(DynamicValue::String(s.clone())),
            NativeValue::List(list) => self.convert_list(list),
            NativeValue::Function(_) | NativeValue::Opaque { .. } => {
                Err(ConversionError::UnsupportedShape {
                    kind: value.kind_name().to_string(),
                    path: self.path(),
                })
            }
        }
    }

    fn convert_list(&mut self, list: &NativeList) -> Result<DynamicValue, ConversionError> {
        let id = list.id();
        if !self.active.insert(id) {
            return Err(ConversionError::CyclicStructure { path: self.path() });
        }

        let items = list.snapshot();
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            self.path.push(index);
            let converted = self.convert(item);
            self.path.pop();
            out.push(converted?);
        }

        self.active.remove(&id);
        Ok(DynamicValue::List(out))
    }

    fn path(&self) -> ValuePath {
        ValuePath(self.path.clone())
    }
}
