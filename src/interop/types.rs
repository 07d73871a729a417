//! Value types crossing the bridge
//!
//! `DynamicValue` is what the UI scripting layer hands us and gets back.
//! `NativeValue` is the embedded runtime's own value model. The two sets only
//! overlap on scalars, strings and ordered lists.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::runtime::{Callable, RuntimeFault};

/// UI-side dynamic value
///
/// Serialises as plain JSON: `null`, booleans, numbers, strings and arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DynamicValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<DynamicValue>),
}

impl DynamicValue {
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
        }
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_list(&self) -> Option<&[DynamicValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl Default for DynamicValue {
    fn default() -> Self {
        Self::Null
    }
}

impl From<()> for DynamicValue {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl From<bool> for DynamicValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for DynamicValue {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<i64> for DynamicValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for DynamicValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for DynamicValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<DynamicValue>> for DynamicValue {
    fn from(items: Vec<DynamicValue>) -> Self {
        Self::List(items)
    }
}

/// Runtime integer, tagged with its width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeInt {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
}

impl NativeInt {
    /// Narrow to `i64`, `None` when the value does not fit
    pub fn to_i64(self) -> Option<i64> {
        match self {
            Self::I8(v) => v.to_i64(),
            Self::I16(v) => v.to_i64(),
            Self::I32(v) => v.to_i64(),
            Self::I64(v) => Some(v),
            Self::I128(v) => v.to_i64(),
            Self::U8(v) => v.to_i64(),
            Self::U16(v) => v.to_i64(),
            Self::U32(v) => v.to_i64(),
            Self::U64(v) => v.to_i64(),
            Self::U128(v) => v.to_i64(),
        }
    }

    pub const fn type_name(self) -> &'static str {
        match self {
            Self::I8(_) => "Int8",
            Self::I16(_) => "Int16",
            Self::I32(_) => "Int32",
            Self::I64(_) => "Int64",
            Self::I128(_) => "Int128",
            Self::U8(_) => "UInt8",
            Self::U16(_) => "UInt16",
            Self::U32(_) => "UInt32",
            Self::U64(_) => "UInt64",
            Self::U128(_) => "UInt128",
        }
    }
}

impl fmt::Display for NativeInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I8(v) => write!(f, "{}", v),
            Self::I16(v) => write!(f, "{}", v),
            Self::I32(v) => write!(f, "{}", v),
            Self::I64(v) => write!(f, "{}", v),
            Self::I128(v) => write!(f, "{}", v),
            Self::U8(v) => write!(f, "{}", v),
            Self::U16(v) => write!(f, "{}", v),
            Self::U32(v) => write!(f, "{}", v),
            Self::U64(v) => write!(f, "{}", v),
            Self::U128(v) => write!(f, "{}", v),
        }
    }
}

/// Runtime floating-point number
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeFloat {
    F32(f32),
    F64(f64),
}

impl NativeFloat {
    /// Widen to `f64`; exact for both widths
    #[inline]
    pub fn to_f64(self) -> f64 {
        match self {
            Self::F32(v) => f64::from(v),
            Self::F64(v) => v,
        }
    }

    pub const fn type_name(self) -> &'static str {
        match self {
            Self::F32(_) => "Float32",
            Self::F64(_) => "Float64",
        }
    }
}

/// Shared, mutable runtime vector
///
/// Clones alias the same storage, so a list can end up containing itself.
/// Equality is identity.
#[derive(Clone, Default)]
pub struct NativeList(Rc<RefCell<Vec<NativeValue>>>);

impl NativeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<NativeValue>) -> Self {
        Self(Rc::new(RefCell::new(items)))
    }

    pub fn push(&self, value: NativeValue) {
        self.0.borrow_mut().push(value);
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<NativeValue> {
        self.0.borrow().get(index).cloned()
    }

    /// Copy of the current elements. Nested lists stay aliased.
    pub fn snapshot(&self) -> Vec<NativeValue> {
        self.0.borrow().clone()
    }

    /// Identity of the underlying storage
    #[inline]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    #[inline]
    pub fn ptr_eq(&self, other: &NativeList) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for NativeList {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// Elements are not printed: a cyclic list would never terminate.
impl fmt::Debug for NativeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(items) => write!(f, "Vector(len={})", items.len()),
            Err(_) => write!(f, "Vector(<borrowed>)"),
        }
    }
}

/// Number of arguments a runtime function accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    #[inline]
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n,
            Self::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{}", n),
            Self::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

type FunctionBody = dyn Fn(&[NativeValue]) -> Result<NativeValue, RuntimeFault>;

/// Callable runtime function
#[derive(Clone)]
pub struct NativeFunction {
    name: Rc<str>,
    arity: Arity,
    body: Rc<FunctionBody>,
}

impl NativeFunction {
    pub fn new<F>(name: &str, arity: Arity, body: F) -> Self
    where
        F: Fn(&[NativeValue]) -> Result<NativeValue, RuntimeFault> + 'static,
    {
        Self {
            name: Rc::from(name),
            arity,
            body: Rc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }
}

impl Callable for NativeFunction {
    fn invoke(&self, args: Arguments<'_>) -> Result<NativeValue, RuntimeFault> {
        let args = args.as_slice();
        if !self.arity.accepts(args.len()) {
            return Err(RuntimeFault::Arity {
                function: self.name.to_string(),
                expected: self.arity,
                got: args.len(),
            });
        }
        (self.body)(args)
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({}, arity={})", self.name, self.arity)
    }
}

/// Coarse classification of a native value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Null,
    Bool,
    Number,
    String,
    List,
    Other,
}

/// Embedded-runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Nothing,
    Bool(bool),
    Int(NativeInt),
    Float(NativeFloat),
    Str(String),
    List(NativeList),
    Function(NativeFunction),
    /// Any runtime object the bridge has no counterpart for
    Opaque { type_name: String },
}

impl NativeValue {
    #[inline]
    pub fn int(v: i64) -> Self {
        Self::Int(NativeInt::I64(v))
    }

    #[inline]
    pub fn float(v: f64) -> Self {
        Self::Float(NativeFloat::F64(v))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    pub fn list(items: Vec<NativeValue>) -> Self {
        Self::List(NativeList::from_vec(items))
    }

    pub fn opaque(type_name: impl Into<String>) -> Self {
        Self::Opaque {
            type_name: type_name.into(),
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Self::Nothing => Shape::Null,
            Self::Bool(_) => Shape::Bool,
            Self::Int(_) | Self::Float(_) => Shape::Number,
            Self::Str(_) => Shape::String,
            Self::List(_) => Shape::List,
            Self::Function(_) | Self::Opaque { .. } => Shape::Other,
        }
    }

    /// Runtime-side type name, used in diagnostics
    pub fn kind_name(&self) -> &str {
        match self {
            Self::Nothing => "Nothing",
            Self::Bool(_) => "Bool",
            Self::Int(i) => i.type_name(),
            Self::Float(f) => f.type_name(),
            Self::Str(_) => "String",
            Self::List(_) => "Vector",
            Self::Function(_) => "Function",
            Self::Opaque { type_name } => type_name,
        }
    }

    pub fn as_callable(&self) -> Option<&dyn Callable> {
        match self {
            Self::Function(func) => Some(func),
            _ => None,
        }
    }
}

/// Argument convention for one invocation
///
/// `Unit` is a call with no parameter list at all; `List` may still be empty.
#[derive(Debug, Clone, Copy)]
pub enum Arguments<'a> {
    Unit,
    List(&'a [NativeValue]),
}

impl<'a> Arguments<'a> {
    pub fn as_slice(&self) -> &'a [NativeValue] {
        match *self {
            Self::Unit => &[],
            Self::List(args) => args,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub const fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }
}

/// Converted arguments for a single call
pub type CallArguments = SmallVec<[NativeValue; 4]>;
