//! Script-space values as seen by the scheduler bridge
//!
//! The embedding runtime owns its full value model; the bridge only needs to
//! tell callables from other values, ask a callable for its declared arity,
//! call it, and read tick counts out of numeric arguments.

use std::fmt;
use std::sync::Arc;

use crate::runtime::bridge::{BridgeError, ScriptTask};

/// Errors raised by script callables.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScriptError {
    /// Error raised by the script itself.
    #[error("{0}")]
    Runtime(String),
    /// A scheduler call made from script failed.
    #[error(transparent)]
    Scheduler(#[from] BridgeError),
}

/// Why a value is not a tick count.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TickCoercionError {
    #[error("number expected, got {0}")]
    NotANumber(&'static str),
    #[error("number has no integer representation")]
    NotAnInteger,
    #[error("non-negative tick count expected, got {0}")]
    Negative(i64),
}

/// Declared parameter count of a callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Variadic,
}

impl Arity {
    /// Only a callable declaring exactly one parameter is handed its task.
    ///
    /// Every other arity (0, 2+, variadic) is called with no arguments.
    #[inline]
    pub fn receives_handle(&self) -> bool {
        matches!(self, Arity::Fixed(1))
    }
}

impl fmt::Display for Arity {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{}", n),
            Arity::Variadic => write!(f, "..."),
        }
    }
}

/// A callable script value.
pub trait ScriptFunction: Send + Sync {
    /// Declared parameter count, as written in the script.
    fn declared_arity(&self) -> Arity;

    /// Invoke with positional arguments.
    fn call(
        &self,
        args: &[ScriptValue],
    ) -> Result<ScriptValue, ScriptError>;

    /// Name used in diagnostics.
    fn name(&self) -> &str {
        "<anonymous>"
    }
}

type NativeBody = dyn Fn(&[ScriptValue]) -> Result<ScriptValue, ScriptError> + Send + Sync;

/// A callable backed by a Rust closure.
pub struct NativeFunction {
    name: String,
    arity: Arity,
    body: Box<NativeBody>,
}

impl NativeFunction {
    pub fn new<F>(
        name: impl Into<String>,
        arity: Arity,
        body: F,
    ) -> Self
    where
        F: Fn(&[ScriptValue]) -> Result<ScriptValue, ScriptError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            body: Box::new(body),
        }
    }

    /// Wrap into a script value.
    #[inline]
    pub fn into_value(self) -> ScriptValue {
        ScriptValue::Function(Arc::new(self))
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl ScriptFunction for NativeFunction {
    fn declared_arity(&self) -> Arity {
        self.arity
    }

    fn call(
        &self,
        args: &[ScriptValue],
    ) -> Result<ScriptValue, ScriptError> {
        (self.body)(args)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A value crossing the script/host boundary.
#[derive(Clone, Default)]
pub enum ScriptValue {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Arc<str>),
    Function(Arc<dyn ScriptFunction>),
    /// A scheduled task handle.
    Task(ScriptTask),
}

impl ScriptValue {
    /// Script-level type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Nil => "nil",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Int(_) | ScriptValue::Float(_) => "number",
            ScriptValue::String(_) => "string",
            ScriptValue::Function(_) => "function",
            ScriptValue::Task(_) => "task",
        }
    }

    #[inline]
    pub fn is_callable(&self) -> bool {
        matches!(self, ScriptValue::Function(_))
    }

    #[inline]
    pub fn as_function(&self) -> Option<&Arc<dyn ScriptFunction>> {
        match self {
            ScriptValue::Function(f) => Some(f),
            _ => None,
        }
    }

    #[inline]
    pub fn as_task(&self) -> Option<&ScriptTask> {
        match self {
            ScriptValue::Task(t) => Some(t),
            _ => None,
        }
    }

    pub fn to_int(&self) -> Option<i64> {
        match self {
            ScriptValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn to_bool(&self) -> Option<bool> {
        match self {
            ScriptValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Read a tick count.
    ///
    /// Accepts integers, floats with an exact integer value and numeric
    /// strings; rejects anything negative.
    pub fn to_ticks(&self) -> Result<u64, TickCoercionError> {
        let n = match self {
            ScriptValue::Int(n) => *n,
            ScriptValue::Float(f) => float_to_int(*f)?,
            ScriptValue::String(s) => {
                let s = s.trim();
                match s.parse::<i64>() {
                    Ok(n) => n,
                    Err(_) => match s.parse::<f64>() {
                        Ok(f) => float_to_int(f)?,
                        Err(_) => return Err(TickCoercionError::NotANumber("string")),
                    },
                }
            }
            other => return Err(TickCoercionError::NotANumber(other.type_name())),
        };
        u64::try_from(n).map_err(|_| TickCoercionError::Negative(n))
    }
}

fn float_to_int(f: f64) -> Result<i64, TickCoercionError> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Ok(f as i64)
    } else {
        Err(TickCoercionError::NotAnInteger)
    }
}

impl fmt::Debug for ScriptValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ScriptValue::Nil => write!(f, "Nil"),
            ScriptValue::Bool(b) => write!(f, "Bool({})", b),
            ScriptValue::Int(n) => write!(f, "Int({})", n),
            ScriptValue::Float(x) => write!(f, "Float({})", x),
            ScriptValue::String(s) => write!(f, "String({:?})", s),
            ScriptValue::Function(func) => write!(
                f,
                "Function({}/{})",
                func.name(),
                func.declared_arity()
            ),
            ScriptValue::Task(task) => write!(f, "{:?}", task),
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ScriptValue::Nil => write!(f, "nil"),
            ScriptValue::Bool(b) => write!(f, "{}", b),
            ScriptValue::Int(n) => write!(f, "{}", n),
            ScriptValue::Float(x) => write!(f, "{}", x),
            ScriptValue::String(s) => write!(f, "{}", s),
            ScriptValue::Function(func) => write!(f, "function: {}", func.name()),
            ScriptValue::Task(task) => write!(f, "task: {}", task.task_id()),
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        ScriptValue::Bool(b)
    }
}

impl From<i64> for ScriptValue {
    fn from(n: i64) -> Self {
        ScriptValue::Int(n)
    }
}

impl From<f64> for ScriptValue {
    fn from(x: f64) -> Self {
        ScriptValue::Float(x)
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        ScriptValue::String(Arc::from(s))
    }
}

impl From<NativeFunction> for ScriptValue {
    fn from(f: NativeFunction) -> Self {
        f.into_value()
    }
}

impl From<ScriptTask> for ScriptValue {
    fn from(task: ScriptTask) -> Self {
        ScriptValue::Task(task)
    }
}
