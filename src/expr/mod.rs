//! Conversion expression trees.
//!
//! A conversion is represented as a single-parameter [`ConvertExpression`]
//! whose body is an [`Expr`] tree. Trees are built unresolved: they may hold
//! [`Expr::DefaultValue`] placeholders that a schema later reduces to
//! concrete constants, and only then are they compiled into a callable.

mod compile;
mod transform;

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::ConvertError;
use crate::types::{DataType, Mappable};
use crate::value::Value;

pub use compile::ConvertFn;

/// Stable identity of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParameterId(Uuid);

impl ParameterId {
    /// Creates a new random parameter ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ParameterId {
    fn default() -> Self {
        Self::new()
    }
}

/// A lambda parameter.
///
/// Two parameters with the same name and type are still distinct; only the
/// ID decides which occurrences a substitution touches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    id: ParameterId,
    name: String,
    ty: DataType,
}

impl Parameter {
    /// Creates a parameter with a fresh identity.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: DataType) -> Self {
        Self {
            id: ParameterId::new(),
            name: name.into(),
            ty,
        }
    }

    /// The identity substitutions match on.
    pub const fn id(&self) -> ParameterId {
        self.id
    }

    /// The display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameter type.
    pub const fn ty(&self) -> &DataType {
        &self.ty
    }

    /// A reference to this parameter as an expression node.
    #[must_use]
    pub fn to_expr(&self) -> Expr {
        Expr::Parameter(self.clone())
    }
}

type NativeFn = dyn Fn(&[Value]) -> Result<Value, ConvertError> + Send + Sync;

/// An opaque native function embedded in an expression.
///
/// The engine can move a call around and rewrite its arguments but never
/// looks inside the function itself.
#[derive(Clone)]
pub struct Function {
    name: String,
    arity: usize,
    return_type: DataType,
    body: Arc<NativeFn>,
}

impl Function {
    /// Wraps a dynamic function taking `arity` arguments.
    pub fn new<F>(name: impl Into<String>, arity: usize, return_type: DataType, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, ConvertError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            return_type,
            body: Arc::new(body),
        }
    }

    /// Wraps a typed unary Rust function.
    pub fn unary<A, R, F>(name: impl Into<String>, f: F) -> Self
    where
        A: Mappable,
        R: Mappable,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self::new(name, 1, R::data_type(), move |args| {
            let arg = args.first().cloned().unwrap_or(Value::Null);
            Ok(f(A::from_value(arg)?).into_value())
        })
    }

    /// Wraps a typed unary Rust function that can fail.
    pub fn try_unary<A, R, F>(name: impl Into<String>, f: F) -> Self
    where
        A: Mappable,
        R: Mappable,
        F: Fn(A) -> Result<R, ConvertError> + Send + Sync + 'static,
    {
        Self::new(name, 1, R::data_type(), move |args| {
            let arg = args.first().cloned().unwrap_or(Value::Null);
            Ok(f(A::from_value(arg)?)?.into_value())
        })
    }

    /// The display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type the function returns.
    pub const fn return_type(&self) -> &DataType {
        &self.return_type
    }

    pub(crate) fn invoke(&self, args: &[Value]) -> Result<Value, ConvertError> {
        if args.len() != self.arity {
            return Err(ConvertError::Arity {
                name: self.name.clone(),
                expected: self.arity,
                actual: args.len(),
            });
        }
        (self.body)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.body, &other.body)
    }
}

/// A node of a conversion expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Reference to a lambda parameter.
    Parameter(Parameter),

    /// A literal value of a given type.
    Constant {
        value: Value,
        ty: DataType,
    },

    /// Invocation of an opaque native function.
    Call {
        function: Function,
        args: Vec<Expr>,
    },

    /// `test ? if_true : if_false`.
    Condition {
        test: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },

    /// Cast of the operand to `ty`.
    Convert {
        operand: Box<Expr>,
        ty: DataType,
    },

    /// Whether an optional operand holds a value.
    HasValue(Box<Expr>),

    /// Whether a reference operand is not the absent sentinel.
    NotNull(Box<Expr>),

    /// Deferred "canonical default of `ty`", resolved against a schema.
    DefaultValue(DataType),
}

impl Expr {
    /// A literal node.
    #[must_use]
    pub fn constant(value: impl Into<Value>, ty: DataType) -> Self {
        Self::Constant {
            value: value.into(),
            ty,
        }
    }

    /// An invocation of `function` with `args`.
    #[must_use]
    pub fn call(function: Function, args: Vec<Self>) -> Self {
        Self::Call { function, args }
    }

    /// A conditional node.
    #[must_use]
    pub fn condition(test: Self, if_true: Self, if_false: Self) -> Self {
        Self::Condition {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    /// A cast of `operand` to `ty`.
    #[must_use]
    pub fn convert(operand: Self, ty: DataType) -> Self {
        Self::Convert {
            operand: Box::new(operand),
            ty,
        }
    }

    /// An optional presence test.
    #[must_use]
    pub fn has_value(operand: Self) -> Self {
        Self::HasValue(Box::new(operand))
    }

    /// A reference presence test.
    #[must_use]
    pub fn not_null(operand: Self) -> Self {
        Self::NotNull(Box::new(operand))
    }

    /// The type this node evaluates to.
    #[must_use]
    pub fn ty(&self) -> DataType {
        match self {
            Self::Parameter(p) => p.ty.clone(),
            Self::Constant { ty, .. } | Self::Convert { ty, .. } | Self::DefaultValue(ty) => ty.clone(),
            Self::Call { function, .. } => function.return_type.clone(),
            Self::Condition { if_true, .. } => if_true.ty(),
            Self::HasValue(_) | Self::NotNull(_) => DataType::Bool,
        }
    }

    /// Whether this node is a default-value placeholder.
    pub const fn is_default_placeholder(&self) -> bool {
        matches!(self, Self::DefaultValue(_))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameter(p) => write!(f, "{}", p.name),
            Self::Constant { value, .. } => write!(f, "{value}"),
            Self::Call { function, args } => {
                write!(f, "{}(", function.name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Self::Condition {
                test,
                if_true,
                if_false,
            } => write!(f, "({test} ? {if_true} : {if_false})"),
            Self::Convert { operand, ty } => write!(f, "({operand} as {ty})"),
            Self::HasValue(operand) => write!(f, "{operand}.is_some()"),
            Self::NotNull(operand) => write!(f, "({operand} != null)"),
            Self::DefaultValue(ty) => write!(f, "default({ty})"),
        }
    }
}

/// A single-parameter conversion lambda.
///
/// # Examples
///
/// ```
/// use mapping_schema::{ConvertExpression, DataType};
///
/// let expr = ConvertExpression::unary("to_string", |v: i32| v.to_string());
/// assert_eq!(expr.from_type(), &DataType::I32);
/// assert_eq!(expr.to_type(), DataType::String);
/// assert_eq!(expr.to_string(), "|p: i32| to_string(p)");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertExpression {
    parameter: Parameter,
    body: Expr,
}

impl ConvertExpression {
    /// Pairs a parameter with a body.
    #[must_use]
    pub const fn new(parameter: Parameter, body: Expr) -> Self {
        Self { parameter, body }
    }

    /// Builds a lambda with a fresh parameter of type `from`.
    pub fn build(from: DataType, name: impl Into<String>, body: impl FnOnce(Expr) -> Expr) -> Self {
        let parameter = Parameter::new(name, from);
        let body = body(parameter.to_expr());
        Self { parameter, body }
    }

    /// `|p| f(p)` for a typed Rust function.
    pub fn unary<A, R, F>(name: impl Into<String>, f: F) -> Self
    where
        A: Mappable,
        R: Mappable,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        let function = Function::unary(name, f);
        Self::build(A::data_type(), "p", |p| Expr::call(function, vec![p]))
    }

    /// `|p| f(p)` for a typed Rust function that can fail.
    pub fn try_unary<A, R, F>(name: impl Into<String>, f: F) -> Self
    where
        A: Mappable,
        R: Mappable,
        F: Fn(A) -> Result<R, ConvertError> + Send + Sync + 'static,
    {
        let function = Function::try_unary(name, f);
        Self::build(A::data_type(), "p", |p| Expr::call(function, vec![p]))
    }

    /// The lambda parameter.
    pub const fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    /// The lambda body.
    pub const fn body(&self) -> &Expr {
        &self.body
    }

    /// The source type, the type of the parameter.
    pub const fn from_type(&self) -> &DataType {
        &self.parameter.ty
    }

    /// The target type, the type of the body.
    #[must_use]
    pub fn to_type(&self) -> DataType {
        self.body.ty()
    }

    /// Splits the lambda into parameter and body.
    pub fn into_parts(self) -> (Parameter, Expr) {
        (self.parameter, self.body)
    }

    /// Whether a default-value placeholder appears anywhere in the body.
    #[must_use]
    pub fn contains_default_placeholder(&self) -> bool {
        self.body.find(&|e: &Expr| e.is_default_placeholder()).is_some()
    }

    /// Structural equality up to renaming of the parameter.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        if self.parameter.ty != other.parameter.ty {
            return false;
        }
        let renamed = other.body.replace_parameter(&other.parameter, &self.parameter.to_expr());
        renamed == self.body
    }
}

impl fmt::Display for ConvertExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|{}: {}| {}", self.parameter.name, self.parameter.ty, self.body)
    }
}
