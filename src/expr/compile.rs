//! Lowering of reduced expressions into callables.
//!
//! Each node becomes one boxed closure; the closures are assembled once and
//! then evaluated without walking the tree again.

use std::sync::Arc;

use super::{ConvertExpression, Expr, ParameterId};
use crate::error::ConvertError;
use crate::value::Value;

/// A compiled, invocable conversion over dynamic values.
pub type ConvertFn = Arc<dyn Fn(&Value) -> Result<Value, ConvertError> + Send + Sync>;

type Node = Box<dyn Fn(&Value) -> Result<Value, ConvertError> + Send + Sync>;

impl ConvertExpression {
    /// Compiles the expression into a callable.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::UnreducedPlaceholder`] if the tree still holds
    /// a default-value placeholder. Placeholders must be reduced against a
    /// schema before compilation. A reference to any parameter other than the
    /// lambda's own fails with [`ConvertError::UnboundParameter`].
    pub fn compile(&self) -> Result<ConvertFn, ConvertError> {
        let lowered = lower(&self.body, self.parameter.id)?;
        Ok(Arc::from(lowered))
    }
}

fn node<F>(f: F) -> Node
where
    F: Fn(&Value) -> Result<Value, ConvertError> + Send + Sync + 'static,
{
    Box::new(f)
}

fn lower(expr: &Expr, param: ParameterId) -> Result<Node, ConvertError> {
    let lowered = match expr {
        Expr::Parameter(p) if p.id == param => node(|arg: &Value| Ok(arg.clone())),
        Expr::Parameter(p) => {
            return Err(ConvertError::UnboundParameter {
                name: p.name.clone(),
            });
        }
        Expr::Constant { value, .. } => {
            let value = value.clone();
            node(move |_: &Value| Ok(value.clone()))
        }
        Expr::Call { function, args } => {
            let function = function.clone();
            let args = args
                .iter()
                .map(|a| lower(a, param))
                .collect::<Result<Vec<_>, _>>()?;
            node(move |arg: &Value| {
                let values = args.iter().map(|a| a(arg)).collect::<Result<Vec<_>, _>>()?;
                function.invoke(&values)
            })
        }
        Expr::Condition {
            test,
            if_true,
            if_false,
        } => {
            let test = lower(test, param)?;
            let if_true = lower(if_true, param)?;
            let if_false = lower(if_false, param)?;
            node(move |arg: &Value| match test(arg)? {
                Value::Bool(true) => if_true(arg),
                Value::Bool(false) => if_false(arg),
                other => Err(ConvertError::TypeMismatch {
                    expected: crate::types::DataType::Bool,
                    value_kind: other.type_name(),
                }),
            })
        }
        Expr::Convert { operand, ty } => {
            let operand = lower(operand, param)?;
            let ty = ty.clone();
            node(move |arg: &Value| operand(arg)?.cast(&ty))
        }
        Expr::HasValue(operand) | Expr::NotNull(operand) => {
            let operand = lower(operand, param)?;
            node(move |arg: &Value| Ok(Value::Bool(!operand(arg)?.is_null())))
        }
        Expr::DefaultValue(ty) => {
            return Err(ConvertError::UnreducedPlaceholder { ty: ty.clone() });
        }
    };
    Ok(lowered)
}
