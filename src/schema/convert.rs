//! Converter resolution.
//!
//! Lookup order for a `(from, to)` pair:
//!
//! 1. the first layer holding a rule for the exact pair;
//! 2. a rule lifted over optional wrappers from a rule for the unwrapped
//!    types, guarded against absent inputs;
//! 3. the built-in identity and widening table.
//!
//! Only rules found in layer 0 keep their compiled callable. Anything else
//! comes back as an expression and is compiled by the caller.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::MappingSchema;
use crate::builtin;
use crate::error::{ConfigError, ConvertError, MappingError, MappingResult};
use crate::expr::{ConvertExpression, ConvertFn, Expr, Parameter};
use crate::layer::ConvertRule;
use crate::types::{DataType, Mappable};
use crate::value::Value;

/// A compiled conversion between two statically known types.
pub struct Converter<F, T> {
    inner: ConvertFn,
    _types: PhantomData<fn(F) -> T>,
}

impl<F: Mappable, T: Mappable> Converter<F, T> {
    fn new(inner: ConvertFn) -> Self {
        Self {
            inner,
            _types: PhantomData,
        }
    }

    /// Converts one value.
    ///
    /// # Errors
    ///
    /// Propagates whatever the underlying conversion raises, for example a
    /// [`ConvertError::Format`] from a culture parser.
    pub fn convert(&self, value: F) -> Result<T, ConvertError> {
        let out = (self.inner)(&value.into_value())?;
        T::from_value(out)
    }

    /// The untyped callable behind this converter.
    pub fn as_convert_fn(&self) -> &ConvertFn {
        &self.inner
    }
}

impl<F, T> Clone for Converter<F, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _types: PhantomData,
        }
    }
}

impl<F: Mappable, T: Mappable> fmt::Debug for Converter<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("from", &F::data_type())
            .field("to", &T::data_type())
            .finish_non_exhaustive()
    }
}

/// Guards a conversion against absent input.
///
/// Optional parameters are tested with `HasValue`, reference parameters with
/// `NotNull`; the miss branch is the default placeholder of the result type.
/// Primitive parameters are left alone.
fn add_null_check(expr: ConvertExpression) -> ConvertExpression {
    let ty = expr.from_type().clone();
    if ty.is_primitive() {
        return expr;
    }

    let (parameter, body) = expr.into_parts();
    let test = if ty.is_optional() {
        Expr::has_value(parameter.to_expr())
    } else {
        Expr::not_null(parameter.to_expr())
    };
    let default = Expr::DefaultValue(body.ty());
    ConvertExpression::new(parameter, Expr::condition(test, body, default))
}

/// Re-parameterizes `inner` over the optional type `from`, unwrapping the new
/// parameter wherever the old one was used.
fn rebind_unwrapped(inner: &ConvertExpression, from: &DataType) -> (Parameter, Expr) {
    let parameter = Parameter::new(inner.parameter().name(), from.clone());
    let unwrapped = Expr::convert(parameter.to_expr(), from.underlying().clone());
    let body = inner.body().replace_parameter(inner.parameter(), &unwrapped);
    (parameter, body)
}

impl MappingSchema {
    /// Resolves the rule for `(from, to)`.
    ///
    /// `create` enables lifting over optional wrappers. Nested lookups made
    /// while lifting never lift again.
    pub(crate) fn find_rule(&self, from: &DataType, to: &DataType, create: bool) -> Option<ConvertRule> {
        for (depth, layer) in self.layers.iter().enumerate() {
            if let Some(rule) = layer.converters().get(from, to) {
                tracing::trace!(%from, %to, depth, "conversion rule hit");
                return Some(if depth == 0 { rule } else { rule.without_compiled() });
            }
        }

        // Identity is never lifted: an absent optional must stay absent.
        if create && from != to {
            if let Some(lifted) = self.lift(from, to) {
                tracing::debug!(%from, %to, "synthesized lifted conversion");
                return Some(ConvertRule::expression_only(add_null_check(lifted)));
            }
        }

        let fallback = builtin::convert_expression(from, to);
        if fallback.is_some() {
            tracing::debug!(%from, %to, "using built-in conversion");
        }
        fallback.map(ConvertRule::expression_only)
    }

    fn lift(&self, from: &DataType, to: &DataType) -> Option<ConvertExpression> {
        let ufrom = from.underlying();
        let uto = to.underlying();

        if from.is_optional() {
            if let Some(rule) = self.find_rule(ufrom, to, false) {
                let (parameter, body) = rebind_unwrapped(&rule.expression, from);
                return Some(ConvertExpression::new(parameter, body));
            }
            if to.is_optional() {
                if let Some(rule) = self.find_rule(ufrom, uto, false) {
                    let (parameter, body) = rebind_unwrapped(&rule.expression, from);
                    return Some(ConvertExpression::new(parameter, Expr::convert(body, to.clone())));
                }
            }
            return None;
        }

        if to.is_optional() {
            let rule = self.find_rule(from, uto, false)?;
            let (parameter, body) = rule.expression.into_parts();
            return Some(ConvertExpression::new(parameter, Expr::convert(body, to.clone())));
        }

        None
    }

    /// Replaces every default placeholder with this schema's default value.
    #[must_use]
    pub fn reduce_default_values(&self, expr: &ConvertExpression) -> ConvertExpression {
        expr.transform_body(&mut |e| match e {
            Expr::DefaultValue(ty) => Some(Expr::Constant {
                value: self.default_value(ty),
                ty: ty.clone(),
            }),
            _ => None,
        })
    }

    /// The reduced conversion expression for a runtime type pair.
    ///
    /// Returns `None` when no conversion exists.
    #[must_use]
    pub fn convert_expression(&self, from: &DataType, to: &DataType) -> Option<ConvertExpression> {
        self.find_rule(from, to, true)
            .map(|rule| self.reduce_default_values(&rule.expression))
    }

    /// Typed variant of [`MappingSchema::convert_expression`].
    #[must_use]
    pub fn get_convert_expression<F: Mappable, T: Mappable>(&self) -> Option<ConvertExpression> {
        self.convert_expression(&F::data_type(), &T::data_type())
    }

    /// A ready-to-call converter from `F` to `T`.
    ///
    /// The first call compiles the conversion and caches the callable in this
    /// schema's own layer; later calls return the cached callable.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::NoConversion`] when no rule exists for the pair,
    /// or the compilation error if the expression cannot be compiled.
    pub fn get_converter<F: Mappable, T: Mappable>(&self) -> MappingResult<Converter<F, T>> {
        let from = F::data_type();
        let to = T::data_type();
        let rule = self
            .find_rule(&from, &to, true)
            .ok_or_else(|| MappingError::no_conversion(&from, &to))?;

        if let Some(compiled) = rule.compiled {
            return Ok(Converter::new(compiled));
        }

        let compiled = self.reduce_default_values(&rule.expression).compile()?;
        tracing::trace!(%from, %to, "caching compiled conversion");
        self.own_layer()
            .converters()
            .set(from, to, ConvertRule::new(rule.expression, Some(Arc::clone(&compiled))));
        Ok(Converter::new(compiled))
    }

    /// A callable conversion for a runtime type pair. Nothing is cached.
    ///
    /// # Errors
    ///
    /// Same as [`MappingSchema::get_converter`].
    pub fn converter_for(&self, from: &DataType, to: &DataType) -> MappingResult<ConvertFn> {
        let rule = self
            .find_rule(from, to, true)
            .ok_or_else(|| MappingError::no_conversion(from, to))?;
        match rule.compiled {
            Some(compiled) => Ok(compiled),
            None => Ok(self.reduce_default_values(&rule.expression).compile()?),
        }
    }

    /// Registers a conversion from `F` to `T` in this schema.
    ///
    /// With `add_null_check`, absent inputs map to the default value of `T`,
    /// unless `expr` already contains a default placeholder.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ExpressionTypeMismatch`] if `expr` does not
    /// convert `F` to `T`.
    pub fn set_convert_expression<F: Mappable, T: Mappable>(
        &self,
        expr: ConvertExpression,
        add_null_check: bool,
    ) -> Result<(), ConfigError> {
        self.set_convert_expression_for(F::data_type(), T::data_type(), expr, add_null_check)
    }

    /// Registers a conversion for a runtime type pair in this schema.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ExpressionTypeMismatch`] if `expr` does not
    /// convert `from` to `to`.
    pub fn set_convert_expression_for(
        &self,
        from: DataType,
        to: DataType,
        expr: ConvertExpression,
        add_null_check: bool,
    ) -> Result<(), ConfigError> {
        let actual_to = expr.to_type();
        if expr.from_type() != &from || actual_to != to {
            return Err(ConfigError::ExpressionTypeMismatch {
                expected_from: from,
                expected_to: to,
                actual_from: expr.from_type().clone(),
                actual_to,
            });
        }

        let expr = if add_null_check && !expr.contains_default_placeholder() {
            self::add_null_check(expr)
        } else {
            expr
        };
        tracing::trace!(%from, %to, "registered conversion expression");
        self.own_layer()
            .converters()
            .set(from, to, ConvertRule::expression_only(expr));
        Ok(())
    }

    /// Registers a plain Rust function as the conversion from `F` to `T`.
    ///
    /// The function is stored both as an opaque call and as a ready callable.
    pub fn set_converter<F, T, C>(&self, f: C)
    where
        F: Mappable,
        T: Mappable,
        C: Fn(F) -> T + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let call = Arc::clone(&f);
        let expr = ConvertExpression::unary("converter", move |v: F| call(v));
        let compiled: ConvertFn = Arc::new(move |v: &Value| -> Result<Value, ConvertError> {
            Ok(f(F::from_value(v.clone())?).into_value())
        });

        tracing::trace!(from = %F::data_type(), to = %T::data_type(), "registered converter function");
        self.own_layer().converters().set(
            F::data_type(),
            T::data_type(),
            ConvertRule::new(expr, Some(compiled)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_i32(s: String) -> Result<i32, ConvertError> {
        s.trim().parse().map_err(|e: std::num::ParseIntError| ConvertError::Format {
            input: s.clone(),
            ty: DataType::I32,
            profile: "test".to_string(),
            reason: e.to_string(),
        })
    }

    fn with_int_rules() -> MappingSchema {
        let schema = MappingSchema::new();
        schema
            .set_convert_expression::<i32, String>(ConvertExpression::unary("to_string", |v: i32| v.to_string()), true)
            .unwrap();
        schema
            .set_convert_expression::<String, i32>(ConvertExpression::try_unary("parse", parse_i32), true)
            .unwrap();
        schema
    }

    #[test]
    fn test_direct_rule() {
        let schema = with_int_rules();
        let c = schema.get_converter::<i32, String>().unwrap();
        assert_eq!(c.convert(42).unwrap(), "42");
    }

    #[test]
    fn test_lift_optional_source() {
        let schema = with_int_rules();
        let c = schema.get_converter::<Option<i32>, String>().unwrap();
        assert_eq!(c.convert(Some(5)).unwrap(), "5");
        assert_eq!(c.convert(None).unwrap(), "");
    }

    #[test]
    fn test_lifted_expression_shape() {
        let schema = with_int_rules();
        let rule = schema
            .find_rule(&DataType::optional(DataType::I32), &DataType::String, true)
            .unwrap();
        assert!(rule.compiled.is_none());
        assert_eq!(
            rule.expression.to_string(),
            "|p: Option<i32>| (p.is_some() ? to_string((p as i32)) : default(String))"
        );

        let reduced = schema
            .convert_expression(&DataType::optional(DataType::I32), &DataType::String)
            .unwrap();
        assert!(!reduced.contains_default_placeholder());
    }

    #[test]
    fn test_lift_both_optional() {
        let schema = MappingSchema::with_parents(&[]);
        let f = schema
            .converter_for(&DataType::optional(DataType::I32), &DataType::optional(DataType::I64))
            .unwrap();
        assert_eq!(f(&Value::I32(2)).unwrap(), Value::I64(2));
        assert_eq!(f(&Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_optional_identity_keeps_absent() {
        let schema = MappingSchema::with_parents(&[]);
        schema.set_default_value::<Option<i32>>(Some(1));

        let expr = schema
            .convert_expression(&DataType::optional(DataType::I32), &DataType::optional(DataType::I32))
            .unwrap();
        assert_eq!(expr.to_string(), "|p: Option<i32>| p");

        let c = schema.get_converter::<Option<i32>, Option<i32>>().unwrap();
        assert_eq!(c.convert(None).unwrap(), None);
        assert_eq!(c.convert(Some(4)).unwrap(), Some(4));
    }

    #[test]
    fn test_lift_optional_target() {
        let schema = with_int_rules();
        let c = schema.get_converter::<String, Option<i32>>().unwrap();
        assert_eq!(c.convert("7".to_string()).unwrap(), Some(7));

        let widen = schema
            .converter_for(&DataType::I32, &DataType::optional(DataType::I64))
            .unwrap();
        assert_eq!(widen(&Value::I32(3)).unwrap(), Value::I64(3));
    }

    #[test]
    fn test_reference_guard_yields_default() {
        let schema = with_int_rules();
        let f = schema.converter_for(&DataType::String, &DataType::I32).unwrap();
        assert_eq!(f(&Value::Null).unwrap(), Value::I32(0));
        assert_eq!(f(&Value::String("12".into())).unwrap(), Value::I32(12));
    }

    #[test]
    fn test_get_converter_caches_in_own_layer() {
        let schema = with_int_rules();
        let from = DataType::optional(DataType::I32);
        assert!(!schema.own_layer().converters().contains(&from, &DataType::String));

        let first = schema.get_converter::<Option<i32>, String>().unwrap();
        let cached = schema.own_layer().converters().get(&from, &DataType::String).unwrap();
        assert!(cached.compiled.is_some());
        assert!(cached.expression.contains_default_placeholder());

        let second = schema.get_converter::<Option<i32>, String>().unwrap();
        assert!(Arc::ptr_eq(first.as_convert_fn(), second.as_convert_fn()));
    }

    #[test]
    fn test_converter_for_does_not_cache() {
        let schema = with_int_rules();
        let from = DataType::optional(DataType::I32);
        schema.converter_for(&from, &DataType::String).unwrap();
        assert!(!schema.own_layer().converters().contains(&from, &DataType::String));
    }

    #[test]
    fn test_inherited_rule_loses_compiled_callable() {
        let parent = with_int_rules();
        parent.get_converter::<i32, String>().unwrap();
        assert!(parent.find_rule(&DataType::I32, &DataType::String, false).unwrap().compiled.is_some());

        let child = MappingSchema::with_parents(&[&parent]);
        let rule = child.find_rule(&DataType::I32, &DataType::String, false).unwrap();
        assert!(rule.compiled.is_none());
    }

    #[test]
    fn test_own_rule_shadows_parent() {
        let parent = with_int_rules();
        let child = MappingSchema::with_parents(&[&parent]);
        child
            .set_convert_expression::<i32, String>(ConvertExpression::unary("hex", |v: i32| format!("{v:x}")), true)
            .unwrap();

        assert_eq!(child.get_converter::<i32, String>().unwrap().convert(255).unwrap(), "ff");
        assert_eq!(parent.get_converter::<i32, String>().unwrap().convert(255).unwrap(), "255");
    }

    #[test]
    fn test_reduction_uses_schema_defaults() {
        let parent = with_int_rules();
        let child = MappingSchema::with_parents(&[&parent]);
        child.set_default_value("n/a".to_string());

        let c = child.get_converter::<Option<i32>, String>().unwrap();
        assert_eq!(c.convert(None).unwrap(), "n/a");
        let c = parent.get_converter::<Option<i32>, String>().unwrap();
        assert_eq!(c.convert(None).unwrap(), "");
    }

    #[test]
    fn test_no_conversion() {
        let schema = MappingSchema::new();
        let err = schema.get_converter::<i32, bool>().unwrap_err();
        assert!(err.is_no_conversion());
        assert!(schema.convert_expression(&DataType::I32, &DataType::Bool).is_none());
        assert!(schema.converter_for(&DataType::I32, &DataType::Bool).err().unwrap().is_no_conversion());
    }

    #[test]
    fn test_builtin_identity_and_widening() {
        let schema = MappingSchema::new();
        assert_eq!(schema.get_converter::<i32, i32>().unwrap().convert(9).unwrap(), 9);
        assert_eq!(schema.get_converter::<i16, i64>().unwrap().convert(-9).unwrap(), -9);
    }

    #[test]
    fn test_set_convert_expression_validates_types() {
        let schema = MappingSchema::new();
        let expr = ConvertExpression::unary("to_string", |v: i32| v.to_string());
        let err = schema
            .set_convert_expression_for(DataType::I64, DataType::String, expr, true)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ExpressionTypeMismatch {
                actual_from: DataType::I32,
                expected_from: DataType::I64,
                ..
            }
        ));
        assert!(schema.own_layer().converters().is_empty());
    }

    #[test]
    fn test_guard_skipped_when_placeholder_present() {
        let schema = MappingSchema::new();
        let expr = ConvertExpression::build(DataType::String, "s", |s| {
            Expr::condition(
                Expr::not_null(s.clone()),
                Expr::constant(Value::I32(1), DataType::I32),
                Expr::DefaultValue(DataType::I32),
            )
        });
        schema.set_convert_expression::<String, i32>(expr.clone(), true).unwrap();

        let stored = schema.own_layer().converters().get(&DataType::String, &DataType::I32).unwrap();
        assert_eq!(stored.expression, expr);
    }

    #[test]
    fn test_guard_can_be_disabled() {
        let schema = MappingSchema::new();
        let expr = ConvertExpression::build(DataType::optional(DataType::I32), "v", |v| {
            Expr::convert(v, DataType::I32)
        });
        schema.set_convert_expression::<Option<i32>, i32>(expr, false).unwrap();

        let c = schema.get_converter::<Option<i32>, i32>().unwrap();
        assert_eq!(c.convert(Some(4)).unwrap(), 4);
        assert_eq!(c.convert(None).unwrap_err(), ConvertError::NullValue { ty: DataType::I32 });
    }

    #[test]
    fn test_primitive_source_is_not_guarded() {
        let expr = ConvertExpression::unary("to_string", |v: i32| v.to_string());
        let guarded = add_null_check(expr.clone());
        assert_eq!(guarded, expr);
    }

    #[test]
    fn test_set_converter_is_precompiled_and_liftable() {
        let schema = MappingSchema::new();
        schema.set_converter(|v: i32| format!("#{v}"));

        let rule = schema.find_rule(&DataType::I32, &DataType::String, false).unwrap();
        assert!(rule.compiled.is_some());
        assert_eq!(schema.get_converter::<i32, String>().unwrap().convert(1).unwrap(), "#1");

        let lifted = schema.get_converter::<Option<i32>, String>().unwrap();
        assert_eq!(lifted.convert(Some(2)).unwrap(), "#2");
        assert_eq!(lifted.convert(None).unwrap(), "");
    }

    #[test]
    fn test_format_errors_surface_from_converter() {
        let schema = with_int_rules();
        let c = schema.get_converter::<String, i32>().unwrap();
        assert!(matches!(c.convert("x".to_string()).unwrap_err(), ConvertError::Format { .. }));
    }
}
