//! Process-wide built-in tables.
//!
//! These are the last resort of every lookup: the canonical default value of
//! a type when no layer overrides it, and the universally expected identity
//! and widening conversions when no layer registers or synthesizes one.

use chrono::{NaiveDate, NaiveDateTime};

use crate::expr::{ConvertExpression, Expr};
use crate::types::DataType;
use crate::value::Value;

fn min_date_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// The built-in default of `ty`.
///
/// Zero for numerics, `false`, the empty string, `0001-01-01T00:00:00` for
/// date-times and the absent value for optional and named types.
#[must_use]
pub fn default_value(ty: &DataType) -> Value {
    match ty {
        DataType::Bool => Value::Bool(false),
        DataType::I8 => Value::I8(0),
        DataType::I16 => Value::I16(0),
        DataType::I32 => Value::I32(0),
        DataType::I64 => Value::I64(0),
        DataType::U8 => Value::U8(0),
        DataType::U16 => Value::U16(0),
        DataType::U32 => Value::U32(0),
        DataType::U64 => Value::U64(0),
        DataType::F32 => Value::F32(0.0),
        DataType::F64 => Value::F64(0.0),
        DataType::String => Value::String(String::new()),
        DataType::DateTime => Value::DateTime(min_date_time()),
        DataType::DateTimeOffset => Value::DateTimeOffset(min_date_time().and_utc().fixed_offset()),
        DataType::Named(_) | DataType::Optional(_) => Value::Null,
    }
}

/// Lossless widening between primitive types.
fn widens(from: &DataType, to: &DataType) -> bool {
    use DataType::{DateTime, DateTimeOffset, F32, F64, I16, I32, I64, I8, U16, U32, U64, U8};

    matches!(
        (from, to),
        (I8, I16 | I32 | I64 | F32 | F64)
            | (I16, I32 | I64 | F32 | F64)
            | (I32, I64 | F64)
            | (U8, U16 | U32 | U64 | I16 | I32 | I64 | F32 | F64)
            | (U16, U32 | U64 | I32 | I64 | F32 | F64)
            | (U32, U64 | I64 | F64)
            | (F32, F64)
            | (DateTime, DateTimeOffset)
    )
}

/// The built-in conversion from `from` to `to`, if one exists.
///
/// Covers identity for every type and lossless widening between primitives.
#[must_use]
pub fn convert_expression(from: &DataType, to: &DataType) -> Option<ConvertExpression> {
    if from == to {
        return Some(ConvertExpression::build(from.clone(), "p", |p| p));
    }

    if widens(from, to) {
        return Some(ConvertExpression::build(from.clone(), "p", |p| {
            Expr::convert(p, to.clone())
        }));
    }

    None
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(default_value(&DataType::I32), Value::I32(0));
        assert_eq!(default_value(&DataType::Bool), Value::Bool(false));
        assert_eq!(default_value(&DataType::String), Value::String(String::new()));
        assert_eq!(default_value(&DataType::optional(DataType::I32)), Value::Null);
        assert_eq!(default_value(&DataType::named("Customer")), Value::Null);
    }

    #[test]
    fn test_default_date_time_is_year_one() {
        let Value::DateTime(dt) = default_value(&DataType::DateTime) else {
            panic!("expected date time");
        };
        assert_eq!((dt.year(), dt.month(), dt.day()), (1, 1, 1));
        assert_eq!(dt.hour(), 0);

        let Value::DateTimeOffset(dto) = default_value(&DataType::DateTimeOffset) else {
            panic!("expected date time offset");
        };
        assert_eq!(dto.naive_utc(), dt);
    }

    #[test]
    fn test_identity_for_any_type() {
        let ty = DataType::named("Order");
        let expr = convert_expression(&ty, &ty).unwrap();
        assert_eq!(expr.to_string(), "|p: Order| p");

        let opt = DataType::optional(DataType::I32);
        assert!(convert_expression(&opt, &opt).is_some());
    }

    #[test]
    fn test_widening() {
        let expr = convert_expression(&DataType::I32, &DataType::I64).unwrap();
        let f = expr.compile().unwrap();
        assert_eq!(f(&Value::I32(-3)).unwrap(), Value::I64(-3));

        assert!(convert_expression(&DataType::U8, &DataType::I16).is_some());
        assert!(convert_expression(&DataType::F32, &DataType::F64).is_some());
    }

    #[test]
    fn test_no_narrowing_or_cross_kind() {
        assert!(convert_expression(&DataType::I64, &DataType::I32).is_none());
        assert!(convert_expression(&DataType::I8, &DataType::U8).is_none());
        assert!(convert_expression(&DataType::I32, &DataType::String).is_none());
        assert!(convert_expression(&DataType::optional(DataType::I32), &DataType::I64).is_none());
    }
}
